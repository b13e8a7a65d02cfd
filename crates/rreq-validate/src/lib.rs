//! Pure validation rules for the resource request lifecycle.
//!
//! Every function here is side-effect free: raw caller input goes in,
//! either a typed domain value or a [`ValidationError`] comes out. The
//! lifecycle service calls these before it touches the store, so a
//! validation failure can never leave a partially applied mutation behind.

pub mod error;
pub mod rules;

pub use error::ValidationError;
pub use rules::{
    check_status_transition, ensure_edit_allowed, ensure_post_submission_edit_allowed,
    normalise_status_for_transition, parse_fulfillment_status, parse_item_kind, parse_priority,
    parse_status, validate_approval_action,
};
