//! Tenant-scoped SQLite persistence for the resource request engine.
//!
//! One database file per incident. The store owns the connection and the
//! schema; the lifecycle service owns transaction boundaries and calls the
//! row-level helpers here with the transaction it opened. Every read is
//! constrained by the store's `incident_id`, so rows from another tenant
//! are unreachable by construction.

pub mod audit;
pub mod error;
pub mod schema;
pub mod store;

pub use audit::{FieldChange, audit_for_request, insert_audit_rows_tx};
pub use error::{Result, StoreError};
pub use store::{
    HeaderFilter, RequestStore, approvals_for, delete_items_tx, fulfillments_for, get_fulfillment,
    get_request, insert_approval_tx, insert_fulfillment_tx, insert_item_tx, insert_request_tx,
    items_for, list_requests, update_fulfillment_tx, update_request_tx,
};
