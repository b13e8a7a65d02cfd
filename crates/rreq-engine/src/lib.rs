//! Lifecycle and query services for resource requests.
//!
//! [`RequestService`] is the only writer: every public operation validates
//! its input, mutates rows inside exactly one transaction, records audit
//! diffs, and surfaces any failure before anything is visible to readers.
//! [`RequestQueries`] assembles tenant-scoped reads over the same store.

pub mod error;
pub mod query;
pub mod service;

pub use error::EngineError;
pub use query::RequestQueries;
pub use service::RequestService;
