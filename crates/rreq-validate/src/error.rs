use rreq_model::{ApprovalAction, RequestStatus};
use thiserror::Error;

/// A caller-recoverable validation failure. These are raised before any row
/// is written, or inside a transaction that rolls back on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A raw string did not coerce to any member of the named enum.
    #[error("unknown {kind}: {value:?}")]
    UnknownValue { kind: &'static str, value: String },

    /// The requested status change is not an edge of the transition graph.
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    /// The request is in a terminal status and is read-only apart from the
    /// explicit reopen path.
    #[error("request is {0} and can no longer be edited")]
    TerminalState(RequestStatus),

    /// The patch touches fields that froze when the request left drafting.
    #[error("fields locked after submission: {}", .0.join(", "))]
    LockedFields(Vec<String>),

    /// The action requires a documented reason.
    #[error("{0} requires a note")]
    NoteRequired(ApprovalAction),

    /// `status` was supplied to a field patch; status only moves through
    /// the transition and approval calls.
    #[error("status cannot be set directly; use a status change or approval action")]
    DirectStatusEdit,
}

pub type Result<T> = std::result::Result<T, ValidationError>;
