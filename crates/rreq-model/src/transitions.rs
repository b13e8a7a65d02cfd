//! Static lifecycle tables for [`RequestStatus`].
//!
//! The transition graph is expressed as an exhaustive `match` so that adding
//! a status forces this table to be revisited.

use crate::enums::RequestStatus;

/// Header fields frozen once a request has left `Draft`.
pub const SUBMISSION_LOCKED_FIELDS: [&str; 3] = ["title", "requesting_section", "priority"];

/// Allowed outgoing edges for `from`, excluding the implicit self-loop.
///
/// `Closed` is the only fully terminal status; `Denied` and `Cancelled` keep
/// a single reopen edge back to `Reviewed`.
pub fn allowed_transitions(from: RequestStatus) -> &'static [RequestStatus] {
    match from {
        RequestStatus::Draft => &[RequestStatus::Submitted, RequestStatus::Cancelled],
        RequestStatus::Submitted => &[
            RequestStatus::Reviewed,
            RequestStatus::Denied,
            RequestStatus::Cancelled,
        ],
        RequestStatus::Reviewed => &[
            RequestStatus::Approved,
            RequestStatus::Denied,
            RequestStatus::Cancelled,
        ],
        RequestStatus::Approved => &[
            RequestStatus::Assigned,
            RequestStatus::Denied,
            RequestStatus::Cancelled,
        ],
        RequestStatus::Assigned => &[RequestStatus::InTransit, RequestStatus::Cancelled],
        RequestStatus::InTransit => &[
            RequestStatus::Delivered,
            RequestStatus::Partial,
            RequestStatus::Cancelled,
        ],
        RequestStatus::Delivered => &[RequestStatus::Closed, RequestStatus::Partial],
        RequestStatus::Partial => &[RequestStatus::Closed, RequestStatus::Assigned],
        RequestStatus::Denied => &[RequestStatus::Reviewed],
        RequestStatus::Cancelled => &[RequestStatus::Reviewed],
        RequestStatus::Closed => &[],
    }
}

/// True if `current -> target` is legal. Self-transitions are always legal.
pub fn transition_allowed(current: RequestStatus, target: RequestStatus) -> bool {
    current == target || allowed_transitions(current).contains(&target)
}

/// Statuses that end a request's editable life. Terminal requests are
/// read-only except for the explicit reopen edges out of `Denied` and
/// `Cancelled`.
pub fn is_terminal(status: RequestStatus) -> bool {
    matches!(
        status,
        RequestStatus::Closed | RequestStatus::Denied | RequestStatus::Cancelled
    )
}

/// True once a request is past drafting, which freezes the
/// [`SUBMISSION_LOCKED_FIELDS`] and makes mutations version-counted.
pub fn has_left_draft(status: RequestStatus) -> bool {
    !matches!(status, RequestStatus::Draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_has_no_outgoing_edges() {
        assert!(allowed_transitions(RequestStatus::Closed).is_empty());
        for target in RequestStatus::ALL {
            if target != RequestStatus::Closed {
                assert!(!transition_allowed(RequestStatus::Closed, target));
            }
        }
    }

    #[test]
    fn self_transitions_always_allowed() {
        for status in RequestStatus::ALL {
            assert!(transition_allowed(status, status));
        }
    }

    #[test]
    fn reopen_edges() {
        assert!(transition_allowed(
            RequestStatus::Denied,
            RequestStatus::Reviewed
        ));
        assert!(transition_allowed(
            RequestStatus::Cancelled,
            RequestStatus::Reviewed
        ));
        assert!(!transition_allowed(
            RequestStatus::Denied,
            RequestStatus::Approved
        ));
    }

    #[test]
    fn draft_cannot_skip_submission() {
        assert!(!transition_allowed(
            RequestStatus::Draft,
            RequestStatus::Approved
        ));
        assert!(!transition_allowed(
            RequestStatus::Draft,
            RequestStatus::Delivered
        ));
    }

    #[test]
    fn no_edge_reenters_draft() {
        for from in RequestStatus::ALL {
            assert!(!allowed_transitions(from).contains(&RequestStatus::Draft));
        }
    }
}
