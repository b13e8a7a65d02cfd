//! The validation rules themselves.

use rreq_model::{
    ApprovalAction, FulfillmentStatus, ItemKind, Priority, RequestStatus,
    SUBMISSION_LOCKED_FIELDS, has_left_draft, is_terminal, transition_allowed,
};

use crate::error::{Result, ValidationError};

/// Coerce a raw priority value.
pub fn parse_priority(value: &str) -> Result<Priority> {
    value.parse().map_err(|_| ValidationError::UnknownValue {
        kind: "priority",
        value: value.to_string(),
    })
}

/// Coerce a raw request status value.
pub fn parse_status(value: &str) -> Result<RequestStatus> {
    value.parse().map_err(|_| ValidationError::UnknownValue {
        kind: "request status",
        value: value.to_string(),
    })
}

/// Coerce a raw item kind value.
pub fn parse_item_kind(value: &str) -> Result<ItemKind> {
    value.parse().map_err(|_| ValidationError::UnknownValue {
        kind: "item kind",
        value: value.to_string(),
    })
}

/// Coerce a raw fulfillment status value.
pub fn parse_fulfillment_status(value: &str) -> Result<FulfillmentStatus> {
    value.parse().map_err(|_| ValidationError::UnknownValue {
        kind: "fulfillment status",
        value: value.to_string(),
    })
}

/// Fail unless `current -> target` is an edge of the transition graph.
/// A self-transition is always legal.
pub fn check_status_transition(current: RequestStatus, target: RequestStatus) -> Result<()> {
    if transition_allowed(current, target) {
        Ok(())
    } else {
        Err(ValidationError::IllegalTransition {
            from: current,
            to: target,
        })
    }
}

/// Fail if the request is in a terminal status. Terminal requests are
/// read-only except for the explicit reopen path through `change_status`.
pub fn ensure_edit_allowed(current: RequestStatus) -> Result<()> {
    if is_terminal(current) {
        Err(ValidationError::TerminalState(current))
    } else {
        Ok(())
    }
}

/// Fail if a post-drafting request is being patched on a frozen field.
/// `title`, `requesting_section`, and `priority` lock when the request
/// leaves `Draft`.
pub fn ensure_post_submission_edit_allowed(
    current: RequestStatus,
    changed_fields: &[&str],
) -> Result<()> {
    if !has_left_draft(current) {
        return Ok(());
    }
    let locked: Vec<String> = changed_fields
        .iter()
        .filter(|field| SUBMISSION_LOCKED_FIELDS.contains(*field))
        .map(|field| (*field).to_string())
        .collect();
    if locked.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::LockedFields(locked))
    }
}

/// Resolve the status actually stored for a validated transition.
///
/// `Denied -> Reviewed` and `Cancelled -> Reviewed` are reopens; the stored
/// status is `Reviewed`, which already equals the target, so today this is
/// an identity map. It is kept as the single place that would absorb any
/// future divergence between a requested target and the stored status,
/// mirroring the action-to-status map on `ApprovalAction`.
pub fn normalise_status_for_transition(
    current: RequestStatus,
    target: RequestStatus,
) -> RequestStatus {
    if target == RequestStatus::Reviewed
        && matches!(
            current,
            RequestStatus::Denied | RequestStatus::Cancelled
        )
    {
        return RequestStatus::Reviewed;
    }
    target
}

/// Coerce a raw approval action, enforcing that a denial always carries a
/// documented reason.
pub fn validate_approval_action(action: &str, note: Option<&str>) -> Result<ApprovalAction> {
    let action: ApprovalAction = action.parse().map_err(|_| ValidationError::UnknownValue {
        kind: "approval action",
        value: action.to_string(),
    })?;
    if action == ApprovalAction::Deny && note.is_none_or(|n| n.trim().is_empty()) {
        return Err(ValidationError::NoteRequired(action));
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_requires_note() {
        assert_eq!(
            validate_approval_action("DENY", None),
            Err(ValidationError::NoteRequired(ApprovalAction::Deny))
        );
        assert_eq!(
            validate_approval_action("deny", Some("   ")),
            Err(ValidationError::NoteRequired(ApprovalAction::Deny))
        );
        assert_eq!(
            validate_approval_action("DENY", Some("insufficient justification")),
            Ok(ApprovalAction::Deny)
        );
    }

    #[test]
    fn other_actions_do_not_require_note() {
        for action in ["SUBMIT", "REVIEW", "APPROVE", "CANCEL", "REOPEN"] {
            assert!(validate_approval_action(action, None).is_ok());
        }
    }

    #[test]
    fn locked_fields_only_apply_after_draft() {
        assert!(
            ensure_post_submission_edit_allowed(RequestStatus::Draft, &["title", "priority"])
                .is_ok()
        );
        assert_eq!(
            ensure_post_submission_edit_allowed(
                RequestStatus::Submitted,
                &["title", "delivery_location"]
            ),
            Err(ValidationError::LockedFields(vec!["title".to_string()]))
        );
        assert!(
            ensure_post_submission_edit_allowed(RequestStatus::Submitted, &["delivery_location"])
                .is_ok()
        );
    }
}
