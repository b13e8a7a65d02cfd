//! Transition legality over the whole status matrix.

use rreq_model::{RequestStatus, allowed_transitions, is_terminal};
use rreq_validate::{
    ValidationError, check_status_transition, ensure_edit_allowed, normalise_status_for_transition,
};

#[test]
fn every_graph_edge_is_accepted() {
    for from in RequestStatus::ALL {
        for to in allowed_transitions(from) {
            assert!(
                check_status_transition(from, *to).is_ok(),
                "{from} -> {to} should be legal"
            );
        }
    }
}

#[test]
fn every_non_edge_is_rejected() {
    for from in RequestStatus::ALL {
        for to in RequestStatus::ALL {
            if to == from || allowed_transitions(from).contains(&to) {
                continue;
            }
            assert_eq!(
                check_status_transition(from, to),
                Err(ValidationError::IllegalTransition { from, to }),
                "{from} -> {to} should be illegal"
            );
        }
    }
}

#[test]
fn self_transitions_are_no_op_legal() {
    for status in RequestStatus::ALL {
        assert!(check_status_transition(status, status).is_ok());
    }
}

#[test]
fn nothing_leaves_closed() {
    for to in RequestStatus::ALL {
        if to == RequestStatus::Closed {
            continue;
        }
        assert!(check_status_transition(RequestStatus::Closed, to).is_err());
    }
}

#[test]
fn terminal_statuses_block_edits() {
    for status in RequestStatus::ALL {
        let result = ensure_edit_allowed(status);
        if is_terminal(status) {
            assert_eq!(result, Err(ValidationError::TerminalState(status)));
        } else {
            assert!(result.is_ok());
        }
    }
}

#[test]
fn reopen_normalises_to_reviewed() {
    assert_eq!(
        normalise_status_for_transition(RequestStatus::Denied, RequestStatus::Reviewed),
        RequestStatus::Reviewed
    );
    assert_eq!(
        normalise_status_for_transition(RequestStatus::Cancelled, RequestStatus::Reviewed),
        RequestStatus::Reviewed
    );
    // Everything else is the identity.
    assert_eq!(
        normalise_status_for_transition(RequestStatus::Submitted, RequestStatus::Denied),
        RequestStatus::Denied
    );
}
