//! Type-safe enumerations for the resource request domain.
//!
//! These enums give compile-time safety to concepts that arrive as strings
//! from callers (CLI arguments, API payloads, stored rows). Parsing is
//! case-insensitive and tolerant of hyphen/underscore separators; the
//! canonical form returned by `as_str` is what gets persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn normalize(s: &str) -> String {
    s.trim().to_uppercase().replace(['-', '_'], " ")
}

/// Urgency of a resource request, set by the requesting section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Normal supply-chain timing.
    Routine,
    /// Needed ahead of routine traffic.
    Urgent,
    /// Life-safety or incident-critical; fulfillment jumps every queue.
    Immediate,
}

impl Priority {
    /// Canonical persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Routine => "ROUTINE",
            Priority::Urgent => "URGENT",
            Priority::Immediate => "IMMEDIATE",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "ROUTINE" => Ok(Priority::Routine),
            "URGENT" => Ok(Priority::Urgent),
            "IMMEDIATE" => Ok(Priority::Immediate),
            _ => Err(format!("Unknown priority: {s}")),
        }
    }
}

/// Lifecycle status of a resource request.
///
/// The full state machine lives in [`crate::transitions`]; a request starts
/// in `Draft` and only the explicit reopen edges leave `Denied`/`Cancelled`.
/// `Closed` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Being drafted; header fields are still freely editable.
    Draft,
    /// Handed to the approval chain; title/section/priority are frozen.
    Submitted,
    /// Under review, or reopened after a denial/cancellation.
    Reviewed,
    /// Approved for sourcing.
    Approved,
    /// A supplier, team, or vehicle has been assigned.
    Assigned,
    /// Resources are en route.
    #[serde(rename = "INTRANSIT")]
    InTransit,
    /// Everything arrived.
    Delivered,
    /// Some items arrived; the remainder is still being worked.
    Partial,
    /// Denied by the approval chain (reopenable).
    Denied,
    /// Withdrawn (reopenable).
    Cancelled,
    /// Fully closed out. No outgoing transitions.
    Closed,
}

impl RequestStatus {
    /// Every status, for exhaustive table checks.
    pub const ALL: [RequestStatus; 11] = [
        RequestStatus::Draft,
        RequestStatus::Submitted,
        RequestStatus::Reviewed,
        RequestStatus::Approved,
        RequestStatus::Assigned,
        RequestStatus::InTransit,
        RequestStatus::Delivered,
        RequestStatus::Partial,
        RequestStatus::Denied,
        RequestStatus::Cancelled,
        RequestStatus::Closed,
    ];

    /// Canonical persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Draft => "DRAFT",
            RequestStatus::Submitted => "SUBMITTED",
            RequestStatus::Reviewed => "REVIEWED",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Assigned => "ASSIGNED",
            RequestStatus::InTransit => "INTRANSIT",
            RequestStatus::Delivered => "DELIVERED",
            RequestStatus::Partial => "PARTIAL",
            RequestStatus::Denied => "DENIED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "DRAFT" => Ok(RequestStatus::Draft),
            "SUBMITTED" => Ok(RequestStatus::Submitted),
            "REVIEWED" => Ok(RequestStatus::Reviewed),
            "APPROVED" => Ok(RequestStatus::Approved),
            "ASSIGNED" => Ok(RequestStatus::Assigned),
            "INTRANSIT" | "IN TRANSIT" => Ok(RequestStatus::InTransit),
            "DELIVERED" => Ok(RequestStatus::Delivered),
            "PARTIAL" => Ok(RequestStatus::Partial),
            "DENIED" => Ok(RequestStatus::Denied),
            "CANCELLED" => Ok(RequestStatus::Cancelled),
            "CLOSED" => Ok(RequestStatus::Closed),
            _ => Err(format!("Unknown request status: {s}")),
        }
    }
}

/// Kind of resource a request line item asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Personnel,
    Team,
    Equipment,
    Vehicle,
    Aircraft,
    Supply,
    Service,
    Communications,
}

impl ItemKind {
    /// Canonical persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Personnel => "PERSONNEL",
            ItemKind::Team => "TEAM",
            ItemKind::Equipment => "EQUIPMENT",
            ItemKind::Vehicle => "VEHICLE",
            ItemKind::Aircraft => "AIRCRAFT",
            ItemKind::Supply => "SUPPLY",
            ItemKind::Service => "SERVICE",
            ItemKind::Communications => "COMMUNICATIONS",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PERSONNEL" => Ok(ItemKind::Personnel),
            "TEAM" => Ok(ItemKind::Team),
            "EQUIPMENT" => Ok(ItemKind::Equipment),
            "VEHICLE" => Ok(ItemKind::Vehicle),
            "AIRCRAFT" => Ok(ItemKind::Aircraft),
            "SUPPLY" => Ok(ItemKind::Supply),
            "SERVICE" => Ok(ItemKind::Service),
            "COMMUNICATIONS" => Ok(ItemKind::Communications),
            _ => Err(format!("Unknown item kind: {s}")),
        }
    }
}

/// A logged decision on a request. Each action also drives a status change
/// through [`ApprovalAction::target_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    Submit,
    Review,
    Approve,
    /// Requires a documented reason; see `rreq-validate`.
    Deny,
    Cancel,
    /// Takes a denied or cancelled request back to review.
    Reopen,
}

impl ApprovalAction {
    /// Every action, for exhaustive table checks.
    pub const ALL: [ApprovalAction; 6] = [
        ApprovalAction::Submit,
        ApprovalAction::Review,
        ApprovalAction::Approve,
        ApprovalAction::Deny,
        ApprovalAction::Cancel,
        ApprovalAction::Reopen,
    ];

    /// Canonical persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Submit => "SUBMIT",
            ApprovalAction::Review => "REVIEW",
            ApprovalAction::Approve => "APPROVE",
            ApprovalAction::Deny => "DENY",
            ApprovalAction::Cancel => "CANCEL",
            ApprovalAction::Reopen => "REOPEN",
        }
    }

    /// The request status this action drives the request into.
    pub fn target_status(&self) -> RequestStatus {
        match self {
            ApprovalAction::Submit => RequestStatus::Submitted,
            ApprovalAction::Review => RequestStatus::Reviewed,
            ApprovalAction::Approve => RequestStatus::Approved,
            ApprovalAction::Deny => RequestStatus::Denied,
            ApprovalAction::Cancel => RequestStatus::Cancelled,
            ApprovalAction::Reopen => RequestStatus::Reviewed,
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApprovalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "SUBMIT" => Ok(ApprovalAction::Submit),
            "REVIEW" => Ok(ApprovalAction::Review),
            "APPROVE" => Ok(ApprovalAction::Approve),
            "DENY" => Ok(ApprovalAction::Deny),
            "CANCEL" => Ok(ApprovalAction::Cancel),
            "REOPEN" => Ok(ApprovalAction::Reopen),
            _ => Err(format!("Unknown approval action: {s}")),
        }
    }
}

/// Fulfillment progress for a request.
///
/// Unlike [`RequestStatus`], fulfillment status is not constrained by a
/// transition graph: any parseable value is legal from any prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    /// Looking for a supplier/team/vehicle.
    Sourcing,
    /// A concrete source has been assigned.
    Assigned,
    #[serde(rename = "INTRANSIT")]
    InTransit,
    Delivered,
    Partial,
    Failed,
}

impl FulfillmentStatus {
    /// Canonical persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Sourcing => "SOURCING",
            FulfillmentStatus::Assigned => "ASSIGNED",
            FulfillmentStatus::InTransit => "INTRANSIT",
            FulfillmentStatus::Delivered => "DELIVERED",
            FulfillmentStatus::Partial => "PARTIAL",
            FulfillmentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "SOURCING" => Ok(FulfillmentStatus::Sourcing),
            "ASSIGNED" => Ok(FulfillmentStatus::Assigned),
            "INTRANSIT" | "IN TRANSIT" => Ok(FulfillmentStatus::InTransit),
            "DELIVERED" => Ok(FulfillmentStatus::Delivered),
            "PARTIAL" => Ok(FulfillmentStatus::Partial),
            "FAILED" => Ok(FulfillmentStatus::Failed),
            _ => Err(format!("Unknown fulfillment status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_str() {
        assert_eq!("routine".parse::<Priority>().unwrap(), Priority::Routine);
        assert_eq!("  URGENT ".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(
            "Immediate".parse::<Priority>().unwrap(),
            Priority::Immediate
        );
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "draft".parse::<RequestStatus>().unwrap(),
            RequestStatus::Draft
        );
        assert_eq!(
            "IN_TRANSIT".parse::<RequestStatus>().unwrap(),
            RequestStatus::InTransit
        );
        assert_eq!(
            "in-transit".parse::<RequestStatus>().unwrap(),
            RequestStatus::InTransit
        );
        assert!("shipped".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_status_roundtrip_canonical() {
        for status in RequestStatus::ALL {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_action_target_status() {
        assert_eq!(
            ApprovalAction::Submit.target_status(),
            RequestStatus::Submitted
        );
        assert_eq!(ApprovalAction::Deny.target_status(), RequestStatus::Denied);
        assert_eq!(
            ApprovalAction::Reopen.target_status(),
            RequestStatus::Reviewed
        );
    }

    #[test]
    fn test_fulfillment_status_from_str() {
        assert_eq!(
            "sourcing".parse::<FulfillmentStatus>().unwrap(),
            FulfillmentStatus::Sourcing
        );
        assert_eq!(
            "IN TRANSIT".parse::<FulfillmentStatus>().unwrap(),
            FulfillmentStatus::InTransit
        );
        assert!("lost".parse::<FulfillmentStatus>().is_err());
    }
}
