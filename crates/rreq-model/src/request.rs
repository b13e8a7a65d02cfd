//! Record and input types for the request aggregate.
//!
//! The `New*` types carry caller input with enum-valued fields still as raw
//! strings; the lifecycle service coerces them through `rreq-validate`
//! before anything is persisted. The stored records carry the typed enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::{ApprovalAction, FulfillmentStatus, ItemKind, Priority, RequestStatus};

/// Deserialize a present-but-possibly-null field as `Some(inner)`, so that
/// an absent field (outer `None`, via `#[serde(default)]`) stays
/// distinguishable from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One resource request header, scoped to a single incident.
///
/// `version` starts at 1 and increases by exactly 1 on every status change
/// or field update performed once the request has left `Draft`; it never
/// changes while the request remains in `Draft`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub id: i64,
    /// Tenant partition key. Cross-incident reads are never possible.
    pub incident_id: String,
    pub title: String,
    pub requesting_section: String,
    pub priority: Priority,
    pub status: RequestStatus,
    pub created_by_id: String,
    pub created_utc: DateTime<Utc>,
    pub last_updated_utc: DateTime<Utc>,
    pub needed_by_utc: Option<DateTime<Utc>>,
    pub justification: Option<String>,
    pub delivery_location: Option<String>,
    pub comms_requirements: Option<String>,
    /// Opaque cross-reference blob (ticket ids, radio logs, URLs).
    pub links: Option<String>,
    pub version: i64,
}

/// A line item under a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestItem {
    pub id: i64,
    pub request_id: i64,
    pub kind: ItemKind,
    /// Optional reference into an external catalog (equipment id, callsign).
    pub ref_id: Option<String>,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub special_instructions: Option<String>,
}

/// Append-only decision log entry. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: i64,
    pub request_id: i64,
    pub action: ApprovalAction,
    pub actor_id: String,
    pub note: Option<String>,
    pub ts_utc: DateTime<Utc>,
}

/// Fulfillment state for a request. The most recently inserted row is the
/// current fulfillment; status progression mutates the row in place and the
/// history of those updates lives in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRecord {
    pub id: i64,
    pub request_id: i64,
    pub supplier_id: Option<String>,
    pub assigned_team_id: Option<String>,
    pub assigned_vehicle_id: Option<String>,
    pub eta_utc: Option<DateTime<Utc>>,
    pub status: FulfillmentStatus,
    pub note: Option<String>,
    pub ts_utc: DateTime<Utc>,
}

/// Append-only field-level audit entry, keyed by `(entity_type, entity_id)`
/// with no foreign key so it outlives its subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub actor_id: Option<String>,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub ts_utc: DateTime<Utc>,
}

/// Caller input for a new request header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    pub title: String,
    pub requesting_section: String,
    pub priority: String,
    /// Defaults to `DRAFT` when absent; seed and import paths may create a
    /// request directly in a later status.
    #[serde(default)]
    pub status: Option<String>,
    pub created_by_id: String,
    #[serde(default)]
    pub needed_by_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub comms_requirements: Option<String>,
    #[serde(default)]
    pub links: Option<String>,
}

/// Caller input for a new line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub kind: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Caller input for a new fulfillment record. Status is derived: `ASSIGNED`
/// when any of supplier/team/vehicle is supplied, otherwise `SOURCING`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFulfillment {
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub assigned_team_id: Option<String>,
    #[serde(default)]
    pub assigned_vehicle_id: Option<String>,
    #[serde(default)]
    pub eta_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewFulfillment {
    /// True when a concrete source has been named.
    pub fn has_assignment(&self) -> bool {
        self.supplier_id.is_some()
            || self.assigned_team_id.is_some()
            || self.assigned_vehicle_id.is_some()
    }
}

/// Explicit partial update for a request header.
///
/// Outer `None` means "leave untouched"; for nullable fields the inner
/// option distinguishes "set" from "clear". Only intentionally supplied
/// fields take part in diffing and auditing, so a patch can never overwrite
/// a field with an accidental default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub requesting_section: Option<String>,
    /// Raw priority value, re-validated on apply.
    #[serde(default)]
    pub priority: Option<String>,
    /// Present only to be rejected: status moves through `change_status`
    /// and approval actions, never through a field patch.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub needed_by_utc: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub justification: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivery_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub comms_requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub links: Option<Option<String>>,
}

impl RequestPatch {
    /// Names of the fields this patch intends to change, in declaration
    /// order. `status` is included so the lifecycle service can reject it.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title");
        }
        if self.requesting_section.is_some() {
            names.push("requesting_section");
        }
        if self.priority.is_some() {
            names.push("priority");
        }
        if self.status.is_some() {
            names.push("status");
        }
        if self.needed_by_utc.is_some() {
            names.push("needed_by_utc");
        }
        if self.justification.is_some() {
            names.push("justification");
        }
        if self.delivery_location.is_some() {
            names.push("delivery_location");
        }
        if self.comms_requirements.is_some() {
            names.push("comms_requirements");
        }
        if self.links.is_some() {
            names.push("links");
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }
}

/// In-place update for a fulfillment record. `status` is required; the
/// optional members follow the same supplied/absent semantics as
/// [`RequestPatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentPatch {
    pub status: String,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub eta_utc: Option<Option<DateTime<Utc>>>,
}

/// List filter for [`ResourceRequest`] headers. All members are optional
/// and combine conjunctively; the tenant constraint is always applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestFilter {
    /// Raw status values; each is validated before the query runs.
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Substring match against `title` and `justification`.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
}

/// The composed read of one request: header plus all child rows, children
/// in chronological (insertion) order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestAggregate {
    pub request: ResourceRequest,
    pub items: Vec<RequestItem>,
    pub approvals: Vec<ApprovalRecord>,
    pub fulfillments: Vec<FulfillmentRecord>,
    pub audit: Vec<AuditRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_field_names_follow_supplied_fields() {
        let patch = RequestPatch {
            title: Some("Water trailer".to_string()),
            justification: Some(None),
            ..RequestPatch::default()
        };
        assert_eq!(patch.field_names(), vec!["title", "justification"]);
        assert!(!patch.is_empty());
        assert!(RequestPatch::default().is_empty());
    }

    #[test]
    fn patch_distinguishes_clear_from_absent() {
        let json = r#"{"justification": null}"#;
        let patch: RequestPatch = serde_json::from_str(json).expect("parse patch");
        assert_eq!(patch.justification, Some(None));
        assert_eq!(patch.delivery_location, None);
    }

    #[test]
    fn fulfillment_assignment_detection() {
        assert!(!NewFulfillment::default().has_assignment());
        let assigned = NewFulfillment {
            assigned_team_id: Some("STRIKE-2".to_string()),
            ..NewFulfillment::default()
        };
        assert!(assigned.has_assignment());
    }
}
