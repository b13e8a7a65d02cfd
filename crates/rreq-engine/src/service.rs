//! The request lifecycle service: the single write path for request data.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Transaction;
use serde_json::json;
use tracing::info;

use rreq_model::{
    ApprovalRecord, FulfillmentPatch, FulfillmentRecord, FulfillmentStatus, NewFulfillment,
    NewItem, NewRequest, RequestAggregate, RequestItem, RequestPatch, RequestStatus,
    ResourceRequest, has_left_draft,
};
use rreq_store::{
    FieldChange, RequestStore, StoreError, delete_items_tx, get_fulfillment, get_request,
    insert_approval_tx, insert_audit_rows_tx, insert_fulfillment_tx, insert_item_tx,
    insert_request_tx, update_fulfillment_tx, update_request_tx,
};
use rreq_validate::{
    ValidationError, check_status_transition, ensure_edit_allowed,
    ensure_post_submission_edit_allowed, normalise_status_for_transition, parse_fulfillment_status,
    parse_item_kind, parse_priority, parse_status, validate_approval_action,
};

use crate::error::{EngineError, Result};
use crate::query::RequestQueries;

fn ts_value(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn item_summary(item: &RequestItem) -> serde_json::Value {
    json!({
        "kind": item.kind.as_str(),
        "description": item.description,
        "quantity": item.quantity,
        "unit": item.unit,
    })
}

/// The lifecycle orchestrator, bound to one incident's store and therefore
/// one tenant. Callers supply a logical actor id per mutating call; the
/// engine trusts it as-is.
#[derive(Debug)]
pub struct RequestService {
    store: RequestStore,
}

impl RequestService {
    pub fn new(store: RequestStore) -> Self {
        Self { store }
    }

    /// Open the service over the incident's database file under `dir`.
    pub fn open(dir: impl AsRef<Path>, incident_id: &str) -> Result<Self> {
        Ok(Self::new(RequestStore::open(dir, incident_id)?))
    }

    pub fn open_in_memory(incident_id: &str) -> Result<Self> {
        Ok(Self::new(RequestStore::open_in_memory(incident_id)?))
    }

    pub fn incident_id(&self) -> &str {
        self.store.incident_id()
    }

    /// Read-side companion over the same store.
    pub fn queries(&self) -> RequestQueries<'_> {
        RequestQueries::new(&self.store)
    }

    /// Create a request (status `DRAFT` unless explicitly supplied) together
    /// with its initial items, atomically. Returns the new request id.
    pub fn create_request(&mut self, new: &NewRequest, items: &[NewItem]) -> Result<i64> {
        let priority = parse_priority(&new.priority)?;
        let status = match &new.status {
            Some(raw) => parse_status(raw)?,
            None => RequestStatus::Draft,
        };
        let kinds = items
            .iter()
            .map(|item| parse_item_kind(&item.kind))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();
        let header = ResourceRequest {
            id: 0,
            incident_id,
            title: new.title.clone(),
            requesting_section: new.requesting_section.clone(),
            priority,
            status,
            created_by_id: new.created_by_id.clone(),
            created_utc: now,
            last_updated_utc: now,
            needed_by_utc: new.needed_by_utc,
            justification: new.justification.clone(),
            delivery_location: new.delivery_location.clone(),
            comms_requirements: new.comms_requirements.clone(),
            links: new.links.clone(),
            version: 1,
        };

        let tx = self.store.transaction()?;
        let id = insert_request_tx(&tx, &header)?;
        for (input, kind) in items.iter().zip(kinds) {
            let item = RequestItem {
                id: 0,
                request_id: id,
                kind,
                ref_id: input.ref_id.clone(),
                description: input.description.clone(),
                quantity: input.quantity,
                unit: input.unit.clone(),
                special_instructions: input.special_instructions.clone(),
            };
            insert_item_tx(&tx, &item)?;
        }
        let marker = FieldChange::new(
            "created",
            None,
            Some(json!({"title": new.title, "priority": priority.as_str()}).to_string()),
        );
        insert_audit_rows_tx(&tx, "request", id, Some(&new.created_by_id), now, &[marker])?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(request_id = id, status = %status, items = items.len(), "request created");
        Ok(id)
    }

    /// Apply a field patch to a request header. `status` is rejected here;
    /// it moves only through `change_status` and approval actions. Each
    /// changed field yields one audit row. When `expected_version` is
    /// supplied, a mismatch fails with [`EngineError::Conflict`] before
    /// anything is written.
    pub fn update_request(
        &mut self,
        id: i64,
        patch: &RequestPatch,
        actor_id: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<RequestAggregate> {
        if patch.status.is_some() {
            return Err(ValidationError::DirectStatusEdit.into());
        }
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();

        let tx = self.store.transaction()?;
        let current = get_request(&tx, &incident_id, id)?.ok_or(EngineError::NotFound {
            entity: "request",
            id,
        })?;
        if let Some(expected) = expected_version
            && expected != current.version
        {
            return Err(EngineError::Conflict {
                expected,
                actual: current.version,
            });
        }
        ensure_edit_allowed(current.status)?;
        ensure_post_submission_edit_allowed(current.status, &patch.field_names())?;

        let mut updated = current.clone();
        let mut changes: Vec<FieldChange> = Vec::new();

        if let Some(title) = &patch.title {
            if let Some(change) = FieldChange::diff(
                "title",
                Some(current.title.clone()),
                Some(title.clone()),
            ) {
                changes.push(change);
            }
            updated.title = title.clone();
        }
        if let Some(section) = &patch.requesting_section {
            if let Some(change) = FieldChange::diff(
                "requesting_section",
                Some(current.requesting_section.clone()),
                Some(section.clone()),
            ) {
                changes.push(change);
            }
            updated.requesting_section = section.clone();
        }
        if let Some(raw) = &patch.priority {
            let priority = parse_priority(raw)?;
            if let Some(change) = FieldChange::diff(
                "priority",
                Some(current.priority.as_str().to_string()),
                Some(priority.as_str().to_string()),
            ) {
                changes.push(change);
            }
            updated.priority = priority;
        }
        if let Some(needed_by) = &patch.needed_by_utc {
            if let Some(change) = FieldChange::diff(
                "needed_by_utc",
                current.needed_by_utc.map(ts_value),
                needed_by.map(ts_value),
            ) {
                changes.push(change);
            }
            updated.needed_by_utc = *needed_by;
        }
        if let Some(justification) = &patch.justification {
            if let Some(change) = FieldChange::diff(
                "justification",
                current.justification.clone(),
                justification.clone(),
            ) {
                changes.push(change);
            }
            updated.justification = justification.clone();
        }
        if let Some(location) = &patch.delivery_location {
            if let Some(change) = FieldChange::diff(
                "delivery_location",
                current.delivery_location.clone(),
                location.clone(),
            ) {
                changes.push(change);
            }
            updated.delivery_location = location.clone();
        }
        if let Some(comms) = &patch.comms_requirements {
            if let Some(change) = FieldChange::diff(
                "comms_requirements",
                current.comms_requirements.clone(),
                comms.clone(),
            ) {
                changes.push(change);
            }
            updated.comms_requirements = comms.clone();
        }
        if let Some(links) = &patch.links {
            if let Some(change) =
                FieldChange::diff("links", current.links.clone(), links.clone())
            {
                changes.push(change);
            }
            updated.links = links.clone();
        }

        updated.last_updated_utc = now;
        if has_left_draft(current.status) {
            updated.version += 1;
        }
        if !update_request_tx(&tx, &updated, current.version)? {
            let actual = get_request(&tx, &incident_id, id)?
                .map(|r| r.version)
                .unwrap_or(current.version);
            return Err(EngineError::Conflict {
                expected: current.version,
                actual,
            });
        }
        insert_audit_rows_tx(&tx, "request", id, actor_id, now, &changes)?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(request_id = id, fields = changes.len(), "request updated");
        self.queries().get(id)
    }

    /// Append items to a request. One audit row per new item.
    pub fn add_items(&mut self, id: i64, items: &[NewItem]) -> Result<Vec<i64>> {
        let kinds = items
            .iter()
            .map(|item| parse_item_kind(&item.kind))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();

        let tx = self.store.transaction()?;
        let current = get_request(&tx, &incident_id, id)?.ok_or(EngineError::NotFound {
            entity: "request",
            id,
        })?;
        ensure_edit_allowed(current.status)?;

        let mut ids = Vec::with_capacity(items.len());
        let mut changes = Vec::with_capacity(items.len());
        for (input, kind) in items.iter().zip(kinds) {
            let item = RequestItem {
                id: 0,
                request_id: id,
                kind,
                ref_id: input.ref_id.clone(),
                description: input.description.clone(),
                quantity: input.quantity,
                unit: input.unit.clone(),
                special_instructions: input.special_instructions.clone(),
            };
            let item_id = insert_item_tx(&tx, &item)?;
            changes.push(FieldChange::new(
                "item",
                None,
                Some(item_summary(&item).to_string()),
            ));
            ids.push(item_id);
        }
        insert_audit_rows_tx(&tx, "request", id, None, now, &changes)?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(request_id = id, added = ids.len(), "items added");
        Ok(ids)
    }

    /// Wholesale item replacement: deletes every existing item and inserts
    /// the new set atomically. Audited as a single coarse-grained row
    /// rather than per-item diffs.
    pub fn replace_items(&mut self, id: i64, items: &[NewItem]) -> Result<RequestAggregate> {
        let kinds = items
            .iter()
            .map(|item| parse_item_kind(&item.kind))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();

        let tx = self.store.transaction()?;
        let current = get_request(&tx, &incident_id, id)?.ok_or(EngineError::NotFound {
            entity: "request",
            id,
        })?;
        ensure_edit_allowed(current.status)?;

        delete_items_tx(&tx, id)?;
        let mut summaries = Vec::with_capacity(items.len());
        for (input, kind) in items.iter().zip(kinds) {
            let item = RequestItem {
                id: 0,
                request_id: id,
                kind,
                ref_id: input.ref_id.clone(),
                description: input.description.clone(),
                quantity: input.quantity,
                unit: input.unit.clone(),
                special_instructions: input.special_instructions.clone(),
            };
            insert_item_tx(&tx, &item)?;
            summaries.push(item_summary(&item));
        }
        let change = FieldChange::new(
            "items",
            Some("replaced".to_string()),
            Some(serde_json::Value::Array(summaries).to_string()),
        );
        insert_audit_rows_tx(&tx, "request", id, None, now, &[change])?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(request_id = id, items = items.len(), "items replaced");
        self.queries().get(id)
    }

    /// Move a request through the status graph. A self-transition is legal
    /// and still counts as an auditable, version-counted confirmation
    /// event. A supplied note lands in a second `status_note` audit row.
    pub fn change_status(
        &mut self,
        id: i64,
        status: &str,
        actor_id: &str,
        note: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<RequestAggregate> {
        let target = parse_status(status)?;
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();

        let tx = self.store.transaction()?;
        apply_status_change(&tx, &incident_id, id, target, actor_id, note, expected_version, now)?;
        tx.commit().map_err(StoreError::Sql)?;
        self.queries().get(id)
    }

    /// Record a decision and drive the request into the status the action
    /// maps to, as one atomic operation. Returns the approval id.
    pub fn record_approval(
        &mut self,
        id: i64,
        action: &str,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<i64> {
        let action = validate_approval_action(action, note)?;
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();

        let tx = self.store.transaction()?;
        get_request(&tx, &incident_id, id)?.ok_or(EngineError::NotFound {
            entity: "request",
            id,
        })?;
        let record = ApprovalRecord {
            id: 0,
            request_id: id,
            action,
            actor_id: actor_id.to_string(),
            note: note.map(str::to_string),
            ts_utc: now,
        };
        let approval_id = insert_approval_tx(&tx, &record)?;
        let change = FieldChange::new("approval", None, Some(action.as_str().to_string()));
        insert_audit_rows_tx(&tx, "request", id, Some(actor_id), now, &[change])?;
        apply_status_change(
            &tx,
            &incident_id,
            id,
            action.target_status(),
            actor_id,
            note,
            None,
            now,
        )?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(request_id = id, action = %action, approval_id, "approval recorded");
        Ok(approval_id)
    }

    /// Open a fulfillment record for a request: `ASSIGNED` when a concrete
    /// supplier/team/vehicle is named, otherwise `SOURCING`. Fulfillment
    /// status is not constrained by a transition graph.
    pub fn assign_fulfillment(&mut self, id: i64, new: &NewFulfillment) -> Result<i64> {
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();
        let status = if new.has_assignment() {
            FulfillmentStatus::Assigned
        } else {
            FulfillmentStatus::Sourcing
        };

        let tx = self.store.transaction()?;
        get_request(&tx, &incident_id, id)?.ok_or(EngineError::NotFound {
            entity: "request",
            id,
        })?;
        let record = FulfillmentRecord {
            id: 0,
            request_id: id,
            supplier_id: new.supplier_id.clone(),
            assigned_team_id: new.assigned_team_id.clone(),
            assigned_vehicle_id: new.assigned_vehicle_id.clone(),
            eta_utc: new.eta_utc,
            status,
            note: new.note.clone(),
            ts_utc: now,
        };
        let fulfillment_id = insert_fulfillment_tx(&tx, &record)?;
        let marker = FieldChange::new(
            "created",
            None,
            Some(
                json!({
                    "status": status.as_str(),
                    "supplier_id": new.supplier_id,
                    "assigned_team_id": new.assigned_team_id,
                    "assigned_vehicle_id": new.assigned_vehicle_id,
                })
                .to_string(),
            ),
        );
        insert_audit_rows_tx(&tx, "fulfillment", fulfillment_id, None, now, &[marker])?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(request_id = id, fulfillment_id, status = %status, "fulfillment assigned");
        Ok(fulfillment_id)
    }

    /// Progress a fulfillment record in place. The history of these updates
    /// is reconstructed from the audit log, not from additional rows.
    pub fn update_fulfillment(
        &mut self,
        fulfillment_id: i64,
        patch: &FulfillmentPatch,
    ) -> Result<FulfillmentRecord> {
        let status = parse_fulfillment_status(&patch.status)?;
        let now = Utc::now();
        let incident_id = self.store.incident_id().to_string();

        let tx = self.store.transaction()?;
        let current =
            get_fulfillment(&tx, &incident_id, fulfillment_id)?.ok_or(EngineError::NotFound {
                entity: "fulfillment",
                id: fulfillment_id,
            })?;

        let mut updated = current.clone();
        let mut changes: Vec<FieldChange> = Vec::new();

        if let Some(change) = FieldChange::diff(
            "status",
            Some(current.status.as_str().to_string()),
            Some(status.as_str().to_string()),
        ) {
            changes.push(change);
        }
        updated.status = status;
        if let Some(note) = &patch.note {
            if let Some(change) = FieldChange::diff("note", current.note.clone(), note.clone()) {
                changes.push(change);
            }
            updated.note = note.clone();
        }
        if let Some(eta) = &patch.eta_utc {
            if let Some(change) = FieldChange::diff(
                "eta_utc",
                current.eta_utc.map(ts_value),
                eta.map(ts_value),
            ) {
                changes.push(change);
            }
            updated.eta_utc = *eta;
        }

        if !update_fulfillment_tx(&tx, &updated)? {
            return Err(EngineError::NotFound {
                entity: "fulfillment",
                id: fulfillment_id,
            });
        }
        insert_audit_rows_tx(&tx, "fulfillment", fulfillment_id, None, now, &changes)?;
        tx.commit().map_err(StoreError::Sql)?;

        info!(fulfillment_id, status = %status, "fulfillment updated");
        get_fulfillment(self.store.connection(), &incident_id, fulfillment_id)?.ok_or(
            EngineError::NotFound {
                entity: "fulfillment",
                id: fulfillment_id,
            },
        )
    }
}

/// Shared status-change body used by `change_status` and `record_approval`,
/// inside the caller's transaction.
#[allow(clippy::too_many_arguments)]
fn apply_status_change(
    tx: &Transaction<'_>,
    incident_id: &str,
    id: i64,
    target: RequestStatus,
    actor_id: &str,
    note: Option<&str>,
    expected_version: Option<i64>,
    now: DateTime<Utc>,
) -> Result<ResourceRequest> {
    let current = get_request(tx, incident_id, id)?.ok_or(EngineError::NotFound {
        entity: "request",
        id,
    })?;
    if let Some(expected) = expected_version
        && expected != current.version
    {
        return Err(EngineError::Conflict {
            expected,
            actual: current.version,
        });
    }
    check_status_transition(current.status, target)?;
    let stored = normalise_status_for_transition(current.status, target);

    let mut updated = current.clone();
    updated.status = stored;
    updated.last_updated_utc = now;
    // A request that was or ends up outside DRAFT is version-counted;
    // only a draft staying a draft is free.
    if has_left_draft(current.status) || has_left_draft(stored) {
        updated.version += 1;
    }
    if !update_request_tx(tx, &updated, current.version)? {
        let actual = get_request(tx, incident_id, id)?
            .map(|r| r.version)
            .unwrap_or(current.version);
        return Err(EngineError::Conflict {
            expected: current.version,
            actual,
        });
    }

    let mut changes = vec![FieldChange::new(
        "status",
        Some(current.status.as_str().to_string()),
        Some(stored.as_str().to_string()),
    )];
    if let Some(note) = note {
        changes.push(FieldChange::new("status_note", None, Some(note.to_string())));
    }
    insert_audit_rows_tx(tx, "request", id, Some(actor_id), now, &changes)?;

    info!(request_id = id, from = %current.status, to = %stored, "status changed");
    Ok(updated)
}
