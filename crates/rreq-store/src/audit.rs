//! The audit recorder: field-level diffs written as immutable rows.
//!
//! Rows are keyed by `(entity_type, entity_id)` with no foreign key, so the
//! trail survives whatever happens to its subject. One logical mutation may
//! emit zero, one, or many rows.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use rreq_model::AuditRecord;

use crate::error::Result;
use crate::store::{fmt_ts, parse_ts};

/// One changed field: the before and after values as stored strings.
/// Absent maps to SQL NULL on either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(
        field: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value,
            new_value,
        }
    }

    /// Compare a before and after snapshot of one field; `None` when the
    /// value did not change.
    pub fn diff(
        field: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Option<Self> {
        if old_value == new_value {
            None
        } else {
            Some(Self::new(field, old_value, new_value))
        }
    }
}

/// Append one audit row per change, in slice order.
pub fn insert_audit_rows_tx(
    conn: &Connection,
    entity_type: &str,
    entity_id: i64,
    actor_id: Option<&str>,
    ts_utc: DateTime<Utc>,
    changes: &[FieldChange],
) -> Result<()> {
    for change in changes {
        conn.execute(
            "INSERT INTO audit_log (entity_type, entity_id, actor_id, field, old_value, new_value, ts_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entity_type,
                entity_id,
                actor_id,
                change.field,
                change.old_value,
                change.new_value,
                fmt_ts(ts_utc),
            ],
        )?;
    }
    if !changes.is_empty() {
        debug!(entity_type, entity_id, rows = changes.len(), "audit rows written");
    }
    Ok(())
}

/// The full audit trail of one request: rows keyed to the request itself
/// plus rows keyed to any of its fulfillment records, in insertion order.
pub fn audit_for_request(conn: &Connection, request_id: i64) -> Result<Vec<AuditRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, entity_type, entity_id, actor_id, field, old_value, new_value, ts_utc
         FROM audit_log
         WHERE (entity_type = 'request' AND entity_id = ?1)
            OR (entity_type = 'fulfillment'
                AND entity_id IN (SELECT id FROM fulfillments WHERE request_id = ?1))
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![request_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;
    let mut records = Vec::new();
    for row in rows {
        let (id, entity_type, entity_id, actor_id, field, old_value, new_value, ts) = row?;
        records.push(AuditRecord {
            id,
            entity_type,
            entity_id,
            actor_id,
            field,
            old_value,
            new_value,
            ts_utc: parse_ts("audit_log", &ts)?,
        });
    }
    Ok(records)
}
