//! The tenant-bound store and its row-level helpers.
//!
//! `RequestStore` owns one connection to one incident's database file. Row
//! mutations are free functions taking the caller's [`Transaction`], so a
//! multi-table mutation commits or rolls back as a unit; reads take a plain
//! connection reference. Timestamps are stored as fixed-width RFC 3339 text
//! (microsecond precision, `Z` suffix), which keeps lexicographic and
//! chronological order identical.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction, params, params_from_iter};
use tracing::debug;

use rreq_model::{
    ApprovalRecord, FulfillmentRecord, FulfillmentStatus, Priority, RequestItem, RequestStatus,
    ResourceRequest,
};

use crate::error::{Result, StoreError};
use crate::schema::init_schema;

pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(entity: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt {
            entity,
            detail: format!("bad timestamp {raw:?}: {err}"),
        })
}

fn parse_opt_ts(entity: &'static str, raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|raw| parse_ts(entity, &raw)).transpose()
}

fn parse_enum<T: std::str::FromStr<Err = String>>(
    entity: &'static str,
    raw: &str,
) -> Result<T> {
    raw.parse().map_err(|detail| StoreError::Corrupt { entity, detail })
}

/// Store for one incident's request data: one SQLite file per tenant.
#[derive(Debug)]
pub struct RequestStore {
    incident_id: String,
    conn: Connection,
}

impl RequestStore {
    /// Open (creating if needed) the database file for `incident_id` under
    /// `dir` and ensure the schema exists.
    pub fn open(dir: impl AsRef<Path>, incident_id: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(format!("{incident_id}.db"));
        let conn = Connection::open(&db_path)?;
        init_schema(&conn)?;
        debug!(incident_id, path = %db_path.display(), "request store opened");
        Ok(Self {
            incident_id: incident_id.to_string(),
            conn,
        })
    }

    /// In-memory store for tests and dry runs.
    pub fn open_in_memory(incident_id: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            incident_id: incident_id.to_string(),
            conn,
        })
    }

    pub fn incident_id(&self) -> &str {
        &self.incident_id
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The single transaction each public engine operation runs in.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

/// Optional narrowing criteria for header listings; members combine
/// conjunctively on top of the always-applied tenant constraint.
#[derive(Debug, Clone, Default)]
pub struct HeaderFilter {
    pub statuses: Vec<RequestStatus>,
    pub priority: Option<Priority>,
    pub text: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

const REQUEST_COLUMNS: &str = "id, incident_id, title, requesting_section, priority, status, \
     created_by_id, created_utc, last_updated_utc, needed_by_utc, justification, \
     delivery_location, comms_requirements, links, version";

type RequestRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
);

fn read_request_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ))
}

fn request_from_row(raw: RequestRow) -> Result<ResourceRequest> {
    let (
        id,
        incident_id,
        title,
        requesting_section,
        priority,
        status,
        created_by_id,
        created_utc,
        last_updated_utc,
        needed_by_utc,
        justification,
        delivery_location,
        comms_requirements,
        links,
        version,
    ) = raw;
    Ok(ResourceRequest {
        id,
        incident_id,
        title,
        requesting_section,
        priority: parse_enum("requests", &priority)?,
        status: parse_enum("requests", &status)?,
        created_by_id,
        created_utc: parse_ts("requests", &created_utc)?,
        last_updated_utc: parse_ts("requests", &last_updated_utc)?,
        needed_by_utc: parse_opt_ts("requests", needed_by_utc)?,
        justification,
        delivery_location,
        comms_requirements,
        links,
        version,
    })
}

/// Insert a request header row; `req.id` is ignored and the fresh id
/// returned.
pub fn insert_request_tx(tx: &Transaction<'_>, req: &ResourceRequest) -> Result<i64> {
    tx.execute(
        "INSERT INTO requests (incident_id, title, requesting_section, priority, status,
            created_by_id, created_utc, last_updated_utc, needed_by_utc, justification,
            delivery_location, comms_requirements, links, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            req.incident_id,
            req.title,
            req.requesting_section,
            req.priority.as_str(),
            req.status.as_str(),
            req.created_by_id,
            fmt_ts(req.created_utc),
            fmt_ts(req.last_updated_utc),
            req.needed_by_utc.map(fmt_ts),
            req.justification,
            req.delivery_location,
            req.comms_requirements,
            req.links,
            req.version,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Conditional header update: writes only when the stored row still carries
/// `guard_version`, so a lost race shows up as `false` instead of a silent
/// overwrite.
pub fn update_request_tx(
    tx: &Transaction<'_>,
    req: &ResourceRequest,
    guard_version: i64,
) -> Result<bool> {
    let updated = tx.execute(
        "UPDATE requests SET title = ?1, requesting_section = ?2, priority = ?3, status = ?4,
            last_updated_utc = ?5, needed_by_utc = ?6, justification = ?7,
            delivery_location = ?8, comms_requirements = ?9, links = ?10, version = ?11
         WHERE id = ?12 AND incident_id = ?13 AND version = ?14",
        params![
            req.title,
            req.requesting_section,
            req.priority.as_str(),
            req.status.as_str(),
            fmt_ts(req.last_updated_utc),
            req.needed_by_utc.map(fmt_ts),
            req.justification,
            req.delivery_location,
            req.comms_requirements,
            req.links,
            req.version,
            req.id,
            req.incident_id,
            guard_version,
        ],
    )?;
    Ok(updated == 1)
}

/// Load one header, tenant-scoped.
pub fn get_request(conn: &Connection, incident_id: &str, id: i64) -> Result<Option<ResourceRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1 AND incident_id = ?2"
    ))?;
    let mut rows = stmt.query_map(params![id, incident_id], read_request_row)?;
    match rows.next() {
        Some(raw) => Ok(Some(request_from_row(raw?)?)),
        None => Ok(None),
    }
}

/// List headers for the tenant, newest first.
pub fn list_requests(
    conn: &Connection,
    incident_id: &str,
    filter: &HeaderFilter,
) -> Result<Vec<ResourceRequest>> {
    let mut sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE incident_id = ?");
    let mut values: Vec<String> = vec![incident_id.to_string()];

    if !filter.statuses.is_empty() {
        let marks = vec!["?"; filter.statuses.len()].join(", ");
        sql.push_str(&format!(" AND status IN ({marks})"));
        values.extend(filter.statuses.iter().map(|s| s.as_str().to_string()));
    }
    if let Some(priority) = filter.priority {
        sql.push_str(" AND priority = ?");
        values.push(priority.as_str().to_string());
    }
    if let Some(text) = &filter.text {
        sql.push_str(
            " AND (instr(lower(title), lower(?)) > 0
               OR instr(lower(coalesce(justification, '')), lower(?)) > 0)",
        );
        values.push(text.clone());
        values.push(text.clone());
    }
    if let Some(from) = filter.created_from {
        sql.push_str(" AND created_utc >= ?");
        values.push(fmt_ts(from));
    }
    if let Some(to) = filter.created_to {
        sql.push_str(" AND created_utc <= ?");
        values.push(fmt_ts(to));
    }
    sql.push_str(" ORDER BY created_utc DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), read_request_row)?;
    let mut requests = Vec::new();
    for raw in rows {
        requests.push(request_from_row(raw?)?);
    }
    Ok(requests)
}

/// Insert a line item; `item.id` is ignored and the fresh id returned.
pub fn insert_item_tx(tx: &Transaction<'_>, item: &RequestItem) -> Result<i64> {
    tx.execute(
        "INSERT INTO request_items (request_id, kind, ref_id, description, quantity, unit,
            special_instructions)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            item.request_id,
            item.kind.as_str(),
            item.ref_id,
            item.description,
            item.quantity,
            item.unit,
            item.special_instructions,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Remove every item of a request (the first half of a wholesale replace).
pub fn delete_items_tx(tx: &Transaction<'_>, request_id: i64) -> Result<usize> {
    Ok(tx.execute(
        "DELETE FROM request_items WHERE request_id = ?1",
        params![request_id],
    )?)
}

pub fn items_for(conn: &Connection, request_id: i64) -> Result<Vec<RequestItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, request_id, kind, ref_id, description, quantity, unit, special_instructions
         FROM request_items WHERE request_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![request_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, f64>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, Option<String>>(7)?,
        ))
    })?;
    let mut items = Vec::new();
    for row in rows {
        let (id, request_id, kind, ref_id, description, quantity, unit, special_instructions) =
            row?;
        items.push(RequestItem {
            id,
            request_id,
            kind: parse_enum("request_items", &kind)?,
            ref_id,
            description,
            quantity,
            unit,
            special_instructions,
        });
    }
    Ok(items)
}

/// Append a decision-log row; never updated afterwards.
pub fn insert_approval_tx(tx: &Transaction<'_>, rec: &ApprovalRecord) -> Result<i64> {
    tx.execute(
        "INSERT INTO approvals (request_id, action, actor_id, note, ts_utc)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            rec.request_id,
            rec.action.as_str(),
            rec.actor_id,
            rec.note,
            fmt_ts(rec.ts_utc),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

pub fn approvals_for(conn: &Connection, request_id: i64) -> Result<Vec<ApprovalRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, request_id, action, actor_id, note, ts_utc
         FROM approvals WHERE request_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![request_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;
    let mut approvals = Vec::new();
    for row in rows {
        let (id, request_id, action, actor_id, note, ts) = row?;
        approvals.push(ApprovalRecord {
            id,
            request_id,
            action: parse_enum("approvals", &action)?,
            actor_id,
            note,
            ts_utc: parse_ts("approvals", &ts)?,
        });
    }
    Ok(approvals)
}

/// Insert a fulfillment row; `rec.id` is ignored and the fresh id returned.
pub fn insert_fulfillment_tx(tx: &Transaction<'_>, rec: &FulfillmentRecord) -> Result<i64> {
    tx.execute(
        "INSERT INTO fulfillments (request_id, supplier_id, assigned_team_id,
            assigned_vehicle_id, eta_utc, status, note, ts_utc)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            rec.request_id,
            rec.supplier_id,
            rec.assigned_team_id,
            rec.assigned_vehicle_id,
            rec.eta_utc.map(fmt_ts),
            rec.status.as_str(),
            rec.note,
            fmt_ts(rec.ts_utc),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

/// In-place fulfillment update (the one mutable record in the aggregate).
pub fn update_fulfillment_tx(tx: &Transaction<'_>, rec: &FulfillmentRecord) -> Result<bool> {
    let updated = tx.execute(
        "UPDATE fulfillments SET supplier_id = ?1, assigned_team_id = ?2,
            assigned_vehicle_id = ?3, eta_utc = ?4, status = ?5, note = ?6
         WHERE id = ?7",
        params![
            rec.supplier_id,
            rec.assigned_team_id,
            rec.assigned_vehicle_id,
            rec.eta_utc.map(fmt_ts),
            rec.status.as_str(),
            rec.note,
            rec.id,
        ],
    )?;
    Ok(updated == 1)
}

type FulfillmentRow = (
    i64,
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    String,
);

fn read_fulfillment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FulfillmentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn fulfillment_from_row(raw: FulfillmentRow) -> Result<FulfillmentRecord> {
    let (id, request_id, supplier_id, assigned_team_id, assigned_vehicle_id, eta, status, note, ts) =
        raw;
    Ok(FulfillmentRecord {
        id,
        request_id,
        supplier_id,
        assigned_team_id,
        assigned_vehicle_id,
        eta_utc: parse_opt_ts("fulfillments", eta)?,
        status: parse_enum::<FulfillmentStatus>("fulfillments", &status)?,
        note,
        ts_utc: parse_ts("fulfillments", &ts)?,
    })
}

/// Load one fulfillment row, tenant-scoped through its parent request.
pub fn get_fulfillment(
    conn: &Connection,
    incident_id: &str,
    id: i64,
) -> Result<Option<FulfillmentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.request_id, f.supplier_id, f.assigned_team_id, f.assigned_vehicle_id,
                f.eta_utc, f.status, f.note, f.ts_utc
         FROM fulfillments f
         JOIN requests r ON r.id = f.request_id
         WHERE f.id = ?1 AND r.incident_id = ?2",
    )?;
    let mut rows = stmt.query_map(params![id, incident_id], read_fulfillment_row)?;
    match rows.next() {
        Some(raw) => Ok(Some(fulfillment_from_row(raw?)?)),
        None => Ok(None),
    }
}

pub fn fulfillments_for(conn: &Connection, request_id: i64) -> Result<Vec<FulfillmentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, request_id, supplier_id, assigned_team_id, assigned_vehicle_id,
                eta_utc, status, note, ts_utc
         FROM fulfillments WHERE request_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![request_id], read_fulfillment_row)?;
    let mut fulfillments = Vec::new();
    for raw in rows {
        fulfillments.push(fulfillment_from_row(raw?)?);
    }
    Ok(fulfillments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rreq_model::Priority;

    fn sample(incident_id: &str) -> ResourceRequest {
        ResourceRequest {
            id: 0,
            incident_id: incident_id.to_string(),
            title: "Tarps".to_string(),
            requesting_section: "Logistics".to_string(),
            priority: Priority::Routine,
            status: RequestStatus::Draft,
            created_by_id: "op-1".to_string(),
            created_utc: Utc::now(),
            last_updated_utc: Utc::now(),
            needed_by_utc: None,
            justification: Some("shelter repair".to_string()),
            delivery_location: None,
            comms_requirements: None,
            links: None,
            version: 1,
        }
    }

    #[test]
    fn insert_and_load_roundtrip() {
        let mut store = RequestStore::open_in_memory("INC-1").expect("open");
        let req = sample("INC-1");
        let tx = store.transaction().expect("tx");
        let id = insert_request_tx(&tx, &req).expect("insert");
        tx.commit().expect("commit");

        let loaded = get_request(store.connection(), "INC-1", id)
            .expect("get")
            .expect("present");
        assert_eq!(loaded.title, "Tarps");
        assert_eq!(loaded.status, RequestStatus::Draft);
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.justification.as_deref(), Some("shelter repair"));
    }

    #[test]
    fn reads_are_tenant_scoped() {
        let mut store = RequestStore::open_in_memory("INC-A").expect("open");
        let tx = store.transaction().expect("tx");
        let ours = insert_request_tx(&tx, &sample("INC-A")).expect("insert ours");
        let theirs = insert_request_tx(&tx, &sample("INC-B")).expect("insert theirs");
        tx.commit().expect("commit");

        assert!(
            get_request(store.connection(), "INC-A", ours)
                .expect("get")
                .is_some()
        );
        assert!(
            get_request(store.connection(), "INC-A", theirs)
                .expect("get")
                .is_none()
        );
        let listed = list_requests(store.connection(), "INC-A", &HeaderFilter::default())
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, ours);
    }

    #[test]
    fn version_guard_detects_stale_writes() {
        let mut store = RequestStore::open_in_memory("INC-1").expect("open");
        let tx = store.transaction().expect("tx");
        let id = insert_request_tx(&tx, &sample("INC-1")).expect("insert");
        tx.commit().expect("commit");

        let mut current = get_request(store.connection(), "INC-1", id)
            .expect("get")
            .expect("present");
        current.title = "Heavy tarps".to_string();
        current.version = 2;

        let tx = store.transaction().expect("tx");
        assert!(update_request_tx(&tx, &current, 1).expect("update"));
        // Same guard again: the row has moved on.
        assert!(!update_request_tx(&tx, &current, 1).expect("stale update"));
        tx.commit().expect("commit");
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = {
            let mut store = RequestStore::open(dir.path(), "INC-9").expect("open");
            let tx = store.transaction().expect("tx");
            let id = insert_request_tx(&tx, &sample("INC-9")).expect("insert");
            tx.commit().expect("commit");
            id
        };
        let store = RequestStore::open(dir.path(), "INC-9").expect("reopen");
        assert!(
            get_request(store.connection(), "INC-9", id)
                .expect("get")
                .is_some()
        );
    }
}
