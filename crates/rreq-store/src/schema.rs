//! Schema creation. Safe to run against an already-initialized store.

use rusqlite::{Connection, params};

use crate::error::Result;

pub const SCHEMA_VERSION: &str = "v1";

/// Create tables, indexes, and pragmas. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA foreign_keys=ON;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS requests (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          incident_id TEXT NOT NULL,
          title TEXT NOT NULL,
          requesting_section TEXT NOT NULL,
          priority TEXT NOT NULL,
          status TEXT NOT NULL,
          created_by_id TEXT NOT NULL,
          created_utc TEXT NOT NULL,
          last_updated_utc TEXT NOT NULL,
          needed_by_utc TEXT,
          justification TEXT,
          delivery_location TEXT,
          comms_requirements TEXT,
          links TEXT,
          version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS request_items (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          request_id INTEGER NOT NULL REFERENCES requests(id),
          kind TEXT NOT NULL,
          ref_id TEXT,
          description TEXT NOT NULL,
          quantity REAL NOT NULL,
          unit TEXT NOT NULL,
          special_instructions TEXT
        );

        CREATE TABLE IF NOT EXISTS approvals (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          request_id INTEGER NOT NULL REFERENCES requests(id),
          action TEXT NOT NULL,
          actor_id TEXT NOT NULL,
          note TEXT,
          ts_utc TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fulfillments (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          request_id INTEGER NOT NULL REFERENCES requests(id),
          supplier_id TEXT,
          assigned_team_id TEXT,
          assigned_vehicle_id TEXT,
          eta_utc TEXT,
          status TEXT NOT NULL,
          note TEXT,
          ts_utc TEXT NOT NULL
        );

        -- No foreign key: audit rows outlive their subject.
        CREATE TABLE IF NOT EXISTS audit_log (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          entity_type TEXT NOT NULL,
          entity_id INTEGER NOT NULL,
          actor_id TEXT,
          field TEXT NOT NULL,
          old_value TEXT,
          new_value TEXT,
          ts_utc TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_requests_incident_created
          ON requests(incident_id, created_utc DESC);
        CREATE INDEX IF NOT EXISTS idx_items_request ON request_items(request_id);
        CREATE INDEX IF NOT EXISTS idx_approvals_request ON approvals(request_id);
        CREATE INDEX IF NOT EXISTS idx_fulfillments_request ON fulfillments(request_id);
        CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_log(entity_type, entity_id);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("first init");
        init_schema(&conn).expect("second init");
        let version: String = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .expect("schema version row");
        assert_eq!(version, SCHEMA_VERSION);
    }
}
