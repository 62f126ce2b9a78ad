//! SQLite DDL definitions for the subscription store.
//!
//! All `CREATE TABLE` / `CREATE INDEX` statements live here so they are
//! reviewable and testable in isolation.

use rusqlite::Connection;

/// Current schema version stamped into `schema_meta`.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL for the tracker database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- Enforce foreign key constraints.
PRAGMA foreign_keys = ON;

-- Schema version tracking.
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Subscription records — mirrors Subscription fields.
CREATE TABLE IF NOT EXISTS subscriptions (
    id         TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL,
    name       TEXT NOT NULL,
    cost       REAL NOT NULL DEFAULT 0,
    renew_date INTEGER,             -- epoch ms; NULL = missing/unreadable
    category   TEXT NOT NULL DEFAULT 'other',
    recurrence TEXT NOT NULL DEFAULT 'monthly',
    created_at INTEGER NOT NULL DEFAULT 0
);

-- Indexes for the two query patterns: owner-scoped listing and the
-- cross-owner renewal range scan.
CREATE INDEX IF NOT EXISTS idx_subscriptions_owner      ON subscriptions(owner_id);
CREATE INDEX IF NOT EXISTS idx_subscriptions_renew_date ON subscriptions(renew_date);

-- Owner account records: contact details plus reminder preference.
-- reminder_days is nullable; a NULL is materialised to the default on
-- first read.
CREATE TABLE IF NOT EXISTS owners (
    owner_id      TEXT PRIMARY KEY,
    email         TEXT NOT NULL DEFAULT '',
    display_name  TEXT,
    reminder_days INTEGER
);

"#;

/// Apply the full schema to an open connection.
///
/// Safe to call multiple times — all statements use `IF NOT EXISTS`.
/// Inserts the current schema version into `schema_meta` if not already
/// present.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let version_str = CURRENT_SCHEMA_VERSION.to_string();
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![version_str],
    )?;

    Ok(())
}

/// Read the stamped schema version, if any.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let raw: String = row.get(0)?;
            Ok(raw.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}
