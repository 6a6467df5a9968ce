//! SQLite DDL for the video cache.
//!
//! All `CREATE TABLE` statements live here so they are reviewable and
//! testable in isolation.

use rusqlite::Connection;

pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL for the video cache database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- Schema version tracking.
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Cached playlist entries — mirrors StoredVideo fields.
CREATE TABLE IF NOT EXISTS videos (
    url         TEXT PRIMARY KEY CHECK (url <> ''),
    updated     TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    thumbnail   TEXT NOT NULL
);
"#;

/// Apply the full schema to an open connection.
///
/// Safe to call multiple times. Seeds the schema version into `schema_meta`
/// on a fresh database.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let version_str = CURRENT_SCHEMA_VERSION.to_string();
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![version_str],
    )?;

    Ok(())
}

/// Read the schema version stamp, if present.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;

    match rows.next()? {
        Some(row) => {
            let raw: String = row.get(0)?;
            Ok(raw.parse().ok())
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn apply_schema_seeds_version_once() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );

        // A second apply must not bump or duplicate the stamp.
        apply_schema(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_meta", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn empty_url_violates_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO videos (url, updated, title, description, thumbnail) \
             VALUES ('', 'u', 't', 'd', 'th')",
            [],
        );
        assert!(result.is_err());
    }
}
