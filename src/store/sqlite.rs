//! SQLite-backed video cache.
//!
//! Single source of truth for what the UI observes. Every committed write
//! broadcasts a fresh full-table snapshot to all watchers.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tokio::sync::watch;

use super::schema::{apply_schema, read_schema_version};
use super::types::StoredVideo;
use crate::error::{Result, SyncError};

/// SQLite-backed playlist cache.
///
/// Thread-safe via an internal `Mutex<Connection>`. All writes are
/// serialized; each `upsert_all` call is one transaction, so readers never
/// see a half-applied batch.
pub struct VideoStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
    snapshot_tx: watch::Sender<Vec<StoredVideo>>,
}

impl VideoStore {
    /// Open (or create) the cache database at `path`.
    ///
    /// Creates parent directories as needed and applies the schema if the
    /// database is new.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory cache. State is lost on drop; intended for tests
    /// and ephemeral runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        apply_schema(&conn).map_err(storage_err)?;
        let initial = read_all(&conn)?;
        let (snapshot_tx, _) = watch::channel(initial);
        Ok(Self {
            path,
            conn: Mutex::new(conn),
            snapshot_tx,
        })
    }

    /// Returns the database file path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the schema version stamp.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let conn = self.lock()?;
        read_schema_version(&conn).map_err(storage_err)
    }

    /// Insert or overwrite the given records as one atomic batch.
    ///
    /// Rows sharing a `url` with an existing row are replaced wholesale;
    /// a repeated `url` within the batch keeps the last value. On success
    /// the post-write snapshot is broadcast to all watchers. On any failure
    /// the transaction rolls back and nothing is broadcast.
    pub fn upsert_all(&self, records: &[StoredVideo]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(storage_err)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO videos (url, updated, title, description, thumbnail) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(url) DO UPDATE SET \
                         updated = excluded.updated, \
                         title = excluded.title, \
                         description = excluded.description, \
                         thumbnail = excluded.thumbnail",
                )
                .map_err(storage_err)?;

            for record in records {
                stmt.execute(rusqlite::params![
                    record.url,
                    record.updated,
                    record.title,
                    record.description,
                    record.thumbnail,
                ])
                .map_err(storage_err)?;
            }
        }
        tx.commit().map_err(storage_err)?;

        let snapshot = read_all(&conn)?;
        tracing::debug!("cache now holds {} videos", snapshot.len());
        self.snapshot_tx.send_replace(snapshot);
        Ok(())
    }

    /// Read all cached records, ordered by `url`.
    pub fn list_all(&self) -> Result<Vec<StoredVideo>> {
        let conn = self.lock()?;
        read_all(&conn)
    }

    /// Subscribe to full-table snapshots.
    ///
    /// The receiver immediately holds the latest snapshot; every committed
    /// `upsert_all` pushes a new one.
    pub fn observe(&self) -> watch::Receiver<Vec<StoredVideo>> {
        self.snapshot_tx.subscribe()
    }

    /// The latest broadcast snapshot, without touching the database.
    pub fn latest(&self) -> Vec<StoredVideo> {
        self.snapshot_tx.borrow().clone()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::Storage("cache connection lock poisoned".to_owned()))
    }
}

fn read_all(conn: &Connection) -> Result<Vec<StoredVideo>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT url, updated, title, description, thumbnail \
             FROM videos ORDER BY url",
        )
        .map_err(storage_err)?;
    let rows = stmt.query_map([], row_to_video).map_err(storage_err)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(storage_err)?);
    }
    Ok(records)
}

fn row_to_video(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredVideo> {
    Ok(StoredVideo {
        url: row.get(0)?,
        updated: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        thumbnail: row.get(4)?,
    })
}

fn storage_err(e: rusqlite::Error) -> SyncError {
    SyncError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn video(url: &str, title: &str) -> StoredVideo {
        StoredVideo {
            url: url.to_owned(),
            updated: "2021-01-01".to_owned(),
            title: title.to_owned(),
            description: format!("about {title}"),
            thumbnail: format!("{url}.png"),
        }
    }

    #[test]
    fn upsert_then_list_round_trips() {
        let store = VideoStore::open_in_memory().unwrap();
        store
            .upsert_all(&[video("b", "Second"), video("a", "First")])
            .unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
        // Deterministic order by url.
        assert_eq!(all[0].url, "a");
        assert_eq!(all[1].url, "b");
    }

    #[test]
    fn upsert_is_idempotent() {
        let store = VideoStore::open_in_memory().unwrap();
        let batch = vec![video("a", "First"), video("b", "Second")];

        store.upsert_all(&batch).unwrap();
        let once = store.list_all().unwrap();

        store.upsert_all(&batch).unwrap();
        let twice = store.list_all().unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn upsert_overwrites_existing_url() {
        let store = VideoStore::open_in_memory().unwrap();
        store.upsert_all(&[video("a", "Old Title")]).unwrap();
        store.upsert_all(&[video("a", "New Title")]).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New Title");
    }

    #[test]
    fn repeated_url_within_batch_keeps_last_value() {
        let store = VideoStore::open_in_memory().unwrap();
        store
            .upsert_all(&[video("a", "First Pass"), video("a", "Last Pass")])
            .unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Last Pass");
    }

    #[test]
    fn failed_batch_leaves_table_unchanged() {
        let store = VideoStore::open_in_memory().unwrap();
        store.upsert_all(&[video("a", "Existing")]).unwrap();

        // The empty url violates the CHECK constraint after two valid rows
        // have already been applied inside the transaction.
        let bad_batch = vec![video("b", "B"), video("c", "C"), video("", "Broken")];
        let err = store.upsert_all(&bad_batch).unwrap_err();
        assert!(matches!(err, SyncError::Storage(_)));

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].url, "a");
    }

    #[test]
    fn failed_batch_broadcasts_nothing() {
        let store = VideoStore::open_in_memory().unwrap();
        store.upsert_all(&[video("a", "Existing")]).unwrap();

        let rx = store.observe();
        assert!(!rx.has_changed().unwrap());

        let _ = store.upsert_all(&[video("", "Broken")]);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn observe_sees_every_committed_write() {
        let store = VideoStore::open_in_memory().unwrap();
        let mut rx = store.observe();
        assert!(rx.borrow().is_empty());

        store.upsert_all(&[video("a", "First")]).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.upsert_all(&[video("b", "Second")]).unwrap();
        assert_eq!(rx.borrow_and_update().len(), 2);
    }

    #[test]
    fn late_subscriber_sees_latest_snapshot() {
        let store = VideoStore::open_in_memory().unwrap();
        store.upsert_all(&[video("a", "First")]).unwrap();

        let rx = store.observe();
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(store.latest().len(), 1);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let store = VideoStore::open_in_memory().unwrap();
        let rx = store.observe();

        store.upsert_all(&[]).unwrap();
        assert!(!rx.has_changed().unwrap());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn schema_version_is_stamped() {
        let store = VideoStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(1));
    }
}
