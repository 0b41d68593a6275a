//! String key-value stores backing the session bridge
//!
//! Writes are buffered until [`KeyValueStore::flush`], so one snapshot costs
//! one transaction.

use crate::error::{Result, StorageError};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::collections::BTreeMap;
use std::mem;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Durable string key-value storage
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Make buffered writes durable
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Volatile store for tests and hosts without durable storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, sorted by key
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
";

const UPSERT: &str = r"
    INSERT INTO settings (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
";

/// Messages for the background writer
enum WriterMessage {
    /// Key → new value, or `None` to delete
    Batch(BTreeMap<String, Option<String>>),
    Sync(oneshot::Sender<Result<()>>),
}

/// `SQLite`-backed store
///
/// Every row is loaded on open, so reads never touch the database. Flushed
/// batches go to a background task that commits each one in a single
/// transaction, in order. Await [`SqliteWriter::sync`] to know they landed.
#[derive(Debug)]
pub struct SqliteStore {
    entries: BTreeMap<String, String>,
    pending: BTreeMap<String, Option<String>>,
    writer: mpsc::UnboundedSender<WriterMessage>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    ///
    /// Must be called inside a tokio runtime; the writer task is spawned on it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        debug!(path = %path.display(), "Opening session database");
        Self::connect(options).await
    }

    /// Store in a private in-memory database (lost on drop)
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One connection: the writer is the only user after load, and an
        // in-memory database lives exactly as long as its connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&pool)
            .await?;
        let entries: BTreeMap<String, String> = rows.into_iter().collect();
        debug!(entries = entries.len(), "Session database loaded");

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(pool, rx));

        Ok(Self {
            entries,
            pending: BTreeMap::new(),
            writer: tx,
        })
    }

    /// Handle for waiting on flushed writes
    pub fn writer(&self) -> SqliteWriter {
        SqliteWriter {
            tx: self.writer.clone(),
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        if self.entries.get(key) != Some(&value) {
            self.entries.insert(key.to_string(), value.clone());
            self.pending.insert(key.to_string(), Some(value));
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.pending.insert(key.to_string(), None);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = mem::take(&mut self.pending);
        self.writer
            .send(WriterMessage::Batch(batch))
            .map_err(|_| StorageError::WriterClosed)
    }
}

/// Cloneable handle to a [`SqliteStore`]'s writer task
#[derive(Debug, Clone)]
pub struct SqliteWriter {
    tx: mpsc::UnboundedSender<WriterMessage>,
}

impl SqliteWriter {
    /// Wait until every batch flushed so far is committed
    ///
    /// Reports the first write failure since the previous sync.
    pub async fn sync(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriterMessage::Sync(ack))
            .map_err(|_| StorageError::WriterClosed)?;
        done.await.map_err(|_| StorageError::WriterClosed)?
    }
}

impl std::fmt::Debug for WriterMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterMessage::Batch(batch) => f.debug_tuple("Batch").field(&batch.len()).finish(),
            WriterMessage::Sync(_) => f.write_str("Sync"),
        }
    }
}

async fn run_writer(pool: SqlitePool, mut rx: mpsc::UnboundedReceiver<WriterMessage>) {
    let mut failure: Option<String> = None;

    while let Some(message) = rx.recv().await {
        match message {
            WriterMessage::Batch(batch) => {
                let writes = batch.len();
                match apply(&pool, batch).await {
                    Ok(()) => debug!(writes, "Session batch committed"),
                    Err(e) => {
                        warn!(error = %e, writes, "Session batch failed");
                        failure.get_or_insert_with(|| e.to_string());
                    }
                }
            }
            WriterMessage::Sync(ack) => {
                let result = failure.take().map_or(Ok(()), |e| Err(StorageError::Write(e)));
                // The waiter may have given up
                let _ = ack.send(result);
            }
        }
    }

    pool.close().await;
    debug!("Session writer stopped");
}

async fn apply(
    pool: &SqlitePool,
    batch: BTreeMap<String, Option<String>>,
) -> std::result::Result<(), sqlx::Error> {
    let now = Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for (key, value) in batch {
        match value {
            Some(value) => {
                sqlx::query(UPSERT)
                    .bind(key)
                    .bind(value)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                sqlx::query("DELETE FROM settings WHERE key = ?")
                    .bind(key)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        store.set("radio:volume", "40".to_string()).unwrap();
        assert_eq!(store.get("radio:volume").unwrap().as_deref(), Some("40"));

        store.remove("radio:volume").unwrap();
        assert!(store.get("radio:volume").unwrap().is_none());
    }

    #[tokio::test]
    async fn sqlite_store_persists_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.db");

        let mut store = SqliteStore::open(&path).await.unwrap();
        store.set("radio:volume", "40".to_string()).unwrap();
        store.set("radio:played-ids", "[]".to_string()).unwrap();
        store.flush().unwrap();
        store.writer().sync().await.unwrap();

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("radio:volume").unwrap().as_deref(), Some("40"));
        assert_eq!(reopened.get("radio:played-ids").unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn unflushed_writes_are_not_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.db");

        let mut store = SqliteStore::open(&path).await.unwrap();
        store.set("radio:volume", "40".to_string()).unwrap();
        assert_eq!(store.get("radio:volume").unwrap().as_deref(), Some("40"));
        store.writer().sync().await.unwrap();

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert!(reopened.get("radio:volume").unwrap().is_none());
    }

    #[tokio::test]
    async fn removals_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.db");

        let mut store = SqliteStore::open(&path).await.unwrap();
        store.set("radio:volume", "40".to_string()).unwrap();
        store.set("radio:position", "12.5".to_string()).unwrap();
        store.flush().unwrap();
        store.remove("radio:position").unwrap();
        store.set("radio:volume", "55".to_string()).unwrap();
        store.flush().unwrap();
        store.writer().sync().await.unwrap();

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("radio:volume").unwrap().as_deref(), Some("55"));
        assert!(reopened.get("radio:position").unwrap().is_none());
    }

    #[tokio::test]
    async fn in_memory_store_works() {
        let mut store = SqliteStore::in_memory().await.unwrap();
        store.set("radio:volume", "70".to_string()).unwrap();
        store.flush().unwrap();
        store.writer().sync().await.unwrap();
        assert_eq!(store.get("radio:volume").unwrap().as_deref(), Some("70"));
    }

    #[tokio::test]
    async fn non_database_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.db");
        std::fs::write(&path, "not a database\n".repeat(1024)).unwrap();

        let result = SqliteStore::open(&path).await;
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
