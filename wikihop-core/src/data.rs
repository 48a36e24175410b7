use crate::cache::LinkCache;
use rusqlite::{Connection, OptionalExtension, Result, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use wikihop_scanner::{NeighborSet, PageId};

/// Link cache persisted in SQLite, one row per page.
///
/// Reads and writes follow the same first-write-wins rule as the in-memory cache.
/// With a TTL configured, rows older than the TTL read as absent and the next
/// write for that page replaces them.
pub struct SqliteLinkCache {
    conn: Mutex<Connection>,
    ttl: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Age in whole seconds, clamped to what a timestamp can hold.
fn age_secs(age: Duration) -> i64 {
    i64::try_from(age.as_secs()).unwrap_or(i64::MAX)
}

impl SqliteLinkCache {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Remove the database file along with any WAL sidecars.
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)?;
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = path.as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = Path::new(&sidecar);
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
        Ok(())
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -16000;  -- 16MB cache
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl: None,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS page_links (
                url TEXT PRIMARY KEY,
                neighbors TEXT NOT NULL,  -- JSON array of page URLs
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_page_links_created ON page_links(created_at);
            ",
        )
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rows created before this instant are expired. Without a TTL nothing is.
    fn cutoff(&self, now: i64) -> i64 {
        match self.ttl {
            Some(ttl) => now.saturating_sub(age_secs(ttl)),
            None => i64::MIN,
        }
    }

    pub fn lookup(&self, page: &PageId) -> Result<Option<NeighborSet>> {
        let cutoff = self.cutoff(current_timestamp());
        let json: Option<String> = self
            .connection()
            .query_row(
                "SELECT neighbors FROM page_links WHERE url = ?1 AND created_at >= ?2",
                params![page.as_str(), cutoff],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.and_then(|json| match serde_json::from_str(&json) {
            Ok(links) => Some(links),
            Err(e) => {
                warn!("Discarding unreadable cache row for {}: {}", page, e);
                None
            }
        }))
    }

    /// Returns true when the row was written, false when a live entry already existed.
    pub fn store(&self, page: &PageId, links: &NeighborSet) -> Result<bool> {
        self.store_at(page, links, current_timestamp())
    }

    fn store_at(&self, page: &PageId, links: &NeighborSet, now: i64) -> Result<bool> {
        let json = serde_json::to_string(links)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let changed = self.connection().execute(
            "INSERT INTO page_links (url, neighbors, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET
                neighbors = excluded.neighbors,
                created_at = excluded.created_at
             WHERE page_links.created_at < ?4",
            params![page.as_str(), json, now, self.cutoff(now)],
        )?;
        Ok(changed > 0)
    }

    pub fn created_at(&self, page: &PageId) -> Result<Option<i64>> {
        self.connection()
            .query_row(
                "SELECT created_at FROM page_links WHERE url = ?1",
                params![page.as_str()],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 =
            self.connection()
                .query_row("SELECT COUNT(*) FROM page_links", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let cutoff = self.cutoff(current_timestamp());
        self.connection().query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN created_at < ?1 THEN 1 ELSE 0 END), 0),
                    MIN(created_at),
                    MAX(created_at)
             FROM page_links",
            params![cutoff],
            |row| {
                Ok(CacheStats {
                    entries: row.get::<_, i64>(0)? as usize,
                    expired: row.get::<_, i64>(1)? as usize,
                    oldest: row.get(2)?,
                    newest: row.get(3)?,
                })
            },
        )
    }

    /// Delete rows past the configured TTL. Without a TTL this is a no-op.
    pub fn purge_expired(&self) -> Result<usize> {
        match self.ttl {
            Some(ttl) => self.purge_older_than(ttl),
            None => Ok(0),
        }
    }

    pub fn purge_older_than(&self, age: Duration) -> Result<usize> {
        let cutoff = current_timestamp().saturating_sub(age_secs(age));
        let removed = self.connection().execute(
            "DELETE FROM page_links WHERE created_at < ?1",
            params![cutoff],
        )?;
        debug!("Purged {} cache row(s) older than {:?}", removed, age);
        Ok(removed)
    }

    pub fn clear(&self) -> Result<usize> {
        self.connection().execute("DELETE FROM page_links", [])
    }
}

impl LinkCache for SqliteLinkCache {
    fn get(&self, page: &PageId) -> Option<Arc<NeighborSet>> {
        match self.lookup(page) {
            Ok(links) => links.map(Arc::new),
            Err(e) => {
                warn!("Cache read failed for {}: {}", page, e);
                None
            }
        }
    }

    fn put(&self, page: &PageId, links: Arc<NeighborSet>) {
        if let Err(e) = self.store(page, &links) {
            warn!("Cache write failed for {}: {}", page, e);
        }
    }
}
