//! Transcode state access: a session-scoped read-through cache over a
//! narrow persistent-store collaborator.
//!
//! [`TranscodeStateStore`] has an explicit lifecycle: one instance per
//! resolution session (e.g. one page render), created at request start and
//! dropped at its end. It is deliberately not a process-wide cache;
//! concurrent sessions each read the persistent store themselves.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use vf_core::Result;
use vf_db::models::TranscodeRow;
use vf_db::pool::DbPool;
use vf_db::queries::transcode;

/// Persistent-store collaborator. Narrow by design so tests can fake it.
pub trait StateStore: Send + Sync {
    /// All state records for one file (bounded read).
    fn read_all(&self, image_name: &str) -> Result<Vec<TranscodeRow>>;

    /// Record a job admission: insert a pending record or refresh the
    /// admission timestamp on an existing one. Must be idempotent under
    /// concurrent admission.
    fn upsert_addjob(&self, image_name: &str, key: &str) -> Result<()>;

    /// Delete records for a file; `key = None` deletes all of them.
    /// Returns the number of rows removed.
    fn delete(&self, image_name: &str, key: Option<&str>) -> Result<usize>;
}

/// SQLite-backed [`StateStore`] over the vf-db pool.
pub struct SqliteStateStore {
    pool: DbPool,
    read_limit: u32,
}

impl SqliteStateStore {
    pub fn new(pool: DbPool, read_limit: u32) -> Self {
        Self { pool, read_limit }
    }
}

impl StateStore for SqliteStateStore {
    fn read_all(&self, image_name: &str) -> Result<Vec<TranscodeRow>> {
        let conn = vf_db::pool::get_conn(&self.pool)?;
        transcode::get_for_file(&conn, image_name, self.read_limit)
    }

    fn upsert_addjob(&self, image_name: &str, key: &str) -> Result<()> {
        let conn = vf_db::pool::get_conn(&self.pool)?;
        transcode::upsert_addjob(&conn, image_name, key)
    }

    fn delete(&self, image_name: &str, key: Option<&str>) -> Result<usize> {
        let conn = vf_db::pool::get_conn(&self.pool)?;
        transcode::delete(&conn, image_name, key)
    }
}

/// Session-scoped tiered cache of transcode state, keyed by file name then
/// profile key.
pub struct TranscodeStateStore {
    backend: Arc<dyn StateStore>,
    cache: RwLock<HashMap<String, HashMap<String, TranscodeRow>>>,
}

impl TranscodeStateStore {
    pub fn new(backend: Arc<dyn StateStore>) -> Self {
        Self {
            backend,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// State records for a file, read through the session cache.
    ///
    /// A persistent-store read failure degrades to "no known state" (every
    /// profile looks never-requested and will be re-admitted) rather than
    /// failing the resolution.
    pub fn get(&self, image_name: &str) -> HashMap<String, TranscodeRow> {
        if let Some(entry) = self.cache.read().get(image_name) {
            return entry.clone();
        }

        let records = match self.backend.read_all(image_name) {
            Ok(rows) => rows.into_iter().map(|r| (r.key.clone(), r)).collect(),
            Err(e) => {
                tracing::warn!(file = %image_name, "transcode state read failed: {e}");
                HashMap::new()
            }
        };

        self.cache
            .write()
            .insert(image_name.to_string(), records.clone());
        records
    }

    /// True iff a record exists for (file, key) with a success timestamp.
    pub fn is_ready(&self, image_name: &str, key: &str) -> bool {
        self.get(image_name)
            .get(key)
            .is_some_and(TranscodeRow::is_ready)
    }

    /// Record a job admission and drop the session-cache entry so the next
    /// read within this session sees the new pending state.
    pub fn upsert_addjob(&self, image_name: &str, key: &str) -> Result<()> {
        self.backend.upsert_addjob(image_name, key)?;
        self.invalidate(image_name);
        Ok(())
    }

    /// Drop the session-cache entry for a file. Never touches the
    /// persistent store.
    pub fn invalidate(&self, image_name: &str) {
        self.cache.write().remove(image_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake backend that counts reads and can be told to fail.
    struct CountingStore {
        rows: RwLock<Vec<TranscodeRow>>,
        reads: AtomicUsize,
        fail_reads: bool,
    }

    impl CountingStore {
        fn new(rows: Vec<TranscodeRow>) -> Self {
            Self {
                rows: RwLock::new(rows),
                reads: AtomicUsize::new(0),
                fail_reads: false,
            }
        }
    }

    impl StateStore for CountingStore {
        fn read_all(&self, image_name: &str) -> Result<Vec<TranscodeRow>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(vf_core::Error::database("store offline"));
            }
            Ok(self
                .rows
                .read()
                .iter()
                .filter(|r| r.image_name == image_name)
                .cloned()
                .collect())
        }

        fn upsert_addjob(&self, image_name: &str, key: &str) -> Result<()> {
            self.rows.write().push(pending(image_name, key));
            Ok(())
        }

        fn delete(&self, image_name: &str, key: Option<&str>) -> Result<usize> {
            let mut rows = self.rows.write();
            let before = rows.len();
            rows.retain(|r| r.image_name != image_name || key.is_some_and(|k| r.key != k));
            Ok(before - rows.len())
        }
    }

    fn pending(name: &str, key: &str) -> TranscodeRow {
        TranscodeRow {
            image_name: name.into(),
            key: key.into(),
            time_addjob: Some("t0".into()),
            time_success: None,
            time_error: None,
            error: String::new(),
            final_bitrate: 0,
        }
    }

    fn ready(name: &str, key: &str) -> TranscodeRow {
        TranscodeRow {
            time_success: Some("t1".into()),
            final_bitrate: 500_000,
            ..pending(name, key)
        }
    }

    #[test]
    fn second_read_is_served_from_session_cache() {
        let backend = Arc::new(CountingStore::new(vec![ready("A.ogv", "480p.webm")]));
        let store = TranscodeStateStore::new(backend.clone());

        store.get("A.ogv");
        store.get("A.ogv");
        assert_eq!(backend.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let backend = Arc::new(CountingStore::new(vec![]));
        let store = TranscodeStateStore::new(backend.clone());

        store.get("A.ogv");
        store.invalidate("A.ogv");
        store.get("A.ogv");
        assert_eq!(backend.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn upsert_makes_pending_visible_within_session() {
        let backend = Arc::new(CountingStore::new(vec![]));
        let store = TranscodeStateStore::new(backend);

        assert!(store.get("A.ogv").is_empty());
        store.upsert_addjob("A.ogv", "480p.webm").unwrap();

        let state = store.get("A.ogv");
        assert!(state.get("480p.webm").unwrap().is_pending());
    }

    #[test]
    fn is_ready_distinguishes_states() {
        let backend = Arc::new(CountingStore::new(vec![
            ready("A.ogv", "480p.webm"),
            pending("A.ogv", "480p.ogv"),
        ]));
        let store = TranscodeStateStore::new(backend);

        assert!(store.is_ready("A.ogv", "480p.webm"));
        assert!(!store.is_ready("A.ogv", "480p.ogv"));
        assert!(!store.is_ready("A.ogv", "720p.mp4"));
    }

    #[test]
    fn read_failure_degrades_to_empty_state() {
        let mut backend = CountingStore::new(vec![ready("A.ogv", "480p.webm")]);
        backend.fail_reads = true;
        let store = TranscodeStateStore::new(Arc::new(backend));

        assert!(store.get("A.ogv").is_empty());
        assert!(!store.is_ready("A.ogv", "480p.webm"));
    }
}
