//! Deduplicating job admission.
//!
//! [`JobQueueGateway`] is the only place encode jobs enter the system: a
//! (file, profile) pair is admitted at most once per round, where a round
//! ends when the external worker writes success or error back into the
//! state table.

use std::sync::Arc;

use vf_core::{Result, TranscodeJobId};
use vf_db::pool::DbPool;
use vf_db::queries::jobs;

use crate::store::TranscodeStateStore;

/// Job queue collaborator. The external encode worker consumes submitted
/// jobs and writes results back into the state table out of band.
pub trait JobQueue: Send + Sync {
    /// Submit an encode job for (file, key).
    fn submit(&self, image_name: &str, key: &str) -> Result<TranscodeJobId>;

    /// Remove still-queued jobs for a file; `key = None` targets every
    /// profile. Returns the number of jobs removed.
    fn remove_pending(&self, image_name: &str, key: Option<&str>) -> Result<usize>;
}

/// SQLite-backed [`JobQueue`] over the vf-db pool.
pub struct SqliteJobQueue {
    pool: DbPool,
}

impl SqliteJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl JobQueue for SqliteJobQueue {
    fn submit(&self, image_name: &str, key: &str) -> Result<TranscodeJobId> {
        let conn = vf_db::pool::get_conn(&self.pool)?;
        jobs::submit(&conn, image_name, key)
    }

    fn remove_pending(&self, image_name: &str, key: Option<&str>) -> Result<usize> {
        let conn = vf_db::pool::get_conn(&self.pool)?;
        jobs::delete_pending(&conn, image_name, key)
    }
}

/// Deduplicating admission point in front of a [`JobQueue`].
pub struct JobQueueGateway {
    queue: Arc<dyn JobQueue>,
}

impl JobQueueGateway {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Admit an encode job for (file, key) unless one is already pending.
    ///
    /// Re-reads state through the session store; an existing record with an
    /// admission timestamp means the job is already in flight (or awaiting
    /// retry by the worker) and nothing happens. Submission failure is
    /// logged and leaves the state untouched, so the next resolution
    /// retries the admission.
    pub fn enqueue_if_absent(&self, state: &TranscodeStateStore, image_name: &str, key: &str) {
        let records = state.get(image_name);
        if records.get(key).is_some_and(|r| r.time_addjob.is_some()) {
            return;
        }

        match self.queue.submit(image_name, key) {
            Ok(job_id) => {
                tracing::debug!(file = %image_name, key = %key, job_id = %job_id, "encode job admitted");
                if let Err(e) = state.upsert_addjob(image_name, key) {
                    tracing::error!(file = %image_name, key = %key, "failed to record admission: {e}");
                }
            }
            Err(e) => {
                tracing::warn!(file = %image_name, key = %key, "encode job admission failed: {e}");
            }
        }
    }
}
