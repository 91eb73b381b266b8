//! Job-admission table operations.
//!
//! The engine only inserts 'queued' rows and deletes ones that are still
//! queued; claiming, progress, and completion belong to the external encode
//! worker.

use chrono::Utc;
use rusqlite::Connection;
use vf_core::{Error, Result, TranscodeJobId};

use crate::models::JobRow;

const COLS: &str = "id, image_name, transcode_key, status, created_at";

/// Submit an encode job for (file, key). Returns the new job id.
pub fn submit(conn: &Connection, image_name: &str, key: &str) -> Result<TranscodeJobId> {
    let id = TranscodeJobId::new();
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO transcode_jobs (id, image_name, transcode_key, status, created_at)
         VALUES (?1, ?2, ?3, 'queued', ?4)",
        rusqlite::params![id.to_string(), image_name, key, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(id)
}

/// Get a job by id.
pub fn get(conn: &Connection, id: TranscodeJobId) -> Result<Option<JobRow>> {
    let q = format!("SELECT {COLS} FROM transcode_jobs WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], JobRow::from_row);
    match result {
        Ok(j) => Ok(Some(j)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Delete still-queued jobs for a file; `key = None` targets every profile.
///
/// Jobs already claimed by a worker are left alone: the worker may still
/// write a state record after removal, a rare race resolved by the next
/// resolution re-admitting the job.
pub fn delete_pending(conn: &Connection, image_name: &str, key: Option<&str>) -> Result<usize> {
    let n = match key {
        Some(k) => conn.execute(
            "DELETE FROM transcode_jobs
             WHERE image_name = ?1 AND transcode_key = ?2 AND status = 'queued'",
            [image_name, k],
        ),
        None => conn.execute(
            "DELETE FROM transcode_jobs WHERE image_name = ?1 AND status = 'queued'",
            [image_name],
        ),
    }
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(n)
}

/// Count still-queued jobs for a file.
pub fn count_pending(conn: &Connection, image_name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM transcode_jobs WHERE image_name = ?1 AND status = 'queued'",
        [image_name],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}
