//! Transcode state table operations.

use chrono::Utc;
use rusqlite::Connection;
use vf_core::{Error, Result};

use crate::models::TranscodeRow;

const COLS: &str = "transcode_image_name, transcode_key, transcode_time_addjob,
    transcode_time_success, transcode_time_error, transcode_error, transcode_final_bitrate";

/// Read all state records for one source file, capped at `limit` rows.
pub fn get_for_file(conn: &Connection, image_name: &str, limit: u32) -> Result<Vec<TranscodeRow>> {
    let q = format!("SELECT {COLS} FROM transcode WHERE transcode_image_name = ?1 LIMIT ?2");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params![image_name, limit], TranscodeRow::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Read a single state record.
pub fn get(conn: &Connection, image_name: &str, key: &str) -> Result<Option<TranscodeRow>> {
    let q = format!(
        "SELECT {COLS} FROM transcode WHERE transcode_image_name = ?1 AND transcode_key = ?2"
    );
    let result = conn.query_row(&q, [image_name, key], TranscodeRow::from_row);
    match result {
        Ok(r) => Ok(Some(r)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Record a job admission for (file, key).
///
/// Inserts a fresh pending record, or updates only the admission timestamp
/// when a row (stale, errored, or racing) already exists. The upsert on the
/// composite key keeps concurrent admissions idempotent with respect to the
/// persisted state.
pub fn upsert_addjob(conn: &Connection, image_name: &str, key: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO transcode
            (transcode_image_name, transcode_key, transcode_time_addjob,
             transcode_error, transcode_final_bitrate)
         VALUES (?1, ?2, ?3, '', 0)
         ON CONFLICT (transcode_image_name, transcode_key)
         DO UPDATE SET transcode_time_addjob = excluded.transcode_time_addjob",
        rusqlite::params![image_name, key, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Worker write-back: mark an encode as completed with its measured bitrate.
pub fn record_success(
    conn: &Connection,
    image_name: &str,
    key: &str,
    final_bitrate: i64,
) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let n = conn
        .execute(
            "UPDATE transcode
             SET transcode_time_success = ?1, transcode_final_bitrate = ?2, transcode_error = ''
             WHERE transcode_image_name = ?3 AND transcode_key = ?4",
            rusqlite::params![now, final_bitrate, image_name, key],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Worker write-back: mark an encode as failed.
pub fn record_error(conn: &Connection, image_name: &str, key: &str, error: &str) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let n = conn
        .execute(
            "UPDATE transcode SET transcode_time_error = ?1, transcode_error = ?2
             WHERE transcode_image_name = ?3 AND transcode_key = ?4",
            rusqlite::params![now, error, image_name, key],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete state records for a file; `key = None` deletes all of them.
/// Returns the number of rows removed.
pub fn delete(conn: &Connection, image_name: &str, key: Option<&str>) -> Result<usize> {
    let n = match key {
        Some(k) => conn.execute(
            "DELETE FROM transcode WHERE transcode_image_name = ?1 AND transcode_key = ?2",
            [image_name, k],
        ),
        None => conn.execute(
            "DELETE FROM transcode WHERE transcode_image_name = ?1",
            [image_name],
        ),
    }
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn upsert_creates_pending_record() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();
        let row = get(&conn, "A.ogv", "480p.webm").unwrap().unwrap();
        assert!(row.is_pending());
        assert!(!row.is_ready());
        assert_eq!(row.error, "");
        assert_eq!(row.final_bitrate, 0);
    }

    #[test]
    fn upsert_is_idempotent_under_admission_race() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();
        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();

        let rows = get_for_file(&conn, "A.ogv", 100).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_pending());
    }

    #[test]
    fn upsert_on_errored_record_refreshes_addjob_only() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();
        record_error(&conn, "A.ogv", "480p.webm", "encoder crashed").unwrap();

        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();
        let row = get(&conn, "A.ogv", "480p.webm").unwrap().unwrap();
        assert!(row.time_addjob.is_some());
        // Error bookkeeping is left for the worker to overwrite.
        assert_eq!(row.error, "encoder crashed");
    }

    #[test]
    fn success_write_back_makes_row_ready() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();
        assert!(record_success(&conn, "A.ogv", "480p.webm", 987_000).unwrap());

        let row = get(&conn, "A.ogv", "480p.webm").unwrap().unwrap();
        assert!(row.is_ready());
        assert!(!row.is_pending());
        assert_eq!(row.final_bitrate, 987_000);
    }

    #[test]
    fn delete_scopes_to_key() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_addjob(&conn, "A.ogv", "480p.webm").unwrap();
        upsert_addjob(&conn, "A.ogv", "480p.ogv").unwrap();
        upsert_addjob(&conn, "B.ogv", "480p.webm").unwrap();

        assert_eq!(delete(&conn, "A.ogv", Some("480p.webm")).unwrap(), 1);
        assert_eq!(get_for_file(&conn, "A.ogv", 100).unwrap().len(), 1);

        assert_eq!(delete(&conn, "A.ogv", None).unwrap(), 1);
        assert_eq!(get_for_file(&conn, "B.ogv", 100).unwrap().len(), 1);
    }

    #[test]
    fn read_respects_limit_cap() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        for i in 0..5 {
            upsert_addjob(&conn, "A.ogv", &format!("{i}p.webm")).unwrap();
        }
        assert_eq!(get_for_file(&conn, "A.ogv", 3).unwrap().len(), 3);
    }
}
