//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use vf_core::{Error, Result};

/// V1: initial schema.
///
/// `transcode` carries one row per (source file, profile key) pair. The
/// composite primary key is what makes job admission an idempotent
/// unique-key upsert: two racing admissions for the same pair converge on
/// one row instead of corrupting state.
///
/// `transcode_jobs` is the admission queue consumed by the external encode
/// worker. Rows stay 'queued' until the worker claims them; removal of a
/// derivative deletes only still-queued rows.
const V1_INITIAL: &str = r#"
CREATE TABLE transcode (
    transcode_image_name    TEXT NOT NULL,
    transcode_key           TEXT NOT NULL,
    transcode_time_addjob   TEXT,
    transcode_time_success  TEXT,
    transcode_time_error    TEXT,
    transcode_error         TEXT NOT NULL DEFAULT '',
    transcode_final_bitrate INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (transcode_image_name, transcode_key)
);

CREATE TABLE transcode_jobs (
    id            TEXT PRIMARY KEY,
    image_name    TEXT NOT NULL,
    transcode_key TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'queued',
    created_at    TEXT NOT NULL
);

CREATE INDEX idx_transcode_image_name ON transcode(transcode_image_name);
CREATE INDEX idx_transcode_jobs_image ON transcode_jobs(image_name);
CREATE INDEX idx_transcode_jobs_status ON transcode_jobs(status);
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        conn.execute_batch(&format!("BEGIN;\n{sql}\nCOMMIT;"))
            .map_err(|e| Error::database(format!("Migration v{version} failed: {e}")))?;

        conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}
