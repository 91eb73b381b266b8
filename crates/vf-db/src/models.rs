//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use uuid::Uuid;
use vf_core::TranscodeJobId;

/// One transcode state record, keyed by (source file name, profile key).
///
/// State invariants:
/// - "ready"   iff `time_success` is set;
/// - "pending" iff `time_addjob` is set and `time_success` is not;
/// - absence of a row means "never requested".
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRow {
    pub image_name: String,
    pub key: String,
    pub time_addjob: Option<String>,
    pub time_success: Option<String>,
    pub time_error: Option<String>,
    pub error: String,
    pub final_bitrate: i64,
}

impl TranscodeRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            image_name: row.get(0)?,
            key: row.get(1)?,
            time_addjob: row.get(2)?,
            time_success: row.get(3)?,
            time_error: row.get(4)?,
            error: row.get(5)?,
            final_bitrate: row.get(6)?,
        })
    }

    /// The encode completed successfully and the derivative is playable.
    pub fn is_ready(&self) -> bool {
        self.time_success.is_some()
    }

    /// A job was admitted and has not (yet) succeeded.
    pub fn is_pending(&self) -> bool {
        self.time_addjob.is_some() && self.time_success.is_none()
    }
}

/// One admitted encode job awaiting the external worker.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: TranscodeJobId,
    pub image_name: String,
    pub key: String,
    pub status: String,
    pub created_at: String,
}

impl JobRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let id: String = row.get(0)?;
        let id = Uuid::parse_str(&id)
            .map(TranscodeJobId::from)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?;
        Ok(Self {
            id,
            image_name: row.get(1)?,
            key: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(addjob: Option<&str>, success: Option<&str>) -> TranscodeRow {
        TranscodeRow {
            image_name: "A.ogv".into(),
            key: "480p.webm".into(),
            time_addjob: addjob.map(String::from),
            time_success: success.map(String::from),
            time_error: None,
            error: String::new(),
            final_bitrate: 0,
        }
    }

    #[test]
    fn ready_requires_success_timestamp() {
        assert!(!row(None, None).is_ready());
        assert!(!row(Some("t0"), None).is_ready());
        assert!(row(Some("t0"), Some("t1")).is_ready());
    }

    #[test]
    fn pending_is_addjob_without_success() {
        assert!(!row(None, None).is_pending());
        assert!(row(Some("t0"), None).is_pending());
        assert!(!row(Some("t0"), Some("t1")).is_pending());
    }
}
