//! Engine configuration.
//!
//! [`EngineConfig`] is deserialized from JSON and injected into the
//! resolver at construction; there are no ambient globals. Every field
//! defaults sensibly so an empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Engine configuration for derivative resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Global transcode kill switch. When false the resolver returns only
    /// the primary source and never touches state or the job queue.
    pub enable_transcode: bool,

    /// Ordered list of enabled profile keys. Order is load-bearing: the
    /// coverage pass picks the *first* enabled profile of each uncovered
    /// codec family.
    pub enabled_transcodes: Vec<String>,

    /// Legacy coverage behavior: when true, the coverage pass attempts the
    /// first profile of an uncovered family even if the profile's bound is
    /// larger than the source, which can admit an upscaling encode. When
    /// false, oversized profiles are skipped in the coverage pass too and
    /// an uncovered family may stay uncovered.
    pub force_coverage_ignoring_upscale: bool,

    /// Server base URL prepended to relative `src` values when resolving
    /// with the full-URL option.
    pub base_url: Option<String>,

    /// Cap on rows read per file from the transcode state table. A
    /// defensive bound, not a pagination mechanism.
    pub state_read_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_transcode: true,
            enabled_transcodes: vec![
                "360p.ogv".into(),
                "480p.ogv".into(),
                "360p.webm".into(),
                "480p.webm".into(),
                "480p.mp4".into(),
                "720p.mp4".into(),
            ],
            force_coverage_ignoring_upscale: true,
            base_url: None,
            state_read_limit: 100,
        }
    }
}

impl EngineConfig {
    /// Deserialize an `EngineConfig` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    ///
    /// Enabled keys are checked against the catalog separately; a key with
    /// no catalog entry is a hard configuration error at resolution time,
    /// not a warning.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.enable_transcode && self.enabled_transcodes.is_empty() {
            warnings.push("transcoding is enabled but enabled_transcodes is empty".into());
        }

        let mut seen = std::collections::HashSet::new();
        for key in &self.enabled_transcodes {
            if !seen.insert(key) {
                warnings.push(format!("enabled_transcodes lists '{key}' more than once"));
            }
        }

        if let Some(ref base) = self.base_url {
            if base.ends_with('/') {
                warnings.push("base_url has a trailing slash; src values already start with one".into());
            }
        }

        if self.state_read_limit == 0 {
            warnings.push("state_read_limit is 0; every state read will come back empty".into());
        }

        warnings
    }
}
