//! Derivative profile catalog.
//!
//! A read-only registry mapping a profile key (which doubles as the
//! derivative's file suffix, e.g. `480p.webm`) to its encode parameters.
//! The catalog is configuration-supplied at process start; `builtin()`
//! provides the stock profile set. Referencing a key the catalog does not
//! know is a configuration error, not something the engine defends
//! against.

use serde::{Deserialize, Serialize};

use vf_core::{CodecFamily, EngineConfig, Error, MaxSize, Result};

use crate::asset::FileAsset;

/// Encode parameters for one derivative profile. Immutable catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativeProfile {
    /// Unique key, appended to the derivative file name.
    pub key: String,
    pub codec: CodecFamily,
    pub container: String,
    pub max_size: MaxSize,
    /// Target video bitrate in kbit/s. Quality-driven profiles omit it.
    #[serde(default)]
    pub video_bitrate: Option<u32>,
    /// Target audio bitrate in kbit/s.
    #[serde(default)]
    pub audio_bitrate: Option<u32>,
    /// Fixed output framerate; falls back to the source framerate.
    #[serde(default)]
    pub framerate: Option<f64>,
    /// Encoder quality level for quality-driven profiles.
    #[serde(default)]
    pub video_quality: Option<u32>,
    #[serde(default)]
    pub audio_quality: Option<i32>,
    #[serde(default)]
    pub samplerate: Option<u32>,
    #[serde(default)]
    pub channels: Option<u8>,
    #[serde(default)]
    pub no_upscaling: bool,
    #[serde(default)]
    pub two_pass: bool,
    #[serde(default)]
    pub keyframe_interval: Option<u32>,
}

/// Ordered, read-only registry of derivative profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativeCatalog {
    profiles: Vec<DerivativeProfile>,
}

impl DerivativeCatalog {
    /// Catalog from an explicit profile list (configuration-supplied).
    pub fn new(profiles: Vec<DerivativeProfile>) -> Self {
        Self { profiles }
    }

    /// Deserialize a catalog from JSON.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("catalog parse error: {e}")))
    }

    /// The stock profile set: four Ogg/Theora rungs, four WebM/VP8 rungs,
    /// and three MP4/H.264 rungs.
    pub fn builtin() -> Self {
        let theora = |key: &str, max: &str, vbr: Option<u32>, vq: Option<u32>, aq: i32| {
            DerivativeProfile {
                key: key.into(),
                codec: CodecFamily::Theora,
                container: "ogv".into(),
                max_size: max.parse().expect("builtin maxSize"),
                video_bitrate: vbr,
                audio_bitrate: None,
                framerate: None,
                video_quality: vq,
                audio_quality: Some(aq),
                samplerate: Some(44_100),
                channels: Some(2),
                no_upscaling: true,
                two_pass: false,
                keyframe_interval: Some(128),
            }
        };
        let vp8 = |key: &str, max: &str, vbr: Option<u32>, vq: Option<u32>, aq: i32, two_pass: bool| {
            DerivativeProfile {
                key: key.into(),
                codec: CodecFamily::Vp8,
                container: "webm".into(),
                max_size: max.parse().expect("builtin maxSize"),
                video_bitrate: vbr,
                audio_bitrate: None,
                framerate: None,
                video_quality: vq,
                audio_quality: Some(aq),
                samplerate: Some(44_100),
                channels: Some(2),
                no_upscaling: true,
                two_pass,
                keyframe_interval: Some(128),
            }
        };
        let h264 = |key: &str, max: &str, vbr: u32, abr: u32| DerivativeProfile {
            key: key.into(),
            codec: CodecFamily::H264,
            container: "mp4".into(),
            max_size: max.parse().expect("builtin maxSize"),
            video_bitrate: Some(vbr),
            audio_bitrate: Some(abr),
            framerate: None,
            video_quality: None,
            audio_quality: None,
            samplerate: None,
            channels: Some(2),
            no_upscaling: false,
            two_pass: false,
            keyframe_interval: None,
        };

        let mut low_ogv = theora("160p.ogv", "288x160", Some(160), None, -1);
        low_ogv.framerate = Some(15.0);

        Self::new(vec![
            low_ogv,
            theora("360p.ogv", "640x360", Some(512), None, 1),
            theora("480p.ogv", "854x480", Some(1024), None, 2),
            theora("720p.ogv", "1280x720", None, Some(6), 3),
            vp8("160p.webm", "288x160", Some(256), None, -1, true),
            vp8("360p.webm", "640x360", Some(512), None, 1, true),
            vp8("480p.webm", "854x480", Some(1024), None, 2, true),
            vp8("720p.webm", "1280x720", None, Some(7), 3, false),
            h264("320p.mp4", "480x320", 400, 40),
            h264("480p.mp4", "640x480", 1200, 64),
            h264("720p.mp4", "1280x720", 2500, 128),
        ])
    }

    /// Look up a profile; unknown keys are a configuration error.
    pub fn profile(&self, key: &str) -> Result<&DerivativeProfile> {
        self.profiles
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| Error::config(format!("no catalog entry for transcode key '{key}'")))
    }

    /// All profiles in catalog order.
    pub fn profiles(&self) -> &[DerivativeProfile] {
        &self.profiles
    }

    /// Check every enabled key against the catalog.
    pub fn validate_enabled(&self, config: &EngineConfig) -> Result<()> {
        for key in &config.enabled_transcodes {
            self.profile(key)?;
        }
        Ok(())
    }

    /// Largest bound among enabled constant-bitrate profiles, by pixel
    /// area. Quality-driven profiles (no video bitrate) do not qualify.
    pub fn max_web_stream_size(&self, enabled: &[String]) -> Option<MaxSize> {
        enabled
            .iter()
            .filter_map(|key| self.profiles.iter().find(|p| &p.key == key))
            .filter(|p| p.video_bitrate.is_some())
            .map(|p| p.max_size)
            .max_by_key(|m| u64::from(m.width) * u64::from(m.height))
    }

    /// Rough projected derivative size in bytes.
    ///
    /// Uses the profile's combined target bitrate when both components are
    /// constant, otherwise falls back to the source bitrate. Not accurate
    /// for variable-bitrate codecs.
    pub fn projected_file_size(&self, asset: &dyn FileAsset, key: &str) -> Result<Option<u64>> {
        let profile = self.profile(key)?;
        let duration = asset.duration_secs();
        if duration <= 0.0 {
            return Ok(None);
        }
        if let (Some(vbr), Some(abr)) = (profile.video_bitrate, profile.audio_bitrate) {
            let bits = duration * f64::from(vbr + abr) * 1000.0;
            return Ok(Some((bits / 8.0) as u64));
        }
        Ok(asset
            .bitrate()
            .map(|bps| (duration * bps as f64 / 8.0) as u64))
    }
}

impl Default for DerivativeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
