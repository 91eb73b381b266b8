//! Source descriptors: one per exposed variant, suitable for `<source>`
//! tag output or API responses.

use serde::{Deserialize, Serialize};

use vf_db::models::TranscodeRow;

use crate::asset::FileAsset;
use crate::catalog::DerivativeProfile;
use crate::geometry;

/// Per-resolution options supplied by the hosting pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Expand relative `src` values against the configured base URL.
    pub full_url: bool,
    /// Suppress the `data-` prefix on adaptive-streaming attributes;
    /// useful when the output is not HTML.
    pub no_data: bool,
}

/// One exposed variant. The primary/original source has no
/// `transcodekey`; derivative entries carry theirs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub src: String,
    pub title: String,
    pub shorttitle: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framerate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcodekey: Option<String>,
}

impl SourceDescriptor {
    /// Descriptor for the primary/original source asset.
    pub fn primary(asset: &dyn FileAsset, opts: &ResolveOptions, base_url: Option<&str>) -> Self {
        let bandwidth = asset.bitrate();
        let title = match bandwidth {
            Some(b) => format!(
                "Original {} file, {} × {} ({})",
                asset.container(),
                asset.width(),
                asset.height(),
                format_bitrate(b)
            ),
            None => format!(
                "Original {} file, {} × {}",
                asset.container(),
                asset.width(),
                asset.height()
            ),
        };

        Self {
            src: expand_url(asset.url(), opts, base_url),
            title,
            shorttitle: format!("Original {}", asset.container()),
            width: asset.width(),
            height: asset.height(),
            bandwidth,
            // Audio has no framerate to report.
            framerate: if asset.is_audio() { None } else { asset.framerate() },
            transcodekey: None,
        }
    }

    /// Descriptor for a ready derivative.
    ///
    /// Dimensions come from the geometry transform of the profile bound,
    /// bandwidth from the bitrate the worker measured, framerate from the
    /// profile override or the source.
    pub fn derivative(
        asset: &dyn FileAsset,
        profile: &DerivativeProfile,
        row: &TranscodeRow,
        opts: &ResolveOptions,
        base_url: Option<&str>,
    ) -> Self {
        let (width, height) =
            geometry::target_dimensions(asset.width(), asset.height(), &profile.max_size);
        let stem = profile.key.split('.').next().unwrap_or(&profile.key);

        Self {
            src: expand_url(&asset.derivative_url(&profile.key), opts, base_url),
            title: format!(
                "Web streamable {}, {} × {}",
                profile.codec.label(),
                width,
                height
            ),
            shorttitle: format!("{} {}", profile.codec.label(), stem),
            width,
            height,
            bandwidth: Some(row.final_bitrate.max(0) as u64),
            framerate: profile.framerate.or_else(|| asset.framerate()),
            transcodekey: Some(profile.key.clone()),
        }
    }

    /// Render the attribute view used for `<source>` tags.
    ///
    /// The adaptive-streaming fields (width, height, bandwidth, framerate)
    /// are prefixed with `data-` unless suppressed.
    pub fn attributes(&self, no_data: bool) -> Vec<(String, String)> {
        let prefix = if no_data { "" } else { "data-" };
        let mut attrs = vec![
            ("src".to_string(), self.src.clone()),
            ("title".to_string(), self.title.clone()),
            (format!("{prefix}shorttitle"), self.shorttitle.clone()),
            (format!("{prefix}width"), self.width.to_string()),
            (format!("{prefix}height"), self.height.to_string()),
        ];
        if let Some(b) = self.bandwidth {
            attrs.push((format!("{prefix}bandwidth"), b.to_string()));
        }
        if let Some(f) = self.framerate {
            attrs.push((format!("{prefix}framerate"), f.to_string()));
        }
        if let Some(ref key) = self.transcodekey {
            attrs.push((format!("{prefix}transcodekey"), key.clone()));
        }
        attrs
    }
}

fn expand_url(src: &str, opts: &ResolveOptions, base_url: Option<&str>) -> String {
    match (opts.full_url, base_url) {
        (true, Some(base)) if src.starts_with('/') => format!("{base}{src}"),
        _ => src.to_string(),
    }
}

/// Human-readable bitrate, to one decimal place.
pub fn format_bitrate(bits_per_sec: u64) -> String {
    const KBPS: f64 = 1_000.0;
    const MBPS: f64 = 1_000_000.0;
    let b = bits_per_sec as f64;
    if b >= MBPS {
        format!("{:.1} Mbps", b / MBPS)
    } else if b >= KBPS {
        format!("{:.1} kbps", b / KBPS)
    } else {
        format!("{bits_per_sec} bps")
    }
}
