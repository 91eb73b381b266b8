//! Media-domain types shared across the engine: codec families and the
//! encode size bound ("maxSize") grammar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Playback codec family a derivative profile belongs to.
///
/// Browser codec support is family-level, not resolution-level, so source
/// coverage is evaluated per family: the resolver guarantees at least one
/// ready-or-pending derivative per enabled family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecFamily {
    /// Theora video in an Ogg container.
    Theora,
    /// VP8 video in a WebM container.
    Vp8,
    /// H.264 video in an MP4 container.
    H264,
}

impl CodecFamily {
    /// Family already satisfied by the *source* container itself, keyed by
    /// file extension.
    ///
    /// A `.webm` source counts as VP8 coverage and anything that is neither
    /// `.webm` nor `.mp4` is assumed to be an Ogg container and counts as
    /// Theora coverage. An `.mp4` source covers nothing: stock H.264 files
    /// are not assumed web-streamable as-is.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => None,
            "webm" => Some(CodecFamily::Vp8),
            _ => Some(CodecFamily::Theora),
        }
    }

    /// Human-facing label used in source titles ("Ogg 480p" etc.).
    pub fn label(&self) -> &'static str {
        match self {
            CodecFamily::Theora => "Ogg",
            CodecFamily::Vp8 => "WebM",
            CodecFamily::H264 => "H.264",
        }
    }
}

impl fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CodecFamily::Theora => "theora",
            CodecFamily::Vp8 => "vp8",
            CodecFamily::H264 => "h264",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CodecFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "theora" => Ok(CodecFamily::Theora),
            "vp8" => Ok(CodecFamily::Vp8),
            "h264" => Ok(CodecFamily::H264),
            other => Err(Error::config(format!("unknown codec family '{other}'"))),
        }
    }
}

/// Target size bound for a derivative profile.
///
/// Parsed from either `"WxH"` (explicit bound) or a bare `"N"` (square
/// bound, `N`x`N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaxSize {
    pub width: u32,
    pub height: u32,
}

impl MaxSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Aspect ratio of the bound (width over height).
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for MaxSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse_dim = |v: &str| -> Result<u32> {
            v.trim()
                .parse::<u32>()
                .map_err(|_| Error::config(format!("invalid maxSize '{s}'")))
        };
        match s.split_once('x') {
            Some((w, h)) => {
                let size = MaxSize::new(parse_dim(w)?, parse_dim(h)?);
                if size.width == 0 || size.height == 0 {
                    return Err(Error::config(format!("zero dimension in maxSize '{s}'")));
                }
                Ok(size)
            }
            None => {
                let edge = parse_dim(s)?;
                if edge == 0 {
                    return Err(Error::config(format!("zero dimension in maxSize '{s}'")));
                }
                Ok(MaxSize::new(edge, edge))
            }
        }
    }
}

impl TryFrom<String> for MaxSize {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<MaxSize> for String {
    fn from(m: MaxSize) -> String {
        m.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair() {
        let m: MaxSize = "854x480".parse().unwrap();
        assert_eq!((m.width, m.height), (854, 480));
    }

    #[test]
    fn parse_square_bound() {
        let m: MaxSize = "720".parse().unwrap();
        assert_eq!((m.width, m.height), (720, 720));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("abcxdef".parse::<MaxSize>().is_err());
        assert!("640x".parse::<MaxSize>().is_err());
        assert!("0x480".parse::<MaxSize>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let m: MaxSize = serde_json::from_str("\"1280x720\"").unwrap();
        assert_eq!(m, MaxSize::new(1280, 720));
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"1280x720\"");
    }

    #[test]
    fn family_from_extension() {
        assert_eq!(CodecFamily::from_extension("webm"), Some(CodecFamily::Vp8));
        assert_eq!(CodecFamily::from_extension("WEBM"), Some(CodecFamily::Vp8));
        assert_eq!(CodecFamily::from_extension("mp4"), None);
        assert_eq!(CodecFamily::from_extension("ogv"), Some(CodecFamily::Theora));
        assert_eq!(CodecFamily::from_extension("mov"), Some(CodecFamily::Theora));
    }
}
