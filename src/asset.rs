//! Source-asset collaborator.
//!
//! The engine never touches media bytes; everything it needs from the host
//! repository is behind [`FileAsset`]. [`VideoAsset`] is the plain owned
//! implementation used by hosting pipelines and tests.

/// What the engine needs to know about a source asset.
pub trait FileAsset: Send + Sync {
    /// Stable name identifying the asset (name + revision for historical
    /// files). Keys the transcode state table.
    fn name(&self) -> &str;

    /// URL of the original file.
    fn url(&self) -> &str;

    /// URL a derivative for `key` is (or will be) served from.
    ///
    /// Derivatives live next to the asset's thumbnails as
    /// `<dir>/<name>.<key>`.
    fn derivative_url(&self, key: &str) -> String;

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn duration_secs(&self) -> f64;

    /// Source container bitrate in bits per second, when known.
    fn bitrate(&self) -> Option<u64>;

    fn framerate(&self) -> Option<f64>;

    /// Container / metadata kind, as a lowercase file extension
    /// ("webm", "mp4", "ogv", ...).
    fn container(&self) -> &str;

    /// Audio-only assets get no derivative profiles.
    fn is_audio(&self) -> bool;

    /// Historical revision; derivatives are only kept for current files.
    fn is_old(&self) -> bool;

    /// Locally owned vs hosted on a foreign repository.
    fn is_local(&self) -> bool;
}

/// Owned [`FileAsset`] implementation.
#[derive(Debug, Clone)]
pub struct VideoAsset {
    name: String,
    url: String,
    derivative_base_url: String,
    width: u32,
    height: u32,
    duration_secs: f64,
    bitrate: Option<u64>,
    framerate: Option<f64>,
    container: String,
    audio_only: bool,
    historical: bool,
    local: bool,
}

impl VideoAsset {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        let name = name.into();
        let url = url.into();
        let derivative_base_url = match url.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        let container = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            name,
            url,
            derivative_base_url,
            width,
            height,
            duration_secs: 0.0,
            bitrate: None,
            framerate: None,
            container,
            audio_only: false,
            historical: false,
            local: true,
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_bitrate(mut self, bits_per_sec: u64) -> Self {
        self.bitrate = Some(bits_per_sec);
        self
    }

    pub fn with_framerate(mut self, fps: f64) -> Self {
        self.framerate = Some(fps);
        self
    }

    /// Override the directory derivatives are served from (defaults to the
    /// directory of the source URL).
    pub fn with_derivative_base_url(mut self, base: impl Into<String>) -> Self {
        self.derivative_base_url = base.into();
        self
    }

    pub fn audio_only(mut self) -> Self {
        self.audio_only = true;
        self
    }

    pub fn historical(mut self) -> Self {
        self.historical = true;
        self
    }

    pub fn foreign(mut self) -> Self {
        self.local = false;
        self
    }
}

impl FileAsset for VideoAsset {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn derivative_url(&self, key: &str) -> String {
        format!("{}/{}.{}", self.derivative_base_url, self.name, key)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn bitrate(&self) -> Option<u64> {
        self.bitrate
    }

    fn framerate(&self) -> Option<f64> {
        self.framerate
    }

    fn container(&self) -> &str {
        &self.container
    }

    fn is_audio(&self) -> bool {
        self.audio_only
    }

    fn is_old(&self) -> bool {
        self.historical
    }

    fn is_local(&self) -> bool {
        self.local
    }
}
