use crate::error::{ImagenError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default Gemini model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";

/// Base URL for the Gemini generative language API.
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variable holding the API credential (required).
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model ID.
pub const MODEL_ENV: &str = "GEMINI_MODEL";

/// Environment variable overriding the output resolution bucket.
pub const SIZE_ENV: &str = "IMAGE_SIZE";

/// Requested output resolution bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageSize {
    /// 512px (fast, economical).
    Px512,
    /// 1K (default).
    #[default]
    Res1K,
    /// 2K (highest detail).
    Res2K,
}

impl ImageSize {
    /// Returns the wire value sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Px512 => "512",
            Self::Res1K => "1K",
            Self::Res2K => "2K",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = ImagenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "512" => Ok(Self::Px512),
            "1K" => Ok(Self::Res1K),
            "2K" => Ok(Self::Res2K),
            other => Err(ImagenError::Validation(format!(
                "invalid image size '{}' (expected 512, 1K or 2K)",
                other
            ))),
        }
    }
}

/// Configuration for the Gemini image client.
#[derive(Debug, Clone)]
pub struct ImagenConfig {
    /// API credential. Has no default; absence is fatal before any job runs.
    pub api_key: String,
    /// Model ID (e.g. "gemini-3-pro-image-preview").
    pub model: String,
    /// Default output resolution bucket.
    pub size: ImageSize,
    /// API base URL (overridable for tests).
    pub base_url: String,
    /// Per-request timeout (default: 120s).
    pub timeout: Duration,
}

impl ImagenConfig {
    /// Create a config with the given API key and documented defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            size: ImageSize::default(),
            base_url: API_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Load configuration from the environment.
    ///
    /// `GEMINI_API_KEY` is required. `GEMINI_MODEL` and `IMAGE_SIZE` are
    /// optional; an unrecognized `IMAGE_SIZE` logs a warning and falls back
    /// to the default rather than failing startup.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            ImagenError::Validation(format!(
                "{} environment variable not set (get a key at https://aistudio.google.com/)",
                API_KEY_ENV
            ))
        })?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.model = model;
        }
        if let Ok(size) = std::env::var(SIZE_ENV) {
            match size.parse() {
                Ok(size) => config.size = size,
                Err(_) => {
                    tracing::warn!(value = %size, "invalid {}, using {}", SIZE_ENV, config.size);
                }
            }
        }
        Ok(config)
    }

    /// Set the model ID.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the default resolution bucket.
    pub fn size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Set the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Encoded image format, detected from leading magic bytes.
///
/// The API is documented to always return JPEG; the sniff defends against
/// format changes and keeps output extensions honest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageFormat {
    /// Detects the format from the payload's leading bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    /// Returns the canonical file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// One requested image generation: prompt, options, destination.
///
/// Created once per requested image and consumed exactly once by the
/// executor; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// User prompt text (presets are resolved separately, ahead of it).
    pub prompt: String,
    /// Requested output path; the final path gets a unique suffix and may
    /// get a corrected extension.
    pub output: PathBuf,
    /// Reference images embedded into the request, in order.
    pub input_images: Vec<PathBuf>,
    /// Output resolution bucket.
    pub size: ImageSize,
    /// Preset names resolved and concatenated ahead of the prompt, in order.
    pub presets: Vec<String>,
}

impl JobDescriptor {
    pub fn new(prompt: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            output: output.into(),
            input_images: Vec::new(),
            size: ImageSize::default(),
            presets: Vec::new(),
        }
    }

    pub fn inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.input_images = inputs;
        self
    }

    pub fn size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn presets(mut self, presets: Vec<String>) -> Self {
        self.presets = presets;
        self
    }
}

/// Terminal status of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failure,
}

/// Outcome of one executed job, immutable once created.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub descriptor: JobDescriptor,
    pub status: JobStatus,
    /// Final on-disk path; present iff the job succeeded.
    pub resolved_path: Option<PathBuf>,
    /// Human-readable error; present iff the job failed.
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl JobResult {
    pub fn success(descriptor: JobDescriptor, resolved_path: PathBuf, duration_ms: u64) -> Self {
        Self {
            descriptor,
            status: JobStatus::Success,
            resolved_path: Some(resolved_path),
            error: None,
            duration_ms,
        }
    }

    pub fn failure(descriptor: JobDescriptor, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            descriptor,
            status: JobStatus::Failure,
            resolved_path: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// Aggregated outcome of a drained batch, in submission order.
#[derive(Debug)]
pub struct BatchReport {
    /// One result per submitted job, ordered as submitted.
    pub results: Vec<JobResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall-clock time for the whole batch.
    pub duration_ms: u64,
}

impl BatchReport {
    pub(crate) fn from_results(results: Vec<JobResult>, duration_ms: u64) -> Self {
        let succeeded = results.iter().filter(|r| r.succeeded()).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
            duration_ms,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Human-readable file size (e.g. "184.2 KB").
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}
