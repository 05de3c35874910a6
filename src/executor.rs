//! End-to-end execution of one generation job.

use crate::client::{GeminiClient, InputImage};
use crate::error::{ImagenError, Result};
use crate::naming::NameRegistry;
use crate::postprocess::{self, SvgOptions};
use crate::preset;
use crate::types::{ImageFormat, JobDescriptor, JobResult};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Optional stages applied after the raster is written, shared by every job
/// in a run.
#[derive(Debug, Clone, Default)]
pub struct PostProcessing {
    /// Luminosity-based white-background removal (writes a PNG).
    pub remove_white_bg: bool,
    /// Raster-to-SVG vectorization.
    pub vectorize: Option<SvgOptions>,
}

/// Execute one job end-to-end and report its outcome.
///
/// Never returns an error: every failure (remote, decode, naming, write,
/// post-processing) is captured into the returned [`JobResult`] so one job's
/// problem cannot abort its siblings. Post-processing failures leave the
/// already-written raster on disk.
pub async fn run_job(
    client: &GeminiClient,
    registry: &NameRegistry,
    job: &JobDescriptor,
    post: &PostProcessing,
) -> JobResult {
    let start = Instant::now();
    let outcome = execute(client, registry, job, post).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(path) => {
            tracing::debug!(path = %path.display(), duration_ms, "job succeeded");
            JobResult::success(job.clone(), path, duration_ms)
        }
        Err(e) => {
            tracing::debug!(output = %job.output.display(), error = %e, duration_ms, "job failed");
            JobResult::failure(job.clone(), e.to_string(), duration_ms)
        }
    }
}

async fn execute(
    client: &GeminiClient,
    registry: &NameRegistry,
    job: &JobDescriptor,
    post: &PostProcessing,
) -> Result<PathBuf> {
    let inputs = job
        .input_images
        .iter()
        .map(|p| InputImage::from_path(p))
        .collect::<Result<Vec<_>>>()?;

    let preset_text = preset::load_presets(&job.presets)?;
    let prompt = preset::compose_prompt(&preset_text, &job.prompt);

    let bytes = client.generate(&prompt, &inputs, job.size).await?;

    // The API is documented to always return JPEG; trust the bytes over the
    // requested extension anyway.
    let format = ImageFormat::from_magic_bytes(&bytes).unwrap_or(ImageFormat::Jpeg);
    let requested = fix_extension(&job.output, format);
    let path = registry.allocate(&requested)?;

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| ImagenError::Write {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }
    std::fs::write(&path, &bytes).map_err(|e| ImagenError::Write {
        path: path.clone(),
        message: e.to_string(),
    })?;

    // Derived stage outputs go through the registry too, so a stage never
    // overwrites a pre-existing file either.
    let mut final_path = path;
    if post.remove_white_bg {
        let target = if final_path.extension().and_then(|e| e.to_str()) == Some("png") {
            // Rewriting our own freshly written PNG in place.
            final_path.clone()
        } else {
            registry.reserve(&final_path.with_extension("png"))?
        };
        postprocess::remove_white_background(&final_path, &target)?;
        final_path = target;
    }
    if let Some(options) = &post.vectorize {
        let target = registry.reserve(&final_path.with_extension("svg"))?;
        postprocess::convert_to_svg(&final_path, &target, options)?;
        final_path = target;
    }
    Ok(final_path)
}

/// Correct the requested extension to match the detected format.
///
/// `.jpeg` and `.jpg` are treated as the same format, so a `.jpeg` request
/// that really is JPEG keeps its spelling. A missing or mismatched extension
/// is replaced with the detected one.
pub fn fix_extension(requested: &Path, detected: ImageFormat) -> PathBuf {
    let current = requested
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension);

    if current == Some(detected) {
        requested.to_path_buf()
    } else {
        requested.with_extension(detected.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_extension_keeps_matching() {
        let fixed = fix_extension(Path::new("out/home.jpg"), ImageFormat::Jpeg);
        assert_eq!(fixed, Path::new("out/home.jpg"));
    }

    #[test]
    fn test_fix_extension_keeps_jpeg_spelling() {
        let fixed = fix_extension(Path::new("home.jpeg"), ImageFormat::Jpeg);
        assert_eq!(fixed, Path::new("home.jpeg"));
    }

    #[test]
    fn test_fix_extension_corrects_mismatch() {
        let fixed = fix_extension(Path::new("out/home.jpg"), ImageFormat::Png);
        assert_eq!(fixed, Path::new("out/home.png"));
    }

    #[test]
    fn test_fix_extension_adds_missing() {
        let fixed = fix_extension(Path::new("home"), ImageFormat::Jpeg);
        assert_eq!(fixed, Path::new("home.jpg"));
    }
}
