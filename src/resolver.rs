//! Batch input resolution.
//!
//! Turns either a JSON batch file or positional prompt/output pairs into an
//! ordered sequence of [`JobDescriptor`]s. Input order is preserved;
//! malformed input fails here, before anything is dispatched.

use crate::error::{ImagenError, Result};
use crate::preset;
use crate::types::{ImageSize, JobDescriptor};
use serde::Deserialize;
use std::path::PathBuf;

/// JSON batch file shape:
///
/// ```json
/// {
///     "preset": "mobile-ui,brand",
///     "size": "1K",
///     "jobs": [
///         {"prompt": "home screen", "output": "home.jpg"},
///         {"prompt": "profile screen", "output": "profile.jpg", "input": "reference.jpg"},
///         {"prompt": "logo", "output": "logo.png", "inputs": ["a.png", "b.png"], "preset": "creative"}
///     ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct BatchFile {
    #[serde(default)]
    preset: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    prompt: String,
    output: String,
    #[serde(default, alias = "inputs")]
    input: Option<OneOrMany>,
    /// Per-job preset override; replaces the shared preset for this job.
    #[serde(default)]
    preset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_paths(self) -> Vec<PathBuf> {
        match self {
            Self::One(path) => vec![PathBuf::from(path)],
            Self::Many(paths) => paths.into_iter().map(PathBuf::from).collect(),
        }
    }
}

/// Resolve a JSON batch file into job descriptors.
///
/// `override_preset` and `override_size` (typically CLI flags) beat the
/// file's shared values; `fallback_size` applies when neither is given.
/// A per-job `preset` entry beats the shared preset for that job only.
pub fn resolve_batch_file(
    json: &str,
    override_preset: Option<&str>,
    override_size: Option<ImageSize>,
    fallback_size: ImageSize,
) -> Result<Vec<JobDescriptor>> {
    let file: BatchFile = serde_json::from_str(json)
        .map_err(|e| ImagenError::Validation(format!("invalid batch file: {}", e)))?;

    if file.jobs.is_empty() {
        return Err(ImagenError::Validation(
            "batch file contains no jobs".to_string(),
        ));
    }

    let shared_preset = override_preset
        .map(str::to_string)
        .or(file.preset)
        .unwrap_or_default();

    let size = match override_size {
        Some(size) => size,
        None => match file.size {
            Some(text) => text.parse()?,
            None => fallback_size,
        },
    };

    file.jobs
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            if entry.prompt.trim().is_empty() {
                return Err(ImagenError::Validation(format!(
                    "job {} has an empty prompt",
                    i + 1
                )));
            }
            let presets = preset::split_names(entry.preset.as_deref().unwrap_or(&shared_preset));
            Ok(JobDescriptor::new(entry.prompt, entry.output)
                .inputs(entry.input.map(OneOrMany::into_paths).unwrap_or_default())
                .size(size)
                .presets(presets))
        })
        .collect()
}

/// Resolve positional `prompt output prompt output …` pairs, all sharing one
/// preset list and size.
pub fn resolve_pairs(
    args: &[String],
    preset_names: Option<&str>,
    size: ImageSize,
) -> Result<Vec<JobDescriptor>> {
    if args.is_empty() {
        return Err(ImagenError::Validation("no jobs to process".to_string()));
    }
    if args.len() % 2 != 0 {
        return Err(ImagenError::Validation(format!(
            "missing output path for prompt: {}",
            args[args.len() - 1]
        )));
    }

    let presets = preset_names.map(preset::split_names).unwrap_or_default();

    args.chunks(2)
        .map(|pair| {
            if pair[0].trim().is_empty() {
                return Err(ImagenError::Validation("empty prompt".to_string()));
            }
            Ok(JobDescriptor::new(pair[0].clone(), pair[1].clone())
                .size(size)
                .presets(presets.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_file_order_preserved() {
        let json = r#"{
            "preset": "mobile-ui",
            "jobs": [
                {"prompt": "home screen", "output": "home.jpg"},
                {"prompt": "profile screen", "output": "profile.jpg"},
                {"prompt": "settings screen", "output": "settings.jpg"}
            ]
        }"#;
        let jobs = resolve_batch_file(json, None, None, ImageSize::Res1K).unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].prompt, "home screen");
        assert_eq!(jobs[2].output, PathBuf::from("settings.jpg"));
        assert_eq!(jobs[1].presets, vec!["mobile-ui".to_string()]);
    }

    #[test]
    fn test_input_accepts_string_or_array() {
        let json = r#"{
            "jobs": [
                {"prompt": "a", "output": "a.jpg", "input": "ref.jpg"},
                {"prompt": "b", "output": "b.jpg", "inputs": ["x.png", "y.png"]}
            ]
        }"#;
        let jobs = resolve_batch_file(json, None, None, ImageSize::Res1K).unwrap();
        assert_eq!(jobs[0].input_images, vec![PathBuf::from("ref.jpg")]);
        assert_eq!(
            jobs[1].input_images,
            vec![PathBuf::from("x.png"), PathBuf::from("y.png")]
        );
    }

    #[test]
    fn test_cli_preset_overrides_file_preset() {
        let json = r#"{"preset": "creative", "jobs": [{"prompt": "a", "output": "a.jpg"}]}"#;
        let jobs = resolve_batch_file(json, Some("mobile-ui"), None, ImageSize::Res1K).unwrap();
        assert_eq!(jobs[0].presets, vec!["mobile-ui".to_string()]);
    }

    #[test]
    fn test_per_job_preset_beats_shared() {
        let json = r#"{
            "preset": "mobile-ui",
            "jobs": [
                {"prompt": "a", "output": "a.jpg"},
                {"prompt": "b", "output": "b.jpg", "preset": "creative"}
            ]
        }"#;
        let jobs = resolve_batch_file(json, None, None, ImageSize::Res1K).unwrap();
        assert_eq!(jobs[0].presets, vec!["mobile-ui".to_string()]);
        assert_eq!(jobs[1].presets, vec!["creative".to_string()]);
    }

    #[test]
    fn test_size_precedence() {
        let json = r#"{"size": "2K", "jobs": [{"prompt": "a", "output": "a.jpg"}]}"#;

        let jobs = resolve_batch_file(json, None, None, ImageSize::Res1K).unwrap();
        assert_eq!(jobs[0].size, ImageSize::Res2K);

        let jobs =
            resolve_batch_file(json, None, Some(ImageSize::Px512), ImageSize::Res1K).unwrap();
        assert_eq!(jobs[0].size, ImageSize::Px512);

        let no_size = r#"{"jobs": [{"prompt": "a", "output": "a.jpg"}]}"#;
        let jobs = resolve_batch_file(no_size, None, None, ImageSize::Res2K).unwrap();
        assert_eq!(jobs[0].size, ImageSize::Res2K);
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let json = r#"{"jobs": [{"prompt": "  ", "output": "a.jpg"}]}"#;
        let err = resolve_batch_file(json, None, None, ImageSize::Res1K).unwrap_err();
        assert!(matches!(err, ImagenError::Validation(_)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = resolve_batch_file("not json", None, None, ImageSize::Res1K).unwrap_err();
        assert!(matches!(err, ImagenError::Validation(_)));

        let err = resolve_batch_file(r#"{"jobs": []}"#, None, None, ImageSize::Res1K).unwrap_err();
        assert!(err.to_string().contains("no jobs"));
    }

    #[test]
    fn test_invalid_file_size_rejected() {
        let json = r#"{"size": "8K", "jobs": [{"prompt": "a", "output": "a.jpg"}]}"#;
        let err = resolve_batch_file(json, None, None, ImageSize::Res1K).unwrap_err();
        assert!(matches!(err, ImagenError::Validation(_)));
    }

    #[test]
    fn test_pairs_resolved_in_order() {
        let args: Vec<String> = ["home screen", "home.jpg", "profile", "profile.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let jobs = resolve_pairs(&args, Some("mobile-ui,creative"), ImageSize::Res1K).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].prompt, "home screen");
        assert_eq!(jobs[1].output, PathBuf::from("profile.jpg"));
        assert_eq!(jobs[0].presets, vec!["mobile-ui", "creative"]);
    }

    #[test]
    fn test_odd_pairs_rejected() {
        let args: Vec<String> = ["prompt only"].iter().map(|s| s.to_string()).collect();
        let err = resolve_pairs(&args, None, ImageSize::Res1K).unwrap_err();
        assert!(err.to_string().contains("missing output path"));
    }

    #[test]
    fn test_empty_pairs_rejected() {
        let err = resolve_pairs(&[], None, ImageSize::Res1K).unwrap_err();
        assert!(matches!(err, ImagenError::Validation(_)));
    }
}
