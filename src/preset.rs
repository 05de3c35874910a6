//! Reusable prompt presets.
//!
//! A preset is a named block of prompt text concatenated ahead of the user's
//! own prompt. Presets are plain `.txt` files looked up in project
//! directories first, then in `IMAGEN_PRESETS_DIR`, then among the built-ins
//! embedded in the crate.

use crate::error::{ImagenError, Result};
use std::path::PathBuf;

/// Environment variable pointing at an extra presets directory.
pub const PRESETS_DIR_ENV: &str = "IMAGEN_PRESETS_DIR";

/// Project-relative directories searched for presets, in priority order.
const PROJECT_PRESET_DIRS: &[&str] = &[
    "code/docs/presets",
    "docs/presets",
    "design/presets",
    "presets",
];

const CREATIVE_PRESET: &str = "\
Creative exploration mode. Produce a bold, visually striking concept rather \
than a literal rendering. Favor strong composition, confident color choices \
and a clear focal point. Avoid text and watermarks.";

const MOBILE_UI_PRESET: &str = "\
Mobile UI design mode. Render a single phone screen at realistic proportions \
with a consistent spacing grid, legible type hierarchy and platform-native \
controls. Flat export, no device frame, no hands, no background scene.";

/// Presets compiled into the binary; project files with the same name win.
const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("creative", CREATIVE_PRESET),
    ("mobile-ui", MOBILE_UI_PRESET),
];

/// Where a preset was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetSource {
    File(PathBuf),
    Builtin,
}

/// A discovered preset, for `--list` style output.
#[derive(Debug, Clone)]
pub struct PresetInfo {
    pub name: String,
    /// First line of the preset text.
    pub description: String,
    pub source: PresetSource,
}

/// Directories searched for preset files, in priority order.
pub fn preset_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for sub in PROJECT_PRESET_DIRS {
            let dir = cwd.join(sub);
            if dir.is_dir() {
                dirs.push(dir);
            }
        }
    }

    if let Ok(env_dir) = std::env::var(PRESETS_DIR_ENV) {
        let dir = PathBuf::from(env_dir);
        if dir.is_dir() {
            dirs.push(dir);
        }
    }

    dirs
}

/// Load one preset's text by name.
///
/// Accepts both `name` and `name.txt`. Fails with a validation error naming
/// the searched directories when the preset cannot be found.
pub fn load_preset(name: &str) -> Result<String> {
    let filename = if name.ends_with(".txt") {
        name.to_string()
    } else {
        format!("{}.txt", name)
    };

    for dir in preset_dirs() {
        let path = dir.join(&filename);
        if path.is_file() {
            return std::fs::read_to_string(&path)
                .map(|s| s.trim().to_string())
                .map_err(|e| {
                    ImagenError::Validation(format!("cannot read preset {}: {}", path.display(), e))
                });
        }
    }

    let bare = name.trim_end_matches(".txt");
    if let Some((_, text)) = BUILTIN_PRESETS.iter().find(|(n, _)| *n == bare) {
        return Ok(text.trim().to_string());
    }

    Err(ImagenError::Validation(format!(
        "preset '{}' not found (searched {:?} and built-ins; use --list to see available presets)",
        name,
        preset_dirs()
    )))
}

/// Load and combine multiple presets, preserving the given order.
///
/// Each block is prefixed with a `# Preset: name` header so the model sees
/// where one preset ends and the next begins. An empty list yields an empty
/// string.
pub fn load_presets(names: &[String]) -> Result<String> {
    let mut blocks = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let content = load_preset(name)?;
        blocks.push(format!("# Preset: {}\n{}", name, content));
    }
    Ok(blocks.join("\n\n"))
}

/// Split a comma-separated preset list into names, dropping blanks.
pub fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

/// Combine resolved preset text with the user prompt.
///
/// Preset text always comes first; later presets were already appended after
/// earlier ones by [`load_presets`].
pub fn compose_prompt(preset_content: &str, user_prompt: &str) -> String {
    if preset_content.is_empty() {
        return user_prompt.to_string();
    }
    format!(
        "{}\n\n---\n\nUSER REQUEST:\n{}",
        preset_content, user_prompt
    )
}

/// Enumerate every available preset, project files first, built-ins last.
///
/// A name is listed once; earlier sources shadow later ones.
pub fn list_presets() -> Vec<PresetInfo> {
    let mut seen = std::collections::HashSet::new();
    let mut infos = Vec::new();

    for dir in preset_dirs() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !seen.insert(name.to_string()) {
                continue;
            }
            let description = std::fs::read_to_string(&path)
                .ok()
                .and_then(|s| s.lines().next().map(|l| l.chars().take(60).collect()))
                .unwrap_or_default();
            infos.push(PresetInfo {
                name: name.to_string(),
                description,
                source: PresetSource::File(path.clone()),
            });
        }
    }

    for (name, text) in BUILTIN_PRESETS {
        if seen.insert((*name).to_string()) {
            infos.push(PresetInfo {
                name: (*name).to_string(),
                description: text.lines().next().unwrap_or("").chars().take(60).collect(),
                source: PresetSource::Builtin,
            });
        }
    }

    infos
}
