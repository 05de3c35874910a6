//! Optional post-processing stages.
//!
//! Each stage is an independent transformation of an already-written image
//! file. A stage failure fails the job it belongs to, but the base raster is
//! never rolled back.

use crate::error::{ImagenError, Result};
use std::path::Path;

/// Luminance at or above which a pixel becomes fully transparent.
const FULL_TRANSPARENT_LUMA: f32 = 240.0;

/// Luminance at which alpha fading begins.
const FADE_START_LUMA: f32 = 200.0;

fn stage_err(stage: &str, message: impl ToString) -> ImagenError {
    ImagenError::PostProcess {
        stage: stage.to_string(),
        message: message.to_string(),
    }
}

/// Remove a white/near-white background by luminosity.
///
/// Bright pixels fade to transparent proportionally to their luminance, which
/// preserves sparkles and light foreground elements better than a hard key.
/// `output` must be a PNG path (the only carried format with an alpha
/// channel); the input raster is kept.
pub fn remove_white_background(input: &Path, output: &Path) -> Result<()> {
    const STAGE: &str = "remove-white-bg";

    let img = image::open(input).map_err(|e| stage_err(STAGE, e))?;
    let mut rgba = img.to_rgba8();

    for px in rgba.pixels_mut() {
        let [r, g, b, a] = px.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        if luma >= FULL_TRANSPARENT_LUMA {
            px.0[3] = 0;
        } else if luma >= FADE_START_LUMA {
            let keep = (FULL_TRANSPARENT_LUMA - luma) / (FULL_TRANSPARENT_LUMA - FADE_START_LUMA);
            px.0[3] = (a as f32 * keep).round() as u8;
        }
    }

    rgba.save(output).map_err(|e| stage_err(STAGE, e))?;
    Ok(())
}

/// SVG tracing color mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SvgColorMode {
    /// Full color tracing (default).
    #[default]
    Color,
    /// Black/white tracing, much faster for line art.
    Binary,
}

/// Knobs for raster-to-SVG vectorization.
#[derive(Debug, Clone)]
pub struct SvgOptions {
    pub color_mode: SvgColorMode,
    /// Remove artifacts smaller than this many pixels (higher = cleaner).
    pub filter_speckle: usize,
    /// Color quantization precision 1-8 (lower = fewer colors).
    pub color_precision: i32,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            color_mode: SvgColorMode::default(),
            filter_speckle: 4,
            color_precision: 6,
        }
    }
}

/// Vectorize a raster image to SVG with vtracer.
///
/// Works best on logos, icons and clean graphics rather than photographs.
/// The raster is kept as an intermediate.
pub fn convert_to_svg(input: &Path, output: &Path, options: &SvgOptions) -> Result<()> {
    const STAGE: &str = "svg";

    if !input.exists() {
        return Err(stage_err(
            STAGE,
            format!("input file not found: {}", input.display()),
        ));
    }

    let config = vtracer::Config {
        color_mode: match options.color_mode {
            SvgColorMode::Color => vtracer::ColorMode::Color,
            SvgColorMode::Binary => vtracer::ColorMode::Binary,
        },
        filter_speckle: options.filter_speckle,
        color_precision: options.color_precision,
        ..vtracer::Config::default()
    };

    vtracer::convert_image_to_svg(input, output, config).map_err(|e| stage_err(STAGE, e))?;
    Ok(())
}
