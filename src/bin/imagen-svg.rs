//! Vectorize an existing raster image to SVG.
//!
//! ```text
//! imagen-svg logo.png
//! imagen-svg icon.jpg icon.svg --mode binary --filter-speckle 8
//! ```

use clap::Parser;
use imagen::postprocess::{convert_to_svg, SvgColorMode, SvgOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "imagen-svg", version, about = "Convert a raster image to SVG")]
struct Cli {
    /// Raster image to vectorize (PNG, JPEG, GIF, WebP).
    input: PathBuf,

    /// Output path; defaults to the input with an .svg extension.
    output: Option<PathBuf>,

    /// Tracing mode.
    #[arg(long, value_enum, default_value_t = SvgColorMode::Color)]
    mode: SvgColorMode,

    /// Remove artifacts smaller than this many pixels.
    #[arg(long, default_value_t = 4)]
    filter_speckle: usize,

    /// Color quantization precision, 1-8.
    #[arg(long, default_value_t = 6)]
    color_precision: i32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagen=info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = SvgOptions {
        color_mode: cli.mode,
        filter_speckle: cli.filter_speckle,
        color_precision: cli.color_precision,
    };

    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("svg"));
    convert_to_svg(&cli.input, &output, &options)?;

    println!("Saved {}", output.display());
    Ok(())
}
