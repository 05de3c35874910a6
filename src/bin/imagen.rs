//! Generate a single image from the command line.
//!
//! ```text
//! imagen "a sunset over the ocean" sunset.jpg
//! imagen --preset mobile-ui "home screen for a fitness app" home.jpg
//! imagen -i sketch.png "refine this into a polished logo" logo.png --svg
//! ```

use anyhow::Context;
use clap::Parser;
use imagen::executor::PostProcessing;
use imagen::postprocess::{SvgColorMode, SvgOptions};
use imagen::types::human_size;
use imagen::{preset, GeminiClient, ImagenConfig, ImageSize, JobDescriptor, NameRegistry};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "imagen", version, about = "Generate an image with Gemini")]
struct Cli {
    /// Prompt describing the image to generate.
    #[arg(required_unless_present = "list")]
    prompt: Option<String>,

    /// Output path for the generated image.
    #[arg(default_value = "./generated-image.jpg")]
    output: PathBuf,

    /// Comma-separated preset names prepended to the prompt.
    #[arg(short, long)]
    preset: Option<String>,

    /// Reference image embedded into the request (repeatable).
    #[arg(short, long = "input")]
    input: Vec<PathBuf>,

    /// Output resolution: 512, 1K or 2K.
    #[arg(short, long)]
    size: Option<ImageSize>,

    /// Model ID (overrides GEMINI_MODEL).
    #[arg(short, long)]
    model: Option<String>,

    /// Make white/near-white background transparent (writes a PNG).
    #[arg(long)]
    remove_white_bg: bool,

    /// Vectorize the result to SVG.
    #[arg(long)]
    svg: bool,

    /// SVG tracing mode.
    #[arg(long, value_enum, default_value_t = SvgColorMode::Color, requires = "svg")]
    svg_mode: SvgColorMode,

    /// Print the composed prompt (presets included) and exit without
    /// calling the API.
    #[arg(long)]
    show_prompt: bool,

    /// List available presets and exit.
    #[arg(short, long)]
    list: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagen=info".into()),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list {
        list_presets();
        return Ok(());
    }

    let preset_names = cli
        .preset
        .as_deref()
        .map(preset::split_names)
        .unwrap_or_default();

    let prompt = cli.prompt.context("a prompt is required")?;

    if cli.show_prompt {
        let preset_text = preset::load_presets(&preset_names)?;
        println!("{}", preset::compose_prompt(&preset_text, &prompt));
        return Ok(());
    }

    let mut config = ImagenConfig::from_env()?;
    if let Some(model) = cli.model {
        config = config.model(model);
    }
    if let Some(size) = cli.size {
        config = config.size(size);
    }

    let job = JobDescriptor::new(prompt, cli.output)
        .inputs(cli.input)
        .size(config.size)
        .presets(preset_names);

    let post = PostProcessing {
        remove_white_bg: cli.remove_white_bg,
        vectorize: cli.svg.then(|| SvgOptions {
            color_mode: cli.svg_mode,
            ..SvgOptions::default()
        }),
    };

    let client = GeminiClient::new(config);
    let registry = NameRegistry::new();
    let result = imagen::run_job(&client, &registry, &job, &post).await;

    match (result.resolved_path, result.error) {
        (Some(path), _) => {
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            println!(
                "Saved {} ({}, {:.1}s)",
                path.display(),
                human_size(size),
                result.duration_ms as f64 / 1000.0
            );
            Ok(())
        }
        (None, error) => anyhow::bail!("{}", error.unwrap_or_else(|| "unknown failure".into())),
    }
}

fn list_presets() {
    let infos = preset::list_presets();
    if infos.is_empty() {
        println!("No presets available.");
        return;
    }
    println!("Available presets:");
    for info in infos {
        let source = match info.source {
            preset::PresetSource::File(path) => path.display().to_string(),
            preset::PresetSource::Builtin => "built-in".to_string(),
        };
        println!("  {:<16} {}  [{}]", info.name, info.description, source);
    }
}
