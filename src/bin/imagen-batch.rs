//! Generate many images in parallel.
//!
//! Accepts either a JSON batch file or positional prompt/output pairs:
//!
//! ```text
//! imagen-batch screens.json
//! imagen-batch -p mobile-ui "home screen" home.jpg "profile screen" profile.jpg
//! ```
//!
//! Exits non-zero when any job fails; the other jobs still run to completion.

use clap::Parser;
use imagen::types::human_size;
use imagen::{resolver, BatchRun, GeminiClient, ImagenConfig, ImageSize, JobResult};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "imagen-batch",
    version,
    about = "Generate a batch of images with Gemini"
)]
struct Cli {
    /// A JSON batch file, or alternating "prompt output" pairs.
    #[arg(required = true)]
    args: Vec<String>,

    /// Comma-separated preset names applied to every job (overrides the
    /// batch file's preset).
    #[arg(short, long)]
    preset: Option<String>,

    /// Maximum number of jobs in flight at once.
    #[arg(short, long, default_value_t = imagen::DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Output resolution: 512, 1K or 2K (overrides the batch file's size).
    #[arg(short, long)]
    size: Option<ImageSize>,

    /// Model ID (overrides GEMINI_MODEL).
    #[arg(short, long)]
    model: Option<String>,
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
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = ImagenConfig::from_env()?;
    if let Some(model) = cli.model {
        config = config.model(model);
    }

    let jobs = if cli.args.len() == 1 && cli.args[0].ends_with(".json") {
        let json = std::fs::read_to_string(&cli.args[0])
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", cli.args[0], e))?;
        resolver::resolve_batch_file(&json, cli.preset.as_deref(), cli.size, config.size)?
    } else {
        resolver::resolve_pairs(&cli.args, cli.preset.as_deref(), cli.size.unwrap_or(config.size))?
    };

    let total = jobs.len();
    println!(
        "Dispatching {} job{} across up to {} worker{}",
        total,
        if total == 1 { "" } else { "s" },
        cli.workers,
        if cli.workers == 1 { "" } else { "s" },
    );

    let client = GeminiClient::new(config);
    let report = BatchRun::new(jobs, cli.workers)?
        .execute_with_progress(&client, print_progress)
        .await;

    println!(
        "Batch complete: {} succeeded, {} failed ({:.1}s)",
        report.succeeded,
        report.failed,
        report.duration_ms as f64 / 1000.0
    );
    Ok(!report.has_failures())
}

fn print_progress(completed: usize, total: usize, result: &JobResult) {
    match (&result.resolved_path, &result.error) {
        (Some(path), _) => {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            println!(
                "[{}/{}] ✓ {} ({}, {:.1}s)",
                completed,
                total,
                path.display(),
                human_size(size),
                result.duration_ms as f64 / 1000.0
            );
        }
        (None, error) => {
            println!(
                "[{}/{}] ✗ {} - {}",
                completed,
                total,
                result.descriptor.output.display(),
                error.as_deref().unwrap_or("unknown failure")
            );
        }
    }
}
