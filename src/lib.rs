//! # imagen
//!
//! Google Gemini image generation toolkit with prompt presets and parallel
//! batch dispatch.
//!
//! ## Features
//!
//! - **Text-to-image and image-to-image** against the Gemini generation
//!   endpoint, with reference images embedded inline
//! - **Prompt presets**: named, reusable text blocks concatenated ahead of
//!   the user prompt, discovered in project directories or embedded built-ins
//! - **Parallel batches** under a bounded worker cap; one job's failure never
//!   aborts its siblings, and the final report is always in submission order
//! - **Collision-free output naming** (`home.jpg` → `home_a3xz.jpg`): never
//!   overwrites a pre-existing file, even across concurrent jobs
//! - **Magic-byte format sniffing** that corrects the output extension when
//!   the API returns a different format than requested
//! - **Optional post-processing**: white-background removal and SVG
//!   vectorization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagen::{BatchRun, GeminiClient, ImagenConfig, JobDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::new(ImagenConfig::from_env()?);
//!
//!     let jobs = vec![
//!         JobDescriptor::new("home screen", "home.jpg"),
//!         JobDescriptor::new("profile screen", "profile.jpg"),
//!     ];
//!
//!     let report = BatchRun::new(jobs, 4)?.execute(&client).await;
//!     println!("{} succeeded, {} failed", report.succeeded, report.failed);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod client;
pub mod error;
pub mod executor;
pub mod naming;
pub mod postprocess;
pub mod preset;
pub mod resolver;
pub mod types;

// Re-export main types at crate root
pub use batch::{dispatch, BatchRun, DEFAULT_MAX_WORKERS};
pub use client::{GeminiClient, InputImage};
pub use error::{ImagenError, Result};
pub use executor::{run_job, PostProcessing};
pub use naming::NameRegistry;
pub use postprocess::{SvgColorMode, SvgOptions};
pub use types::{
    BatchReport, ImageFormat, ImageSize, ImagenConfig, JobDescriptor, JobResult, JobStatus,
};
