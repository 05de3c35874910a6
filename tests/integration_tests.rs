//! Integration tests exercising the public API end-to-end.
//!
//! Everything here runs offline. The one test that talks to the real Gemini
//! API is `#[ignore]`d; run it manually with a valid `GEMINI_API_KEY`:
//!
//! ```text
//! cargo test --test integration_tests -- --ignored
//! ```

use imagen::executor::fix_extension;
use imagen::postprocess::remove_white_background;
use imagen::{
    dispatch, preset, resolver, BatchRun, ImageFormat, ImageSize, JobDescriptor, JobResult,
    NameRegistry,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn jobs(n: usize) -> Vec<JobDescriptor> {
    (0..n)
        .map(|i| JobDescriptor::new(format!("prompt {}", i), format!("out{}.jpg", i)))
        .collect()
}

#[test]
fn test_registry_avoids_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("home_aaaa.jpg"), b"taken").unwrap();

    let registry = NameRegistry::new();
    let requested = dir.path().join("home.jpg");

    let mut seen = HashSet::new();
    for _ in 0..50 {
        let path = registry.allocate(&requested).unwrap();
        assert_ne!(path, dir.path().join("home_aaaa.jpg"));
        assert!(!path.exists(), "allocated a path that already exists");
        assert!(seen.insert(path), "allocated the same path twice");
    }
}

#[tokio::test]
async fn test_concurrent_jobs_never_collide_on_names() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(NameRegistry::new());
    let requested = dir.path().join("screen.jpg");

    // Every job targets the same output name; each must land on its own file.
    let run = {
        let registry = Arc::clone(&registry);
        let requested = requested.clone();
        move |job: JobDescriptor| {
            let registry = Arc::clone(&registry);
            let requested = requested.clone();
            async move {
                let path = registry.allocate(&requested).unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
                std::fs::write(&path, job.prompt.as_bytes()).unwrap();
                JobResult::success(job, path, 5)
            }
        }
    };

    let results = dispatch(jobs(16), 4, run, |_, _, _| {}).await;
    assert_eq!(results.len(), 16);

    let paths: HashSet<PathBuf> = results
        .iter()
        .map(|r| r.resolved_path.clone().unwrap())
        .collect();
    assert_eq!(paths.len(), 16, "two jobs shared an output file");
    for path in &paths {
        assert!(path.exists());
    }
}

#[test]
fn test_batch_file_to_batch_run() {
    let dir = tempfile::tempdir().unwrap();
    let batch_path = dir.path().join("screens.json");
    std::fs::write(
        &batch_path,
        r#"{
            "preset": "mobile-ui",
            "size": "2K",
            "jobs": [
                {"prompt": "home screen", "output": "home.jpg"},
                {"prompt": "profile screen", "output": "profile.jpg", "input": "ref.png"}
            ]
        }"#,
    )
    .unwrap();

    let json = std::fs::read_to_string(&batch_path).unwrap();
    let jobs = resolver::resolve_batch_file(&json, None, None, ImageSize::Res1K).unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].size, ImageSize::Res2K);
    assert_eq!(jobs[0].presets, vec!["mobile-ui".to_string()]);
    assert_eq!(jobs[1].input_images, vec![PathBuf::from("ref.png")]);

    let run = BatchRun::new(jobs, 4).unwrap();
    assert_eq!(run.jobs().len(), 2);
}

#[test]
fn test_preset_file_shadows_builtin() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("creative.txt"),
        "Project style: muted pastel palette.\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("brand.txt"), "Brand: navy and gold.\n").unwrap();

    // Serialize against other tests touching the same variable.
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var(preset::PRESETS_DIR_ENV, dir.path());

    let text = preset::load_preset("creative").unwrap();
    assert_eq!(text, "Project style: muted pastel palette.");

    let combined =
        preset::load_presets(&["brand".to_string(), "creative".to_string()]).unwrap();
    assert!(combined.starts_with("# Preset: brand"));
    assert!(combined.contains("# Preset: creative"));

    let prompt = preset::compose_prompt(&combined, "login screen");
    assert!(prompt.ends_with("USER REQUEST:\nlogin screen"));

    std::env::remove_var(preset::PRESETS_DIR_ENV);
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn test_extension_follows_detected_format() {
    let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    let format = ImageFormat::from_magic_bytes(&png_magic).unwrap();
    let fixed = fix_extension(Path::new("shots/home.jpg"), format);
    assert_eq!(fixed, Path::new("shots/home.png"));

    // Unknown payloads default to JPEG downstream.
    assert_eq!(ImageFormat::from_magic_bytes(b"not an image"), None);
}

#[test]
fn test_white_background_removal_end_to_end() {
    use image::{Rgba, RgbaImage};

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("icon.jpg");

    let mut img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    for x in 2..6 {
        for y in 2..6 {
            img.put_pixel(x, y, Rgba([30, 30, 30, 255]));
        }
    }
    image::DynamicImage::ImageRgba8(img).to_rgb8().save(&input).unwrap();

    // The derived name is reserved like any other output.
    let registry = NameRegistry::new();
    let output = registry.reserve(&input.with_extension("png")).unwrap();
    remove_white_background(&input, &output).unwrap();
    assert_eq!(output, dir.path().join("icon.png"));

    let result = image::open(&output).unwrap().to_rgba8();
    assert_eq!(result.get_pixel(0, 0).0[3], 0, "background still opaque");
    assert_eq!(result.get_pixel(4, 4).0[3], 255, "foreground lost");
}

#[test]
fn test_derived_output_respects_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let taken = dir.path().join("icon_a3xz.png");
    std::fs::write(&taken, b"precious").unwrap();

    let registry = NameRegistry::new();
    let reserved = registry.reserve(&taken).unwrap();
    assert_ne!(reserved, taken, "derived output would overwrite a file");
    assert_eq!(std::fs::read(&taken).unwrap(), b"precious");
}

#[tokio::test]
#[ignore = "requires GEMINI_API_KEY and network access"]
async fn test_live_generation() {
    use imagen::{GeminiClient, ImagenConfig};

    let config = ImagenConfig::from_env().unwrap();
    let client = GeminiClient::new(config);

    let bytes = client
        .generate("a small red circle on a white background", &[], ImageSize::Px512)
        .await
        .unwrap();

    assert!(!bytes.is_empty());
    assert!(ImageFormat::from_magic_bytes(&bytes).is_some());
}
