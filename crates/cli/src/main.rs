use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use faceview_core::camera::domain::camera_source::CameraError;
use faceview_core::camera::domain::frame_pool::FramePool;
use faceview_core::camera::infrastructure::nokhwa_camera::NokhwaCamera;
use faceview_core::detection::domain::face_detector::DetectorOptions;
use faceview_core::detection::infrastructure::model_resolver;
use faceview_core::detection::infrastructure::onnx_ultraface_detector::{
    OnnxUltrafaceDetector, DEFAULT_CONFIDENCE,
};
use faceview_core::display::domain::frame_sink::{FrameSink, NullFrameSink};
use faceview_core::display::infrastructure::ffplay_sink::FfplaySink;
use faceview_core::display::infrastructure::image_file_writer::ImageFileWriter;
use faceview_core::overlay::detection_cell::DetectionCell;
use faceview_core::overlay::renderer::OverlayRenderer;
use faceview_core::pipeline::frame_analyzer::FrameAnalyzer;
use faceview_core::pipeline::live_preview_use_case::{LivePreviewUseCase, PreviewConfig};
use faceview_core::shared::constants::{
    DEFAULT_CAPTURE_FPS, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, ULTRAFACE_MODEL_NAME,
    ULTRAFACE_MODEL_URL,
};

/// Live camera preview with face detection overlay.
#[derive(Parser)]
#[command(name = "faceview")]
struct Cli {
    /// Camera device index.
    #[arg(long, default_value = "0")]
    camera: u32,

    /// Requested capture width.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_WIDTH)]
    width: u32,

    /// Requested capture height.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_HEIGHT)]
    height: u32,

    /// Requested capture frame rate.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_FPS)]
    fps: u32,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// Path to an UltraFace ONNX model (skips the cache/download resolver).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Save one annotated frame to this path and exit (no preview window).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Stop automatically after this many seconds.
    #[arg(long)]
    duration: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let model_path = resolve_model(&cli)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            cancelled.store(true, Ordering::Relaxed);
        })?;
    }

    loop {
        match run_preview(&cli, &model_path, cancelled.clone()) {
            Ok(()) => return Ok(()),
            Err(e) if is_camera_unavailable(e.as_ref()) => {
                if cancelled.load(Ordering::Relaxed) || !prompt_retry(e.as_ref())? {
                    return Ok(());
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn run_preview(
    cli: &Cli,
    model_path: &std::path::Path,
    cancelled: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let detector = OnnxUltrafaceDetector::new(
        model_path,
        DetectorOptions::default(),
        cli.confidence,
    )?;

    let detections = Arc::new(DetectionCell::new());
    let analyzer = {
        let cell = detections.clone();
        Arc::new(FrameAnalyzer::new(Box::new(detector), move |faces| {
            cell.store(faces)
        }))
    };

    let pool = FramePool::new();
    let camera = NokhwaCamera::new(cli.camera, cli.width, cli.height, cli.fps, pool);

    let sink: Box<dyn FrameSink> = if cli.snapshot.is_some() {
        Box::new(NullFrameSink)
    } else {
        Box::new(FfplaySink::new())
    };

    let use_case = LivePreviewUseCase::new(
        Box::new(camera),
        analyzer,
        detections,
        OverlayRenderer::new(),
        sink,
        Box::new(ImageFileWriter::new()),
    );

    let stats = use_case.execute(PreviewConfig {
        cancelled,
        run_for: cli.duration.map(Duration::from_secs),
        snapshot: cli.snapshot.clone(),
    })?;

    log::info!(
        "preview finished: {} frames shown, {} dropped, {} read errors",
        stats.frames_shown,
        stats.frames_dropped,
        stats.read_errors
    );
    Ok(())
}

fn resolve_model(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.model {
        if !path.exists() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
        return Ok(path.clone());
    }
    log::info!("Resolving model: {ULTRAFACE_MODEL_NAME}");
    let path = model_resolver::resolve(
        ULTRAFACE_MODEL_NAME,
        ULTRAFACE_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    Ok(path)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
    if downloaded >= total && total > 0 {
        eprintln!();
    }
}

/// Camera-unavailable handling: explain and offer an interactive retry, for
/// permission prompts the user may have dismissed or another app holding the
/// device.
fn prompt_retry(error: &dyn std::error::Error) -> Result<bool, Box<dyn std::error::Error>> {
    eprintln!("Camera unavailable: {error}");
    eprintln!("Check that a camera is connected, not in use by another application,");
    eprintln!("and that this program has permission to access it.");
    eprint!("Press Enter to retry, or 'q' then Enter to quit: ");

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(!line.trim().eq_ignore_ascii_case("q"))
}

fn is_camera_unavailable(error: &(dyn std::error::Error + 'static)) -> bool {
    matches!(
        error.downcast_ref::<CameraError>(),
        Some(CameraError::AccessDenied(_))
    )
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.width == 0 || cli.height == 0 {
        return Err("Capture width and height must be non-zero".into());
    }
    if cli.fps == 0 {
        return Err("Capture frame rate must be non-zero".into());
    }
    if let Some(0) = cli.duration {
        return Err("Duration must be at least 1 second".into());
    }
    Ok(())
}
