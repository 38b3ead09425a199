use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::camera::domain::camera_source::CameraSource;
use crate::camera::domain::latest_frame_cell::LatestFrameCell;
use crate::display::domain::frame_sink::FrameSink;
use crate::display::domain::image_writer::ImageWriter;
use crate::overlay::detection_cell::DetectionCell;
use crate::overlay::infrastructure::frame_canvas::FrameCanvas;
use crate::overlay::renderer::OverlayRenderer;
use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::shared::constants::SNAPSHOT_WARMUP_FRAMES;
use crate::shared::frame::{Frame, Rotation};

/// Consecutive capture failures tolerated before the run is aborted.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 30;

/// Configuration for one preview run.
pub struct PreviewConfig {
    pub cancelled: Arc<AtomicBool>,
    /// Stop after this long; `None` runs until cancelled or the sink closes.
    pub run_for: Option<Duration>,
    /// Save one annotated frame here (after detector warm-up) and stop.
    pub snapshot: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub frames_shown: u64,
    /// Frames replaced in the analysis mailbox before being processed.
    pub frames_dropped: u64,
    pub read_errors: u64,
}

/// Runs the live preview: capture → keep-only-latest analysis → overlay →
/// display.
///
/// Layout: the caller's thread runs the capture/render loop; a dedicated
/// thread drains the [`LatestFrameCell`] into the [`FrameAnalyzer`]. The
/// only state they share is the frame mailbox and the detections snapshot.
pub struct LivePreviewUseCase {
    camera: Box<dyn CameraSource>,
    analyzer: Arc<FrameAnalyzer>,
    detections: Arc<DetectionCell>,
    renderer: OverlayRenderer,
    sink: Box<dyn FrameSink>,
    image_writer: Box<dyn ImageWriter>,
}

impl LivePreviewUseCase {
    pub fn new(
        camera: Box<dyn CameraSource>,
        analyzer: Arc<FrameAnalyzer>,
        detections: Arc<DetectionCell>,
        renderer: OverlayRenderer,
        sink: Box<dyn FrameSink>,
        image_writer: Box<dyn ImageWriter>,
    ) -> Self {
        Self {
            camera,
            analyzer,
            detections,
            renderer,
            sink,
            image_writer,
        }
    }

    /// Runs the preview until cancelled, expired, or the sink goes away.
    ///
    /// A camera open failure propagates so the shell can present its
    /// camera-unavailable state; capture hiccups mid-run are logged and
    /// tolerated up to a consecutive limit.
    pub fn execute(mut self, config: PreviewConfig) -> Result<PreviewStats, Box<dyn std::error::Error>> {
        let metadata = self.camera.open()?;
        self.sink.open(metadata.width, metadata.height, metadata.fps)?;

        let cell = Arc::new(LatestFrameCell::new());
        let analysis_handle = spawn_analysis(self.analyzer.clone(), cell.clone());

        let (mut stats, mut first_error) = self.run_capture_loop(&cell, &config);

        cell.shut_down();
        if analysis_handle.join().is_err() {
            set_if_none(&mut first_error, "Analysis thread panicked".into());
        }
        self.analyzer.close();
        self.camera.close();
        if let Err(e) = self.sink.close() {
            set_if_none(&mut first_error, e);
        }

        stats.frames_dropped = cell.dropped();
        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    #[allow(clippy::type_complexity)]
    fn run_capture_loop(
        &mut self,
        cell: &LatestFrameCell,
        config: &PreviewConfig,
    ) -> (PreviewStats, Option<Box<dyn std::error::Error>>) {
        let started = Instant::now();
        let mut stats = PreviewStats::default();
        let mut consecutive_errors: u32 = 0;

        loop {
            if config.cancelled.load(Ordering::Relaxed) {
                return (stats, None);
            }
            if let Some(limit) = config.run_for {
                if started.elapsed() >= limit {
                    return (stats, None);
                }
            }

            let lease = match self.camera.next_frame() {
                Ok(lease) => {
                    consecutive_errors = 0;
                    lease
                }
                Err(e) => {
                    stats.read_errors += 1;
                    consecutive_errors += 1;
                    log::warn!("camera read failed: {e}");
                    if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return (stats, Some("Camera stopped delivering frames".into()));
                    }
                    continue;
                }
            };

            // Copy for display before the lease moves to the analysis side.
            let display = lease.frame().map(|frame| self.annotate(frame));
            cell.put(lease);

            let Some(display) = display else {
                continue;
            };

            if let Err(e) = self.sink.write(&display) {
                log::info!("preview sink closed: {e}");
                return (stats, None);
            }
            stats.frames_shown += 1;

            if let Some(ref path) = config.snapshot {
                if stats.frames_shown >= SNAPSHOT_WARMUP_FRAMES {
                    let error = self.image_writer.write(path, &display).err();
                    if error.is_none() {
                        log::info!("snapshot saved to {}", path.display());
                    }
                    return (stats, error);
                }
            }
        }
    }

    /// Returns a display copy of `frame` with the current detections drawn
    /// as rectangles, scaled from upright source coordinates to the frame.
    fn annotate(&self, frame: &Frame) -> Frame {
        let mut display = Frame::new(
            frame.data().to_vec(),
            frame.width(),
            frame.height(),
            Rotation::Deg0,
        );
        let detections = self.detections.load();
        let source = (frame.upright_width(), frame.upright_height());
        let mut canvas = FrameCanvas::new(&mut display);
        self.renderer.render(&detections, source, &mut canvas);
        display
    }
}

fn spawn_analysis(
    analyzer: Arc<FrameAnalyzer>,
    cell: Arc<LatestFrameCell>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Some(lease) = cell.take_wait() {
            analyzer.analyze(lease);
        }
    })
}

fn set_if_none(slot: &mut Option<Box<dyn std::error::Error>>, err: Box<dyn std::error::Error>) {
    if slot.is_none() {
        *slot = Some(err);
    }
}
