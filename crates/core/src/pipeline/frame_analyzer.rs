use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::camera::domain::frame_pool::FrameLease;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::detection::Detection;

/// Feeds camera frames into a face detector and forwards results through a
/// callback.
///
/// Contract per frame:
/// - no image payload: the frame is released immediately, no detection, no
///   callback;
/// - detection success: the callback receives the detector's output list
///   unmodified, then the frame is released;
/// - detection failure: logged, no callback, frame released.
///
/// Release is exactly-once on every path because the lease is consumed by
/// `analyze` and dropped when it returns — after the detector is done with
/// the buffer, never before.
///
/// The detector lives behind a mutex so [`close`](FrameAnalyzer::close) can
/// race an in-flight detection safely: close blocks until the detection
/// finishes, and a completion observed after close is suppressed instead of
/// touching freed detector state.
pub struct FrameAnalyzer {
    detector: Mutex<Option<Box<dyn FaceDetector>>>,
    on_detections: Box<dyn Fn(Vec<Detection>) + Send + Sync>,
    closed: AtomicBool,
}

impl FrameAnalyzer {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        on_detections: impl Fn(Vec<Detection>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            detector: Mutex::new(Some(detector)),
            on_detections: Box::new(on_detections),
            closed: AtomicBool::new(false),
        }
    }

    /// Processes one frame. Consumes the lease; the frame is released when
    /// this returns, whatever the outcome.
    pub fn analyze(&self, lease: FrameLease) {
        let Some(frame) = lease.frame() else {
            return;
        };

        let result = {
            let mut guard = self.lock_detector();
            match guard.as_mut() {
                // Closed: nothing to run, the lease is still released.
                None => return,
                Some(detector) => detector.detect(frame),
            }
        };

        match result {
            Ok(detections) => {
                if !self.closed.load(Ordering::Acquire) {
                    (self.on_detections)(detections);
                }
            }
            Err(e) => log::warn!("face detection failed: {e}"),
        }
    }

    /// Releases the detector. Blocks until an in-flight detection completes;
    /// that detection's callback is suppressed. Idempotent; `analyze` after
    /// `close` only releases the frame.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        *self.lock_detector() = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock_detector(&self) -> MutexGuard<'_, Option<Box<dyn FaceDetector>>> {
        match self.detector.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
