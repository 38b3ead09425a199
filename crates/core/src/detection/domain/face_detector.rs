use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Speed/quality trade-off fixed at detector construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceMode {
    Fast,
    Accurate,
}

/// Detector configuration, chosen once at construction.
///
/// The preview only needs bounding boxes, so the default is the fast mode
/// with landmarks and classification disabled.
#[derive(Clone, Copy, Debug)]
pub struct DetectorOptions {
    pub performance: PerformanceMode,
    pub landmarks: bool,
    pub classification: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            performance: PerformanceMode::Fast,
            landmarks: false,
            classification: false,
        }
    }
}

/// Domain interface for face detection.
///
/// Returns detections in the detector's own order; callers must not re-sort
/// the list and must not assume any ordering across frames. Implementations
/// may be stateful, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
