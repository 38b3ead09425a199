pub const ULTRAFACE_MODEL_NAME: &str = "version-RFB-320.onnx";
pub const ULTRAFACE_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/ultraface/models/version-RFB-320.onnx";

/// Overlay stroke width in pixels at the reference display density.
pub const OVERLAY_STROKE_WIDTH: f32 = 4.0;

/// Overlay stroke color (RGB).
pub const OVERLAY_COLOR: [u8; 3] = [0, 255, 0];

pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;
pub const DEFAULT_CAPTURE_FPS: u32 = 30;

/// Frames to let the detector warm up before a snapshot is taken.
pub const SNAPSHOT_WARMUP_FRAMES: u64 = 30;
