use thiserror::Error;

use super::frame_pool::FrameLease;

#[derive(Error, Debug)]
pub enum CameraError {
    /// The device could not be opened: missing, busy, or access denied by
    /// the platform. The UI shell treats this as the permission-denied state.
    #[error("camera unavailable or access denied: {0}")]
    AccessDenied(String),
    #[error("camera capture failed: {0}")]
    Capture(String),
    #[error("camera is not open")]
    NotOpen,
}

/// Preview stream properties as negotiated with the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Supplies camera frames.
///
/// Implementations handle device access and pixel-format conversion; the
/// pipeline works with [`FrameLease`]s so every frame is released back to
/// the pool exactly once, no matter which stage drops it.
pub trait CameraSource: Send {
    /// Opens the device and starts the stream.
    fn open(&mut self) -> Result<CameraMetadata, CameraError>;

    /// Blocks for the next frame.
    fn next_frame(&mut self) -> Result<FrameLease, CameraError>;

    /// Stops the stream and releases the device.
    fn close(&mut self);
}
