use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::{nokhwa_initialize, Camera};

use crate::camera::domain::camera_source::{CameraError, CameraMetadata, CameraSource};
use crate::camera::domain::frame_pool::{FrameLease, FramePool};
use crate::shared::frame::{Frame, Rotation};

/// Camera adapter over the `nokhwa` crate.
///
/// Requests an RGB stream at the configured format and fills leases from a
/// shared [`FramePool`] so capture buffers are recycled. Frames are delivered
/// upright by the platform backends nokhwa wraps, so rotation is `Deg0`
/// unless overridden via [`with_rotation`](NokhwaCamera::with_rotation).
pub struct NokhwaCamera {
    index: u32,
    width: u32,
    height: u32,
    fps: u32,
    rotation: Rotation,
    pool: FramePool,
    camera: Option<Camera>,
}

impl NokhwaCamera {
    pub fn new(index: u32, width: u32, height: u32, fps: u32, pool: FramePool) -> Self {
        Self {
            index,
            width,
            height,
            fps,
            rotation: Rotation::Deg0,
            pool,
            camera: None,
        }
    }

    /// Overrides the rotation metadata attached to captured frames, for
    /// devices mounted sideways or upside down.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

impl CameraSource for NokhwaCamera {
    fn open(&mut self) -> Result<CameraMetadata, CameraError> {
        // No-op outside macOS; on macOS this triggers the AVFoundation
        // authorization prompt.
        nokhwa_initialize(|granted| {
            log::debug!("camera authorization granted: {granted}");
        });

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(self.width, self.height),
                FrameFormat::MJPEG,
                self.fps,
            ),
        ));
        let mut camera = Camera::new(CameraIndex::Index(self.index), format)
            .map_err(|e| CameraError::AccessDenied(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::AccessDenied(e.to_string()))?;

        let resolution = camera.resolution();
        let fps = camera.frame_rate();
        log::info!(
            "camera {} open: {}x{} @ {fps} fps",
            self.index,
            resolution.width(),
            resolution.height()
        );
        self.camera = Some(camera);
        Ok(CameraMetadata {
            width: resolution.width(),
            height: resolution.height(),
            fps,
        })
    }

    fn next_frame(&mut self) -> Result<FrameLease, CameraError> {
        let camera = self.camera.as_mut().ok_or(CameraError::NotOpen)?;
        let buffer = camera
            .frame()
            .map_err(|e| CameraError::Capture(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Capture(e.to_string()))?;
        let (width, height) = decoded.dimensions();

        let mut data = self.pool.take_buffer();
        data.clear();
        data.extend_from_slice(decoded.as_raw());
        Ok(self
            .pool
            .lease(Frame::new(data, width, height, self.rotation)))
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::debug!("stopping camera stream: {e}");
            }
        }
    }
}
