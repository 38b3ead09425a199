use crate::overlay::renderer::{OverlaySurface, ScaledRect};
use crate::shared::frame::{Frame, FRAME_CHANNELS};

/// Overlay surface that strokes rectangles directly into an RGB frame
/// buffer.
///
/// The renderer itself never clips; this surface clamps pixel writes to the
/// buffer bounds, so rectangles partially off-frame draw their visible part.
pub struct FrameCanvas<'a> {
    frame: &'a mut Frame,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    /// Fills `[x0, x1) × [y0, y1)` (clamped to the frame) with `color`.
    fn fill_band(&mut self, x0: i64, x1: i64, y0: i64, y1: i64, color: [u8; 3]) {
        let fw = self.frame.width() as i64;
        let fh = self.frame.height() as i64;

        let x0 = x0.clamp(0, fw);
        let x1 = x1.clamp(0, fw);
        let y0 = y0.clamp(0, fh);
        let y1 = y1.clamp(0, fh);

        let data = self.frame.data_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let offset = ((y * fw + x) as usize) * FRAME_CHANNELS;
                data[offset..offset + FRAME_CHANNELS].copy_from_slice(&color);
            }
        }
    }
}

impl OverlaySurface for FrameCanvas<'_> {
    fn dimensions(&self) -> (f32, f32) {
        (self.frame.width() as f32, self.frame.height() as f32)
    }

    fn stroke_rect(&mut self, rect: ScaledRect) {
        let x0 = rect.x.round() as i64;
        let y0 = rect.y.round() as i64;
        let x1 = (rect.x + rect.width).round() as i64;
        let y1 = (rect.y + rect.height).round() as i64;
        let t = (rect.stroke_width.round() as i64).max(1);

        // Top, bottom, left, right edge bands.
        self.fill_band(x0, x1, y0, y0 + t, rect.color);
        self.fill_band(x0, x1, y1 - t, y1, rect.color);
        self.fill_band(x0, x0 + t, y0, y1, rect.color);
        self.fill_band(x1 - t, x1, y0, y1, rect.color);
    }
}
