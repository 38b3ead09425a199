use crate::shared::constants::{OVERLAY_COLOR, OVERLAY_STROKE_WIDTH};
use crate::shared::detection::Detection;

/// A rectangle in canvas coordinates, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub stroke_width: f32,
    pub color: [u8; 3],
}

/// Drawing surface port.
///
/// Implementations decide how a stroke is realized (pixel writes, GPU,
/// recording for tests); the renderer only emits rectangles.
pub trait OverlaySurface {
    /// Canvas size in pixels.
    fn dimensions(&self) -> (f32, f32);

    /// Draws one unfilled rectangle.
    fn stroke_rect(&mut self, rect: ScaledRect);
}

/// Maps detections from source-frame pixels to canvas coordinates and draws
/// one unfilled rectangle per face.
///
/// Scaling is a per-axis affine stretch:
/// `scale_x = canvas_width / source_width`, same for y. Rectangles are
/// emitted in input order with no clipping and no compositing; overlaps just
/// draw over each other.
pub struct OverlayRenderer {
    stroke_width: f32,
    color: [u8; 3],
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self {
            stroke_width: OVERLAY_STROKE_WIDTH,
            color: OVERLAY_COLOR,
        }
    }

    pub fn with_style(stroke_width: f32, color: [u8; 3]) -> Self {
        Self {
            stroke_width,
            color,
        }
    }

    /// Draws `detections` onto `surface`.
    ///
    /// `source` is the pixel size of the frame the detections were measured
    /// in. If either source dimension is zero (surface not yet measured),
    /// nothing is drawn.
    pub fn render(
        &self,
        detections: &[Detection],
        source: (u32, u32),
        surface: &mut dyn OverlaySurface,
    ) {
        let (source_w, source_h) = source;
        if source_w == 0 || source_h == 0 {
            return;
        }

        let (canvas_w, canvas_h) = surface.dimensions();
        let scale_x = canvas_w / source_w as f32;
        let scale_y = canvas_h / source_h as f32;

        for d in detections {
            surface.stroke_rect(ScaledRect {
                x: d.left * scale_x,
                y: d.top * scale_y,
                width: d.width() * scale_x,
                height: d.height() * scale_y,
                stroke_width: self.stroke_width,
                color: self.color,
            });
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}
