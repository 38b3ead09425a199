//! UltraFace face detector using ONNX Runtime via `ort`.
//!
//! A lightweight detector producing bounding boxes only: no landmarks, no
//! classification, no tracking. Frames are rotated upright before inference
//! and boxes come back in upright source-frame pixels.

use std::path::Path;

use ndarray::Array4;

use crate::detection::domain::face_detector::{
    DetectorOptions, FaceDetector, PerformanceMode,
};
use crate::shared::detection::Detection;
use crate::shared::frame::{Frame, Rotation, FRAME_CHANNELS};

/// Model input resolution for the fast profile (version-RFB-320).
const FAST_INPUT: (u32, u32) = (320, 240);

/// Model input resolution for the accurate profile (version-RFB-640).
const ACCURATE_INPUT: (u32, u32) = (640, 480);

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.5;

/// UltraFace detector backed by an ONNX Runtime session.
pub struct OnnxUltrafaceDetector {
    session: ort::session::Session,
    confidence: f32,
    input_width: u32,
    input_height: u32,
}

impl OnnxUltrafaceDetector {
    /// Load an UltraFace ONNX model.
    ///
    /// The model produces boxes only, so `options.landmarks` and
    /// `options.classification` must be disabled.
    pub fn new(
        model_path: &Path,
        options: DetectorOptions,
        confidence: f32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if options.landmarks || options.classification {
            return Err("UltraFace provides bounding boxes only; \
                 landmark and classification modes are not supported"
                .into());
        }

        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        let (input_width, input_height) = match options.performance {
            PerformanceMode::Fast => FAST_INPUT,
            PerformanceMode::Accurate => ACCURATE_INPUT,
        };
        Ok(Self {
            session,
            confidence,
            input_width,
            input_height,
        })
    }
}

impl FaceDetector for OnnxUltrafaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let fw = frame.upright_width();
        let fh = frame.upright_height();

        // 1. Preprocess: rotate upright, resize, normalize to NCHW
        let upright = rotate_rgb(frame.data(), frame.width(), frame.height(), frame.rotation());
        let input_tensor = preprocess(&upright, fw, fh, self.input_width, self.input_height);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // UltraFace outputs two tensors:
        // - scores: [1, N, 2] (background, face)
        // - boxes:  [1, N, 4] (normalized x1, y1, x2, y2)
        if outputs.len() < 2 {
            return Err(
                format!("UltraFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let scores = outputs[0].try_extract_array::<f32>()?;
        let boxes = outputs[1].try_extract_array::<f32>()?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;
        let box_data = boxes.as_slice().ok_or("Cannot get box slice")?;

        // 3. Filter by face confidence, map to upright frame pixels
        let mut raw_dets = Vec::new();
        let num_priors = score_data.len() / 2;

        for i in 0..num_priors {
            let score = score_data[i * 2 + 1];
            if score < self.confidence {
                continue;
            }
            let offset = i * 4;
            if offset + 4 > box_data.len() {
                break;
            }

            let x1 = (box_data[offset] * fw as f32).max(0.0);
            let y1 = (box_data[offset + 1] * fh as f32).max(0.0);
            let x2 = (box_data[offset + 2] * fw as f32).min(fw as f32);
            let y2 = (box_data[offset + 3] * fh as f32).min(fh as f32);

            raw_dets.push(RawDet {
                x1,
                y1,
                x2,
                y2,
                score,
            });
        }

        // 4. NMS
        let kept = nms(&mut raw_dets, NMS_IOU_THRESH);

        Ok(kept
            .into_iter()
            .map(|d| Detection::new(d.x1, d.y1, d.x2, d.y2))
            .collect())
    }
}

#[derive(Clone, Copy, Debug)]
struct RawDet {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

impl RawDet {
    fn iou(&self, other: &RawDet) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = (self.x2 - self.x1) * (self.y2 - self.y1);
        let area_b = (other.x2 - other.x1) * (other.y2 - other.y1);
        inter / (area_a + area_b - inter)
    }
}

/// Greedy NMS: keep highest-scoring boxes, suppress overlaps.
fn nms(dets: &mut Vec<RawDet>, iou_thresh: f32) -> Vec<RawDet> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<RawDet> = Vec::with_capacity(dets.len());
    for d in dets.iter() {
        if kept.iter().all(|k| k.iou(d) <= iou_thresh) {
            kept.push(*d);
        }
    }
    kept
}

/// Rotates an RGB24 buffer upright. `Deg0` returns a plain copy.
fn rotate_rgb(data: &[u8], width: u32, height: u32, rotation: Rotation) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let c = FRAME_CHANNELS;

    if rotation == Rotation::Deg0 {
        return data.to_vec();
    }

    let mut out = vec![0u8; data.len()];
    for y in 0..h {
        for x in 0..w {
            // Destination coordinates in the upright image.
            let (dx, dy, dw) = match rotation {
                Rotation::Deg90 => (h - 1 - y, x, h),
                Rotation::Deg180 => (w - 1 - x, h - 1 - y, w),
                Rotation::Deg270 => (y, w - 1 - x, h),
                Rotation::Deg0 => unreachable!(),
            };
            let src = (y * w + x) * c;
            let dst = (dy * dw + dx) * c;
            out[dst..dst + c].copy_from_slice(&data[src..src + c]);
        }
    }
    out
}

/// Nearest-neighbor resize + normalization into a `[1, 3, H, W]` tensor.
///
/// UltraFace expects pixels normalized as `(v - 127) / 128`.
fn preprocess(upright: &[u8], fw: u32, fh: u32, iw: u32, ih: u32) -> Array4<f32> {
    let mut tensor = Array4::<f32>::zeros((1, 3, ih as usize, iw as usize));
    for y in 0..ih as usize {
        let sy = (y * fh as usize / ih as usize).min(fh as usize - 1);
        for x in 0..iw as usize {
            let sx = (x * fw as usize / iw as usize).min(fw as usize - 1);
            let src = (sy * fw as usize + sx) * FRAME_CHANNELS;
            for ch in 0..3 {
                tensor[[0, ch, y, x]] = (upright[src + ch] as f32 - 127.0) / 128.0;
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> RawDet {
        RawDet {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    // --- IoU / NMS ---

    #[test]
    fn test_iou_identical() {
        let a = det(0.0, 0.0, 10.0, 10.0, 0.9);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = det(0.0, 0.0, 10.0, 10.0, 0.9);
        let b = det(20.0, 20.0, 30.0, 30.0, 0.9);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_nms_suppresses_overlapping_lower_score() {
        let mut dets = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.8),
            det(1.0, 1.0, 11.0, 11.0, 0.9),
        ];
        let kept = nms(&mut dets, 0.5);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_disjoint_boxes() {
        let mut dets = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.8),
            det(50.0, 50.0, 60.0, 60.0, 0.7),
        ];
        let kept = nms(&mut dets, 0.5);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_empty() {
        let mut dets = Vec::new();
        assert!(nms(&mut dets, 0.5).is_empty());
    }

    // --- Rotation ---

    // 2x1 image: pixel A then pixel B left to right.
    fn two_pixels() -> Vec<u8> {
        vec![1, 1, 1, 2, 2, 2]
    }

    #[test]
    fn test_rotate_deg0_is_copy() {
        let out = rotate_rgb(&two_pixels(), 2, 1, Rotation::Deg0);
        assert_eq!(out, two_pixels());
    }

    #[test]
    fn test_rotate_deg180_reverses_pixels() {
        let out = rotate_rgb(&two_pixels(), 2, 1, Rotation::Deg180);
        assert_eq!(out, vec![2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_rotate_deg90_transposes() {
        // 2x1 rotated 90° clockwise becomes 1x2: A on top, B below.
        let out = rotate_rgb(&two_pixels(), 2, 1, Rotation::Deg90);
        assert_eq!(out, vec![1, 1, 1, 2, 2, 2]);

        // 1x2 (A above B) rotated 90° clockwise becomes 2x1: B then A.
        let column = vec![1, 1, 1, 2, 2, 2];
        let out = rotate_rgb(&column, 1, 2, Rotation::Deg90);
        assert_eq!(out, vec![2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_rotate_deg270_is_inverse_of_deg90() {
        let src: Vec<u8> = (0..2 * 3 * 3).map(|v| v as u8).collect(); // 2x3
        let once = rotate_rgb(&src, 2, 3, Rotation::Deg90); // now 3x2
        let back = rotate_rgb(&once, 3, 2, Rotation::Deg270);
        assert_eq!(back, src);
    }

    // --- Preprocess ---

    #[test]
    fn test_preprocess_normalization() {
        // Single mid-gray pixel maps to ~0.0
        let data = vec![127u8; 3];
        let tensor = preprocess(&data, 1, 1, 1, 1);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 0.0);

        let data = vec![255u8; 3];
        let tensor = preprocess(&data, 1, 1, 1, 1);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);
    }

    #[test]
    fn test_preprocess_output_shape() {
        let data = vec![0u8; 4 * 2 * 3];
        let tensor = preprocess(&data, 4, 2, 320, 240);
        assert_eq!(tensor.shape(), &[1, 3, 240, 320]);
    }

    #[test]
    fn test_preprocess_channel_layout() {
        // One red pixel: R channel positive, G/B at the black level.
        let data = vec![255u8, 0, 0];
        let tensor = preprocess(&data, 1, 1, 2, 2);
        assert_relative_eq!(tensor[[0, 0, 1, 1]], 1.0);
        assert_relative_eq!(tensor[[0, 1, 1, 1]], -127.0 / 128.0);
        assert_relative_eq!(tensor[[0, 2, 1, 1]], -127.0 / 128.0);
    }
}
