use ndarray::ArrayView3;

/// Rotation that must be applied to a frame buffer to bring it upright.
///
/// Detections are always reported in upright coordinates, so consumers of
/// a rotated frame must use [`Frame::upright_width`]/[`Frame::upright_height`]
/// when mapping them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn is_transposed(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// A single camera frame: contiguous RGB24 bytes in row-major order, plus
/// the rotation needed to bring the buffer upright.
///
/// Format conversion happens at the camera boundary only; everything else
/// treats the pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    rotation: Rotation,
}

pub const FRAME_CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, rotation: Rotation) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * FRAME_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            rotation,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Width of the frame once rotated upright.
    pub fn upright_width(&self) -> u32 {
        if self.rotation.is_transposed() {
            self.height
        } else {
            self.width
        }
    }

    /// Height of the frame once rotated upright.
    pub fn upright_height(&self) -> u32 {
        if self.rotation.is_transposed() {
            self.width
        } else {
            self.height
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, FRAME_CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Consumes the frame, handing its buffer back for reuse.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn frame(w: u32, h: u32, rotation: Rotation) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, rotation)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![7u8; 12]; // 2x2x3
        let f = Frame::new(data.clone(), 2, 2, Rotation::Deg0);
        assert_eq!(f.width(), 2);
        assert_eq!(f.height(), 2);
        assert_eq!(f.rotation(), Rotation::Deg0);
        assert_eq!(f.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, Rotation::Deg0);
    }

    #[rstest]
    #[case(0, Some(Rotation::Deg0))]
    #[case(90, Some(Rotation::Deg90))]
    #[case(180, Some(Rotation::Deg180))]
    #[case(270, Some(Rotation::Deg270))]
    #[case(45, None)]
    #[case(360, None)]
    fn test_rotation_from_degrees(#[case] deg: u32, #[case] expected: Option<Rotation>) {
        assert_eq!(Rotation::from_degrees(deg), expected);
    }

    #[test]
    fn test_rotation_degrees_roundtrip() {
        for deg in [0, 90, 180, 270] {
            assert_eq!(Rotation::from_degrees(deg).unwrap().degrees(), deg);
        }
    }

    #[test]
    fn test_upright_dimensions_unrotated() {
        let f = frame(4, 2, Rotation::Deg0);
        assert_eq!(f.upright_width(), 4);
        assert_eq!(f.upright_height(), 2);
    }

    #[test]
    fn test_upright_dimensions_transposed() {
        let f = frame(4, 2, Rotation::Deg90);
        assert_eq!(f.upright_width(), 2);
        assert_eq!(f.upright_height(), 4);

        let f = frame(4, 2, Rotation::Deg270);
        assert_eq!(f.upright_width(), 2);
        assert_eq!(f.upright_height(), 4);
    }

    #[test]
    fn test_upright_dimensions_180() {
        let f = frame(4, 2, Rotation::Deg180);
        assert_eq!(f.upright_width(), 4);
        assert_eq!(f.upright_height(), 2);
    }

    #[test]
    fn test_as_ndarray_shape_and_access() {
        let mut data = vec![0u8; 24]; // 2x4x3
        data[6] = 255; // row=0, col=2, R
        let f = Frame::new(data, 4, 2, Rotation::Deg0);
        let arr = f.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[0, 2, 0]], 255);
        assert_eq!(arr[[0, 2, 1]], 0);
    }

    #[test]
    fn test_into_data_returns_buffer() {
        let f = frame(2, 2, Rotation::Deg0);
        let buf = f.into_data();
        assert_eq!(buf.len(), 12);
    }
}
