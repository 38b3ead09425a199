/// One detected face: an axis-aligned bounding rectangle in upright
/// source-frame pixel coordinates.
///
/// Detections carry no identity; each frame's list wholesale replaces the
/// previous one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Detection {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_width_and_height() {
        let d = Detection::new(100.0, 50.0, 250.0, 170.0);
        assert_relative_eq!(d.width(), 150.0);
        assert_relative_eq!(d.height(), 120.0);
    }

    #[rstest]
    #[case::point(Detection::new(10.0, 10.0, 10.0, 10.0), 0.0, 0.0)]
    #[case::zero_width(Detection::new(5.0, 0.0, 5.0, 20.0), 0.0, 20.0)]
    #[case::zero_height(Detection::new(0.0, 8.0, 30.0, 8.0), 30.0, 0.0)]
    fn test_degenerate_rects(#[case] d: Detection, #[case] w: f32, #[case] h: f32) {
        assert_relative_eq!(d.width(), w);
        assert_relative_eq!(d.height(), h);
    }
}
