use serde::{Deserialize, Serialize};

/// A face bounding box produced upstream by the face-detection capability.
///
/// Coordinates are in source-image pixels. The grouping engine only reads
/// these; it never runs detection itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Frame-relative face placement: center and area as fractions of the image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FacePosition {
    pub center_x: f64,
    pub center_y: f64,
    pub normalized_area: f64,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    /// Normalizes the box against the image it was detected in.
    ///
    /// Returns `None` for a zero-sized image, where no meaningful position exists.
    pub fn position_in(&self, image_width: u32, image_height: u32) -> Option<FacePosition> {
        if image_width == 0 || image_height == 0 {
            return None;
        }
        let w = image_width as f64;
        let h = image_height as f64;
        Some(FacePosition {
            center_x: ((self.x + self.width / 2.0) / w).clamp(0.0, 1.0),
            center_y: ((self.y + self.height / 2.0) / h).clamp(0.0, 1.0),
            normalized_area: ((self.width.max(0.0) * self.height.max(0.0)) / (w * h))
                .clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_position_of_centered_box() {
        let face = FaceBox::new(40.0, 30.0, 20.0, 20.0);
        let pos = face.position_in(100, 80).unwrap();
        assert_relative_eq!(pos.center_x, 0.5);
        assert_relative_eq!(pos.center_y, 0.5);
        assert_relative_eq!(pos.normalized_area, 400.0 / 8000.0);
    }

    #[test]
    fn test_position_clamps_boxes_off_frame() {
        let face = FaceBox::new(90.0, 90.0, 40.0, 40.0);
        let pos = face.position_in(100, 100).unwrap();
        assert_relative_eq!(pos.center_x, 1.0);
        assert_relative_eq!(pos.center_y, 1.0);
    }

    #[rstest]
    #[case::zero_width(0, 100)]
    #[case::zero_height(100, 0)]
    fn test_position_undefined_for_empty_image(#[case] w: u32, #[case] h: u32) {
        assert!(FaceBox::new(0.0, 0.0, 10.0, 10.0).position_in(w, h).is_none());
    }

    #[test]
    fn test_deserialize_without_confidence() {
        let face: FaceBox =
            serde_json::from_str(r#"{"x":1.0,"y":2.0,"width":3.0,"height":4.0}"#).unwrap();
        assert_eq!(face.confidence, None);
        assert_relative_eq!(face.height, 4.0);
    }
}
