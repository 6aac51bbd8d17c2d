use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::face_box::FaceBox;

/// Cached output of the upstream face-analysis step for one photo.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
    #[serde(default)]
    pub faces: Vec<FaceBox>,
}

/// One photo as returned by the photo catalog.
///
/// `pixel_ref` is an opaque handle the pixel decoder knows how to resolve
/// (a file path for the bundled decoder).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub pixel_ref: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub face_analysis: Option<FaceAnalysis>,
}

impl PhotoRecord {
    pub fn faces(&self) -> &[FaceBox] {
        self.face_analysis
            .as_ref()
            .map(|a| a.faces.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "id": "p1",
            "pixel_ref": "photos/p1.jpg",
            "captured_at": "2024-05-01T10:00:00Z"
        }"#;
        let record: PhotoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "p1");
        assert_eq!(record.width, 0);
        assert!(record.quality_score.is_none());
        assert!(record.faces().is_empty());
    }

    #[test]
    fn test_faces_reads_cached_analysis() {
        let json = r#"{
            "id": "p2",
            "pixel_ref": "p2.jpg",
            "captured_at": "2024-05-01T10:00:02Z",
            "width": 400,
            "height": 300,
            "face_analysis": { "faces": [ { "x": 10, "y": 10, "width": 50, "height": 60 } ] }
        }"#;
        let record: PhotoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.faces().len(), 1);
        assert_eq!(record.faces()[0].width, 50.0);
    }
}
