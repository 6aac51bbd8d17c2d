use chrono::{DateTime, Utc};

use crate::shared::face_box::{FaceBox, FacePosition};

/// Per-photo descriptors used only for pairwise comparison.
///
/// Built once per run by the feature extractor and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupingFeatures {
    pub photo_id: String,
    pub captured_at: DateTime<Utc>,
    /// 64-bin joint RGB histogram. Sums to 1, or is all zeros when degraded.
    pub color_histogram: Vec<f64>,
    pub composition_score: f64,
    pub face_count: usize,
    pub face_positions: Vec<FacePosition>,
    pub scene_complexity: f64,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub file_size: u64,
    pub quality_score: Option<f64>,
    pub faces: Vec<FaceBox>,
    /// True when pixel analysis failed and neutral values were substituted.
    pub degraded: bool,
}

impl GroupingFeatures {
    pub fn pixel_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Signed seconds from `self` to `other`.
    pub fn seconds_until(&self, other: &GroupingFeatures) -> f64 {
        (other.captured_at - self.captured_at).num_milliseconds() as f64 / 1000.0
    }
}

pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 0.0;
    }
    width as f64 / height as f64
}
