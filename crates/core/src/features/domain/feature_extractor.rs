use std::sync::Arc;

use crate::features::domain::color_histogram;
use crate::features::domain::composition;
use crate::features::domain::grouping_features::{aspect_ratio, GroupingFeatures};
use crate::features::domain::pixel_decoder::PixelDecoder;
use crate::features::domain::scene_complexity;
use crate::shared::constants::NEUTRAL_SCORE;
use crate::shared::face_box::{FaceBox, FacePosition};
use crate::shared::photo::PhotoRecord;
use crate::shared::pixel_buffer::PixelBuffer;

/// Computes [`GroupingFeatures`] for one photo at a time.
///
/// Never fails: when a photo's pixels cannot be decoded, the extractor logs
/// the cause and returns the basic feature set (empty histogram, neutral
/// composition and complexity) so one bad file cannot sink a whole batch.
/// Face placement always comes from the cached upstream face boxes.
pub struct FeatureExtractor {
    decoder: Arc<dyn PixelDecoder>,
}

impl FeatureExtractor {
    pub fn new(decoder: Arc<dyn PixelDecoder>) -> Self {
        Self { decoder }
    }

    pub fn extract(&self, photo: &PhotoRecord) -> GroupingFeatures {
        match self.decoder.decode(photo) {
            Ok(buffer) if !buffer.is_empty() => analyze(photo, &buffer),
            Ok(_) => {
                log::warn!(
                    "Photo {} decoded to an empty buffer, using basic features",
                    photo.id
                );
                basic(photo)
            }
            Err(e) => {
                log::warn!("Photo {} could not be decoded ({e}), using basic features", photo.id);
                basic(photo)
            }
        }
    }
}

fn analyze(photo: &PhotoRecord, buffer: &PixelBuffer) -> GroupingFeatures {
    let mut features = basic(photo);
    features.color_histogram = color_histogram::compute(buffer);
    features.composition_score = composition::score(buffer);
    features.scene_complexity = scene_complexity::measure(buffer);
    if features.width == 0 || features.height == 0 {
        // Catalog did not know the dimensions; take them from the decoded image.
        let (width, height) = buffer.source_size();
        features.width = width;
        features.height = height;
        features.aspect_ratio = aspect_ratio(width, height);
        features.face_positions = face_positions(&features.faces, width, height);
    }
    features.degraded = false;
    features
}

/// Feature set that needs no pixels.
pub fn basic(photo: &PhotoRecord) -> GroupingFeatures {
    let faces = photo.faces().to_vec();
    let face_positions = face_positions(&faces, photo.width, photo.height);

    GroupingFeatures {
        photo_id: photo.id.clone(),
        captured_at: photo.captured_at,
        color_histogram: color_histogram::empty(),
        composition_score: NEUTRAL_SCORE,
        face_count: faces.len(),
        face_positions,
        scene_complexity: NEUTRAL_SCORE,
        width: photo.width,
        height: photo.height,
        aspect_ratio: aspect_ratio(photo.width, photo.height),
        file_size: photo.file_size,
        quality_score: photo.quality_score,
        faces,
        degraded: true,
    }
}

fn face_positions(faces: &[FaceBox], width: u32, height: u32) -> Vec<FacePosition> {
    faces
        .iter()
        .filter_map(|f| f.position_in(width, height))
        .collect()
}
