//! Pairwise photo similarity.
//!
//! Combines a temporal decay, a visual comparison and a metadata comparison
//! into one score in `[0, 1]`. Photos shot within the burst window get a flat
//! bonus on top so rapid bursts stay together even when their visuals are
//! only borderline similar.

use crate::features::domain::grouping_features::GroupingFeatures;
use crate::shared::constants::{BURST_BONUS, BURST_WINDOW_SECS, TEMPORAL_DECAY_SECS};
use crate::shared::face_box::FacePosition;
use crate::similarity::domain::similarity_weights::SimilarityWeights;

const HISTOGRAM_WEIGHT: f64 = 0.4;
const COMPOSITION_WEIGHT: f64 = 0.2;
const COMPLEXITY_WEIGHT: f64 = 0.2;
const FACE_COUNT_WEIGHT: f64 = 0.1;
const FACE_POSITION_WEIGHT: f64 = 0.1;

const MAX_CENTER_DISTANCE: f64 = std::f64::consts::SQRT_2;

pub fn score(a: &GroupingFeatures, b: &GroupingFeatures, weights: &SimilarityWeights) -> f64 {
    let dt = a.seconds_until(b).abs();
    let burst_bonus = if dt < BURST_WINDOW_SECS {
        BURST_BONUS
    } else {
        0.0
    };

    let combined = temporal_similarity(dt) * weights.temporal
        + visual_similarity(a, b) * weights.visual
        + metadata_similarity(a, b) * weights.metadata
        + burst_bonus;

    combined.clamp(0.0, 1.0)
}

/// `exp(-|dt| / 60s)`.
pub fn temporal_similarity(dt_secs: f64) -> f64 {
    (-dt_secs.abs() / TEMPORAL_DECAY_SECS).exp()
}

pub fn visual_similarity(a: &GroupingFeatures, b: &GroupingFeatures) -> f64 {
    let histogram = pearson_correlation(&a.color_histogram, &b.color_histogram);
    let composition = closeness(a.composition_score, b.composition_score);
    let complexity = closeness(a.scene_complexity, b.scene_complexity);
    let face_count = face_count_similarity(a.face_count, b.face_count);
    let face_position = face_position_similarity(&a.face_positions, &b.face_positions);

    histogram * HISTOGRAM_WEIGHT
        + composition * COMPOSITION_WEIGHT
        + complexity * COMPLEXITY_WEIGHT
        + face_count * FACE_COUNT_WEIGHT
        + face_position * FACE_POSITION_WEIGHT
}

pub fn metadata_similarity(a: &GroupingFeatures, b: &GroupingFeatures) -> f64 {
    let aspect = closeness(a.aspect_ratio, b.aspect_ratio);
    let area = ratio(a.pixel_area(), b.pixel_area());
    (aspect + area) / 2.0
}

/// Pearson correlation coefficient.
///
/// Returns 0.0 when either input has zero variance: a flat histogram carries
/// no information to correlate against.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let n = len as f64;

    let mean_a = a[..len].iter().sum::<f64>() / n;
    let mean_b = b[..len].iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for i in 0..len {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a < f64::EPSILON || var_b < f64::EPSILON {
        return 0.0;
    }

    (cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0)
}

pub fn face_count_similarity(a: usize, b: usize) -> f64 {
    let max = a.max(b);
    if max == 0 {
        return 1.0;
    }
    1.0 - a.abs_diff(b) as f64 / max as f64
}

/// Greedy best-match of each face in `a` against the faces in `b`.
///
/// A match scores the mean of center proximity and area ratio; the result is
/// the average best match over the faces of `a`.
pub fn face_position_similarity(a: &[FacePosition], b: &[FacePosition]) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let total: f64 = a
        .iter()
        .map(|fa| {
            b.iter()
                .map(|fb| face_match(fa, fb))
                .fold(0.0, f64::max)
        })
        .sum();

    total / a.len() as f64
}

fn face_match(a: &FacePosition, b: &FacePosition) -> f64 {
    let distance = ((a.center_x - b.center_x).powi(2) + (a.center_y - b.center_y).powi(2)).sqrt();
    let proximity = (1.0 - distance / MAX_CENTER_DISTANCE).max(0.0);
    let area = ratio(a.normalized_area, b.normalized_area);
    (proximity + area) / 2.0
}

/// `1 - |a - b|`, floored at zero.
fn closeness(a: f64, b: f64) -> f64 {
    (1.0 - (a - b).abs()).max(0.0)
}

/// `min / max` of two non-negative magnitudes; equal zeros count as identical.
fn ratio(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 {
        return 1.0;
    }
    a.min(b) / max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::domain::grouping_features::aspect_ratio;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    fn histogram() -> Vec<f64> {
        let mut h = vec![0.0; 64];
        h[3] = 0.5;
        h[17] = 0.3;
        h[40] = 0.2;
        h
    }

    fn features(id: &str, offset_secs: i64) -> GroupingFeatures {
        GroupingFeatures {
            photo_id: id.into(),
            captured_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap()
                + Duration::seconds(offset_secs),
            color_histogram: histogram(),
            composition_score: 0.6,
            face_count: 0,
            face_positions: Vec::new(),
            scene_complexity: 0.5,
            width: 400,
            height: 300,
            aspect_ratio: aspect_ratio(400, 300),
            file_size: 1000,
            quality_score: None,
            faces: Vec::new(),
            degraded: false,
        }
    }

    fn face(x: f64, y: f64, area: f64) -> FacePosition {
        FacePosition {
            center_x: x,
            center_y: y,
            normalized_area: area,
        }
    }

    #[test]
    fn test_identical_features_within_burst_score_one() {
        let a = features("a", 0);
        let b = features("b", 2);
        assert_relative_eq!(score(&a, &b, &SimilarityWeights::default()), 1.0);
    }

    #[test]
    fn test_far_apart_identical_photos_lose_temporal_term() {
        let a = features("a", 0);
        let b = features("b", 600);
        let s = score(&a, &b, &SimilarityWeights::default());
        // Visual and metadata are perfect; the temporal term is ~e^-10.
        assert_relative_eq!(s, 0.5, epsilon = 1e-3);
        assert!(s < 0.55);
    }

    #[test]
    fn test_temporal_decay_is_monotonic() {
        let a = features("a", 0);
        let near = score(&a, &features("b", 5), &SimilarityWeights::default());
        let far = score(&a, &features("c", 120), &SimilarityWeights::default());
        assert!(near >= far);
    }

    #[test]
    fn test_burst_bonus_is_a_step_at_ten_seconds() {
        let weights = SimilarityWeights::new(0.5, 0.0, 0.0);
        let a = features("a", 0);
        let inside = score(&a, &features("b", 9), &weights);
        let outside = score(&a, &features("c", 10), &weights);
        assert_relative_eq!(inside, 0.5 * (-9.0f64 / 60.0).exp() + 0.15, epsilon = 1e-9);
        assert_relative_eq!(outside, 0.5 * (-10.0f64 / 60.0).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_score_in_range_with_faces_and_mixed_shapes() {
        let mut a = features("a", 0);
        let mut b = features("b", 45);
        a.face_count = 2;
        a.face_positions = vec![face(0.3, 0.3, 0.05), face(0.7, 0.4, 0.02)];
        b.face_count = 1;
        b.face_positions = vec![face(0.3, 0.3, 0.05)];
        b.width = 300;
        b.aspect_ratio = 1.0;
        let w = SimilarityWeights::default();
        assert!((0.0..=1.0).contains(&score(&a, &b, &w)));
        assert_relative_eq!(
            metadata_similarity(&a, &b),
            metadata_similarity(&b, &a),
            epsilon = 1e-12
        );
    }

    #[rstest]
    #[case::zero_faces_both_sides(0, 0)]
    #[case::zero_faces_one_side(0, 3)]
    fn test_score_in_range_for_degenerate_faces(#[case] fa: usize, #[case] fb: usize) {
        let mut a = features("a", 0);
        let mut b = features("b", 3);
        a.face_count = fa;
        b.face_count = fb;
        b.face_positions = (0..fb).map(|_| face(0.5, 0.5, 0.1)).collect();
        let s = score(&a, &b, &SimilarityWeights::default());
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_degraded_features_score_in_range() {
        let mut a = features("a", 0);
        let mut b = features("b", 1);
        a.color_histogram = vec![0.0; 64];
        b.color_histogram = vec![0.0; 64];
        a.width = 0;
        a.height = 0;
        a.aspect_ratio = 0.0;
        let s = score(&a, &b, &SimilarityWeights::default());
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_pearson_identical() {
        let a = vec![0.1, 0.2, 0.3, 0.4];
        assert_relative_eq!(pearson_correlation(&a, &a), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pearson_zero_variance_is_zero() {
        let flat = vec![0.25, 0.25, 0.25, 0.25];
        let peaked = vec![1.0, 0.0, 0.0, 0.0];
        assert_relative_eq!(pearson_correlation(&flat, &peaked), 0.0);
        assert_relative_eq!(pearson_correlation(&flat, &flat), 0.0);
    }

    #[test]
    fn test_pearson_anticorrelated() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_relative_eq!(pearson_correlation(&a, &b), -1.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case::both_zero(0, 0, 1.0)]
    #[case::equal(2, 2, 1.0)]
    #[case::one_vs_two(1, 2, 0.5)]
    #[case::none_vs_some(0, 4, 0.0)]
    fn test_face_count_similarity(#[case] a: usize, #[case] b: usize, #[case] expected: f64) {
        assert_relative_eq!(face_count_similarity(a, b), expected);
    }

    #[test]
    fn test_face_position_identical_faces() {
        let faces = vec![face(0.4, 0.4, 0.1)];
        assert_relative_eq!(face_position_similarity(&faces, &faces), 1.0);
    }

    #[test]
    fn test_face_position_picks_best_match() {
        let a = vec![face(0.2, 0.2, 0.1)];
        let b = vec![face(0.9, 0.9, 0.01), face(0.2, 0.2, 0.1)];
        assert_relative_eq!(face_position_similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_face_position_one_side_empty() {
        let a = vec![face(0.2, 0.2, 0.1)];
        assert_relative_eq!(face_position_similarity(&a, &[]), 0.0);
        assert_relative_eq!(face_position_similarity(&[], &[]), 1.0);
    }

    #[test]
    fn test_metadata_similarity_for_different_shapes() {
        let a = features("a", 0);
        let mut b = features("b", 0);
        b.width = 200;
        b.height = 300;
        b.aspect_ratio = aspect_ratio(200, 300);
        let expected = ((1.0 - (4.0 / 3.0 - 2.0 / 3.0)) + 0.5) / 2.0;
        assert_relative_eq!(metadata_similarity(&a, &b), expected, epsilon = 1e-9);
    }
}
