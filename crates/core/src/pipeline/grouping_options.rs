use serde::{Deserialize, Serialize};

use crate::pipeline::grouping_error::GroupingError;
use crate::similarity::domain::similarity_weights::SimilarityWeights;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.65;
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;
pub const DEFAULT_MAX_GROUP_SIZE: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 10;

pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 50;

/// Per-run grouping parameters.
///
/// Deserializes from partial JSON; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingOptions {
    pub similarity_threshold: f64,
    pub min_group_size: usize,
    pub max_group_size: usize,
    pub batch_size: usize,
    pub weights: SimilarityWeights,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            weights: SimilarityWeights::default(),
        }
    }
}

impl GroupingOptions {
    /// Checks every option-only precondition. Photo count is checked
    /// separately once the session's photos are known.
    pub fn validate(&self) -> Result<(), GroupingError> {
        if !self.weights.is_normalized() {
            return Err(GroupingError::Validation(format!(
                "similarity weights must sum to 1.0, got {:.3}",
                self.weights.sum()
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(GroupingError::Validation(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(GroupingError::Validation(format!(
                "batch_size must be within [{MIN_BATCH_SIZE}, {MAX_BATCH_SIZE}], got {}",
                self.batch_size
            )));
        }
        if self.max_group_size < self.min_group_size {
            return Err(GroupingError::Validation(format!(
                "max_group_size ({}) must not be less than min_group_size ({})",
                self.max_group_size, self.min_group_size
            )));
        }
        Ok(())
    }

    pub fn validate_photo_count(&self, count: usize) -> Result<(), GroupingError> {
        if count < self.min_group_size {
            return Err(GroupingError::Validation(format!(
                "session has {count} photos, fewer than min_group_size ({})",
                self.min_group_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GroupingOptions::default().validate().is_ok());
    }

    fn with(f: impl FnOnce(&mut GroupingOptions)) -> GroupingOptions {
        let mut options = GroupingOptions::default();
        f(&mut options);
        options
    }

    #[rstest]
    #[case::weights(with(|o| o.weights = SimilarityWeights::new(0.5, 0.5, 0.5)))]
    #[case::threshold_negative(with(|o| o.similarity_threshold = -0.1))]
    #[case::threshold_above_one(with(|o| o.similarity_threshold = 1.2))]
    #[case::batch_zero(with(|o| o.batch_size = 0))]
    #[case::batch_too_big(with(|o| o.batch_size = 51))]
    #[case::max_below_min(with(|o| { o.min_group_size = 4; o.max_group_size = 3; }))]
    fn test_invalid_options_are_rejected(#[case] options: GroupingOptions) {
        let err = options.validate().unwrap_err();
        assert!(matches!(err, GroupingError::Validation(_)));
    }

    #[rstest]
    #[case::batch_one(with(|o| o.batch_size = 1))]
    #[case::batch_fifty(with(|o| o.batch_size = 50))]
    #[case::threshold_zero(with(|o| o.similarity_threshold = 0.0))]
    #[case::equal_sizes(with(|o| { o.min_group_size = 3; o.max_group_size = 3; }))]
    fn test_boundary_options_are_accepted(#[case] options: GroupingOptions) {
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_photo_count_below_min_group_size() {
        let options = GroupingOptions::default();
        assert!(options.validate_photo_count(1).is_err());
        assert!(options.validate_photo_count(2).is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: GroupingOptions =
            serde_json::from_str(r#"{"similarity_threshold":0.55,"batch_size":5}"#).unwrap();
        assert_eq!(options.batch_size, 5);
        assert_eq!(options.max_group_size, DEFAULT_MAX_GROUP_SIZE);
        assert_eq!(options.weights, SimilarityWeights::default());
    }
}
