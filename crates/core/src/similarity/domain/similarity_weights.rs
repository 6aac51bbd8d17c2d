use serde::{Deserialize, Serialize};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Relative importance of the temporal, visual and metadata similarity terms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub temporal: f64,
    pub visual: f64,
    pub metadata: f64,
}

impl SimilarityWeights {
    pub fn new(temporal: f64, visual: f64, metadata: f64) -> Self {
        Self {
            temporal,
            visual,
            metadata,
        }
    }

    pub fn sum(&self) -> f64 {
        self.temporal + self.visual + self.metadata
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self::new(0.5, 0.35, 0.15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_is_normalized() {
        assert!(SimilarityWeights::default().is_normalized());
    }

    #[rstest]
    #[case::exact(0.4, 0.4, 0.2, true)]
    #[case::within_tolerance(0.4, 0.4, 0.205, true)]
    #[case::too_small(0.3, 0.3, 0.3, false)]
    #[case::too_large(0.5, 0.5, 0.2, false)]
    fn test_is_normalized(
        #[case] t: f64,
        #[case] v: f64,
        #[case] m: f64,
        #[case] expected: bool,
    ) {
        assert_eq!(SimilarityWeights::new(t, v, m).is_normalized(), expected);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let w: SimilarityWeights = serde_json::from_str(r#"{"temporal":0.6}"#).unwrap();
        assert_eq!(w.temporal, 0.6);
        assert_eq!(w.visual, 0.35);
    }
}
