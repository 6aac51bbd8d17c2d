use ndarray::Array2;

use crate::features::domain::grouping_features::GroupingFeatures;
use crate::similarity::domain::similarity_scorer;
use crate::similarity::domain::similarity_weights::SimilarityWeights;

const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Symmetric pairwise similarity of one batch, with 1.0 on the diagonal.
///
/// Row/column `i` belongs to `photo_ids()[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    photo_ids: Vec<String>,
    values: Array2<f64>,
}

impl SimilarityMatrix {
    /// Scores every unordered pair once and mirrors it across the diagonal.
    pub fn build(features: &[GroupingFeatures], weights: &SimilarityWeights) -> Self {
        let n = features.len();
        let mut values = Array2::<f64>::eye(n);

        for i in 0..n {
            for j in (i + 1)..n {
                let s = similarity_scorer::score(&features[i], &features[j], weights);
                values[[i, j]] = s;
                values[[j, i]] = s;
            }
        }

        Self {
            photo_ids: features.iter().map(|f| f.photo_id.clone()).collect(),
            values,
        }
    }

    /// Builds a matrix from precomputed rows. Returns `None` unless the rows
    /// form a symmetric `n x n` grid matching the id count, with 1.0 on the
    /// diagonal.
    pub fn from_rows(photo_ids: Vec<String>, rows: Vec<Vec<f64>>) -> Option<Self> {
        let n = photo_ids.len();
        if rows.len() != n || rows.iter().any(|r| r.len() != n) {
            return None;
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n, n), flat).ok()?;
        let matrix = Self { photo_ids, values };
        let unit_diagonal = matrix
            .values
            .diag()
            .iter()
            .all(|&v| (v - 1.0).abs() <= SYMMETRY_TOLERANCE);
        if !unit_diagonal || !matrix.is_symmetric() {
            return None;
        }
        Some(matrix)
    }

    pub fn len(&self) -> usize {
        self.photo_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photo_ids.is_empty()
    }

    pub fn photo_ids(&self) -> &[String] {
        &self.photo_ids
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            ((i + 1)..n).all(|j| {
                (self.values[[i, j]] - self.values[[j, i]]).abs() <= SYMMETRY_TOLERANCE
            })
        })
    }
}
