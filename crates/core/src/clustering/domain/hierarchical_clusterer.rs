use std::sync::atomic::{AtomicBool, Ordering};

use crate::clustering::domain::photo_cluster::RawCluster;
use crate::similarity::domain::similarity_matrix::SimilarityMatrix;

/// Average-linkage agglomerative clustering over a similarity matrix.
///
/// Starts from singletons and repeatedly merges the most similar pair of
/// clusters. Ties go to the first pair found scanning `(i, j)` with `i < j`
/// in current cluster order, which makes results reproducible.
///
/// Two rules end the loop outright:
/// - the best pair's linkage is below `similarity_threshold`;
/// - the best pair would form a cluster larger than `max_group_size`. The
///   loop stops at that point; it does not fall back to the next-best pair.
///
/// Clusters smaller than `min_group_size` are dropped from the result.
pub struct HierarchicalClusterer {
    similarity_threshold: f64,
    min_group_size: usize,
    max_group_size: usize,
}

impl HierarchicalClusterer {
    pub fn new(similarity_threshold: f64, min_group_size: usize, max_group_size: usize) -> Self {
        Self {
            similarity_threshold,
            min_group_size,
            max_group_size,
        }
    }

    pub fn cluster(&self, matrix: &SimilarityMatrix) -> Vec<RawCluster> {
        let never = AtomicBool::new(false);
        self.cluster_cancellable(matrix, &never).unwrap_or_default()
    }

    /// Like [`cluster`](Self::cluster), checking `cancelled` before every
    /// merge. Returns `None` once cancellation is observed.
    pub fn cluster_cancellable(
        &self,
        matrix: &SimilarityMatrix,
        cancelled: &AtomicBool,
    ) -> Option<Vec<RawCluster>> {
        let mut clusters: Vec<Vec<usize>> = (0..matrix.len()).map(|i| vec![i]).collect();

        while clusters.len() > 1 {
            if cancelled.load(Ordering::Relaxed) {
                return None;
            }

            let Some((i, j, linkage)) = best_pair(&clusters, matrix) else {
                break;
            };

            if linkage < self.similarity_threshold {
                log::debug!(
                    "Stopping: best linkage {linkage:.3} below threshold {:.3}",
                    self.similarity_threshold
                );
                break;
            }

            let merged_size = clusters[i].len() + clusters[j].len();
            if merged_size > self.max_group_size {
                log::debug!(
                    "Stopping: merge would create {merged_size} members (max {})",
                    self.max_group_size
                );
                break;
            }

            let absorbed = clusters.remove(j);
            clusters[i].extend(absorbed);
        }

        Some(
            clusters
                .into_iter()
                .filter(|c| c.len() >= self.min_group_size && c.len() <= self.max_group_size)
                .map(|members| RawCluster {
                    confidence: mean_intra_similarity(&members, matrix),
                    members,
                })
                .collect(),
        )
    }
}

/// First pair with the strictly highest average linkage.
fn best_pair(clusters: &[Vec<usize>], matrix: &SimilarityMatrix) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let linkage = average_linkage(&clusters[i], &clusters[j], matrix);
            if best.map_or(true, |(_, _, b)| linkage > b) {
                best = Some((i, j, linkage));
            }
        }
    }
    best
}

/// Mean of all pairwise similarities between members of `a` and `b`.
pub fn average_linkage(a: &[usize], b: &[usize], matrix: &SimilarityMatrix) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total: f64 = a
        .iter()
        .flat_map(|&x| b.iter().map(move |&y| matrix.get(x, y)))
        .sum();
    total / (a.len() * b.len()) as f64
}

/// Mean similarity over all unordered member pairs; 1.0 for a singleton.
pub fn mean_intra_similarity(members: &[usize], matrix: &SimilarityMatrix) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (k, &x) in members.iter().enumerate() {
        for &y in &members[k + 1..] {
            total += matrix.get(x, y);
            pairs += 1;
        }
    }
    if pairs == 0 {
        return 1.0;
    }
    total / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{i}")).collect()
    }

    fn uniform(n: usize, value: f64) -> SimilarityMatrix {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { value }).collect())
            .collect();
        SimilarityMatrix::from_rows(ids(n), rows).unwrap()
    }

    /// Two tight blocks {0,1,2} and {3,4} with weak cross similarity.
    fn two_blocks() -> SimilarityMatrix {
        let rows = vec![
            vec![1.0, 0.9, 0.85, 0.1, 0.2],
            vec![0.9, 1.0, 0.8, 0.15, 0.1],
            vec![0.85, 0.8, 1.0, 0.2, 0.1],
            vec![0.1, 0.15, 0.2, 1.0, 0.95],
            vec![0.2, 0.1, 0.1, 0.95, 1.0],
        ];
        SimilarityMatrix::from_rows(ids(5), rows).unwrap()
    }

    #[test]
    fn test_two_blocks_form_two_clusters() {
        let result = HierarchicalClusterer::new(0.5, 2, 10).cluster(&two_blocks());
        assert_eq!(result.len(), 2);
        // {3,4} (0.95) merges first, then {0,1} (0.9), then 2 joins {0,1}.
        assert_eq!(result[0].members, vec![0, 1, 2]);
        assert_eq!(result[1].members, vec![3, 4]);
        assert_relative_eq!(result[0].confidence, (0.9 + 0.85 + 0.8) / 3.0, epsilon = 1e-12);
        assert_relative_eq!(result[1].confidence, 0.95);
    }

    #[test]
    fn test_threshold_stops_all_merging() {
        let result = HierarchicalClusterer::new(0.96, 2, 10).cluster(&two_blocks());
        assert!(result.is_empty());
    }

    #[test]
    fn test_min_group_size_drops_small_clusters() {
        let result = HierarchicalClusterer::new(0.5, 3, 10).cluster(&two_blocks());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].members, vec![0, 1, 2]);
    }

    #[test]
    fn test_oversize_merge_halts_entire_loop() {
        // 12 identical photos, max 10: the first oversize candidate stops
        // clustering, leaving the two trailing photos as dropped singletons
        // instead of merging them with each other.
        let result = HierarchicalClusterer::new(0.5, 2, 10).cluster(&uniform(12, 1.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].members, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_oversize_stop_preserves_clusters_already_formed() {
        // Both blocks form first; the {0,1,2}+{3,4} candidate then clears the
        // threshold but exceeds max 3, which ends the loop with both intact.
        let result = HierarchicalClusterer::new(0.1, 2, 3).cluster(&two_blocks());
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.members.len() <= 3));
    }

    #[test]
    fn test_ties_break_on_first_pair() {
        let result = HierarchicalClusterer::new(0.5, 2, 2).cluster(&uniform(4, 0.7));
        // (0,1) wins the first scan; next scan sees [0,1],[2],[3]: pair
        // ({0,1},{2}) would be oversize, so the loop stops.
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].members, vec![0, 1]);
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let clusterer = HierarchicalClusterer::new(0.3, 2, 4);
        let first = clusterer.cluster(&two_blocks());
        for _ in 0..5 {
            assert_eq!(clusterer.cluster(&two_blocks()), first);
        }
    }

    #[test]
    fn test_results_respect_size_bounds() {
        for max in 2..=6 {
            let result = HierarchicalClusterer::new(0.0, 2, max).cluster(&uniform(9, 0.8));
            assert!(result.iter().all(|c| (2..=max).contains(&c.members.len())));
        }
    }

    #[test]
    fn test_cancelled_clustering_returns_none() {
        let cancelled = AtomicBool::new(true);
        let result = HierarchicalClusterer::new(0.5, 2, 10)
            .cluster_cancellable(&uniform(3, 1.0), &cancelled);
        assert!(result.is_none());
    }

    #[test]
    fn test_empty_and_single_inputs() {
        let clusterer = HierarchicalClusterer::new(0.5, 2, 10);
        assert!(clusterer.cluster(&uniform(0, 1.0)).is_empty());
        assert!(clusterer.cluster(&uniform(1, 1.0)).is_empty());
    }

    #[test]
    fn test_average_linkage() {
        let m = two_blocks();
        assert_relative_eq!(average_linkage(&[0, 1], &[2], &m), (0.85 + 0.8) / 2.0);
        assert_relative_eq!(mean_intra_similarity(&[3], &m), 1.0);
    }
}
