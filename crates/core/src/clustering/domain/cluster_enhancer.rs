use crate::clustering::domain::photo_cluster::{ClusterSummary, PhotoCluster, RawCluster, TimeWindow};
use crate::features::domain::grouping_features::GroupingFeatures;

/// Turns raw index clusters into [`PhotoCluster`]s with summary metadata.
///
/// `features` must be indexed the same way as the matrix the raw clusters
/// came from. Cluster ids are `"{session_id}-cluster-{n}"`, 1-based.
pub fn enhance(
    session_id: &str,
    raw: &[RawCluster],
    features: &[GroupingFeatures],
) -> Vec<PhotoCluster> {
    raw.iter()
        .filter(|c| !c.members.is_empty())
        .enumerate()
        .map(|(n, cluster)| {
            let members: Vec<&GroupingFeatures> =
                cluster.members.iter().map(|&i| &features[i]).collect();
            PhotoCluster {
                id: format!("{session_id}-cluster-{}", n + 1),
                member_ids: members.iter().map(|f| f.photo_id.clone()).collect(),
                confidence: cluster.confidence,
                time_window: time_window(&members),
                summary: summarize(&members),
            }
        })
        .collect()
}

fn time_window(members: &[&GroupingFeatures]) -> TimeWindow {
    let first = members[0].captured_at;
    members.iter().fold(
        TimeWindow {
            start: first,
            end: first,
        },
        |window, f| TimeWindow {
            start: window.start.min(f.captured_at),
            end: window.end.max(f.captured_at),
        },
    )
}

fn summarize(members: &[&GroupingFeatures]) -> ClusterSummary {
    let n = members.len() as f64;

    let bins = members
        .iter()
        .map(|f| f.color_histogram.len())
        .max()
        .unwrap_or(0);
    let mut aggregate_histogram = vec![0.0; bins];
    for f in members {
        for (acc, v) in aggregate_histogram.iter_mut().zip(&f.color_histogram) {
            *acc += v / n;
        }
    }

    let mut aspect_ratios: Vec<f64> = members
        .iter()
        .map(|f| (f.aspect_ratio * 100.0).round() / 100.0)
        .collect();
    aspect_ratios.sort_by(f64::total_cmp);
    aspect_ratios.dedup();

    let qualities: Vec<f64> = members.iter().filter_map(|f| f.quality_score).collect();
    let mean_quality_score = if qualities.is_empty() {
        None
    } else {
        Some(qualities.iter().sum::<f64>() / qualities.len() as f64)
    };

    ClusterSummary {
        aggregate_histogram,
        aspect_ratios,
        mean_face_count: members.iter().map(|f| f.face_count as f64).sum::<f64>() / n,
        mean_composition_score: members.iter().map(|f| f.composition_score).sum::<f64>() / n,
        mean_quality_score,
    }
}
