use chrono::{DateTime, Utc};
use serde::Serialize;

/// Capture-time span covered by a cluster's members.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

/// Aggregate features describing a cluster as a whole.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterSummary {
    /// Element-wise mean of the member histograms.
    pub aggregate_histogram: Vec<f64>,
    /// Distinct member aspect ratios, rounded to two decimals, ascending.
    pub aspect_ratios: Vec<f64>,
    pub mean_face_count: f64,
    pub mean_composition_score: f64,
    /// Mean of the prior quality scores that are known, if any.
    pub mean_quality_score: Option<f64>,
}

/// A group of near-duplicate or burst photos returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhotoCluster {
    pub id: String,
    /// Member photo ids in merge order.
    pub member_ids: Vec<String>,
    /// Mean pairwise similarity between members.
    pub confidence: f64,
    pub time_window: TimeWindow,
    pub summary: ClusterSummary,
}

impl PhotoCluster {
    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}

/// Cluster membership as produced by the clusterer, before enhancement.
///
/// Members are matrix indices.
#[derive(Clone, Debug, PartialEq)]
pub struct RawCluster {
    pub members: Vec<usize>,
    pub confidence: f64,
}
