use std::fmt;

use serde::Serialize;

/// Pipeline stage a progress event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStep {
    ExtractingFeatures,
    CalculatingSimilarity,
    Clustering,
    CreatingGroups,
    Complete,
    Error,
}

impl GroupingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingStep::ExtractingFeatures => "extracting_features",
            GroupingStep::CalculatingSimilarity => "calculating_similarity",
            GroupingStep::Clustering => "clustering",
            GroupingStep::CreatingGroups => "creating_groups",
            GroupingStep::Complete => "complete",
            GroupingStep::Error => "error",
        }
    }

    /// Percentage range this stage covers.
    pub fn span(&self) -> (f64, f64) {
        match self {
            GroupingStep::ExtractingFeatures => (0.0, 30.0),
            GroupingStep::CalculatingSimilarity => (30.0, 60.0),
            GroupingStep::Clustering => (60.0, 80.0),
            GroupingStep::CreatingGroups => (80.0, 100.0),
            GroupingStep::Complete => (100.0, 100.0),
            GroupingStep::Error => (0.0, 100.0),
        }
    }

    /// Percentage after `done` of `total` units of this stage.
    pub fn percentage(&self, done: usize, total: usize) -> f64 {
        let (start, end) = self.span();
        if total == 0 {
            return end;
        }
        start + (end - start) * (done.min(total) as f64 / total as f64)
    }
}

impl fmt::Display for GroupingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Processing,
    Retrying,
    Completed,
    Failed,
}

/// One progress event of a grouping run. Never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupingProgress {
    pub session_id: String,
    pub step: GroupingStep,
    pub processed: usize,
    pub total: usize,
    pub percentage: f64,
    pub status: ProgressStatus,
    pub message: String,
}
