use std::time::{Duration, Instant};

use crate::pipeline::grouping_progress::GroupingStep;

/// Wall-clock duration of each pipeline stage in one grouping attempt.
pub struct StageTimings {
    started: Instant,
    stages: Vec<(GroupingStep, Duration)>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stages: Vec::new(),
        }
    }

    /// Runs `f` and records how long it took under `step`.
    pub fn time<T>(&mut self, step: GroupingStep, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(step, start.elapsed());
        out
    }

    pub fn record(&mut self, step: GroupingStep, duration: Duration) {
        match self.stages.iter_mut().find(|(s, _)| *s == step) {
            Some((_, total)) => *total += duration,
            None => self.stages.push((step, duration)),
        }
    }

    pub fn duration_of(&self, step: GroupingStep) -> Option<Duration> {
        self.stages
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, d)| *d)
    }

    /// One-line report, or `None` if nothing was recorded.
    pub fn summary_string(&self, photos: usize) -> Option<String> {
        if self.stages.is_empty() {
            return None;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let parts: Vec<String> = self
            .stages
            .iter()
            .map(|(step, d)| format!("{step} {:.1}ms", d.as_secs_f64() * 1000.0))
            .collect();
        Some(format!(
            "Grouped {photos} photos in {elapsed_ms:.1}ms ({})",
            parts.join(", ")
        ))
    }
}

impl Default for StageTimings {
    fn default() -> Self {
        Self::new()
    }
}
