use std::time::Duration;

use crate::pipeline::grouping_options::GroupingOptions;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_BATCH_FLOOR: usize = 3;
pub const DEFAULT_THRESHOLD_STEP: f64 = 0.1;
pub const DEFAULT_THRESHOLD_FLOOR: f64 = 0.0;

/// Whole-run retry schedule for transient failures.
///
/// Each retry waits `base_delay * 2^n` (capped at `max_delay`), halves the
/// batch size down to `batch_floor`, and lowers the similarity threshold by
/// `threshold_step` down to `threshold_floor`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub batch_floor: usize,
    pub threshold_step: f64,
    pub threshold_floor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            batch_floor: DEFAULT_BATCH_FLOOR,
            threshold_step: DEFAULT_THRESHOLD_STEP,
            threshold_floor: DEFAULT_THRESHOLD_FLOOR,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Options for the next attempt after a transient failure.
    ///
    /// The batch size never grows: a batch already below the floor stays put.
    pub fn relax(&self, options: &GroupingOptions) -> GroupingOptions {
        let halved = (options.batch_size / 2).max(self.batch_floor);
        GroupingOptions {
            batch_size: halved.min(options.batch_size),
            similarity_threshold: (options.similarity_threshold - self.threshold_step)
                .max(self.threshold_floor),
            ..options.clone()
        }
    }
}

/// Waits between retries. Injected so tests do not sleep.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
