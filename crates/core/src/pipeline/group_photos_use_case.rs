use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::clustering::domain::cluster_enhancer;
use crate::clustering::domain::hierarchical_clusterer::HierarchicalClusterer;
use crate::clustering::domain::photo_cluster::PhotoCluster;
use crate::features::domain::feature_extractor::{self, FeatureExtractor};
use crate::features::domain::grouping_features::GroupingFeatures;
use crate::features::domain::pixel_decoder::PixelDecoder;
use crate::pipeline::capabilities::{CapabilityDescriptor, DependencyReport};
use crate::pipeline::grouping_error::GroupingError;
use crate::pipeline::grouping_options::GroupingOptions;
use crate::pipeline::grouping_progress::{GroupingProgress, GroupingStep, ProgressStatus};
use crate::pipeline::infrastructure::process_memory_monitor::ProcessMemoryMonitor;
use crate::pipeline::memory_monitor::MemoryMonitor;
use crate::pipeline::photo_catalog::PhotoCatalog;
use crate::pipeline::progress_registry::{ProgressListener, ProgressRegistry, Subscription};
use crate::pipeline::retry_policy::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::pipeline::stage_timings::StageTimings;
use crate::shared::photo::PhotoRecord;
use crate::similarity::domain::similarity_matrix::SimilarityMatrix;

pub const DEFAULT_MEMORY_THRESHOLD_BYTES: u64 = 1024 * 1024 * 1024;

/// Construction-time settings of a [`GroupingOrchestrator`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub capabilities: CapabilityDescriptor,
    /// Resident memory above which a reclaim is requested after a batch.
    pub memory_threshold_bytes: u64,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capabilities: CapabilityDescriptor::default(),
            memory_threshold_bytes: DEFAULT_MEMORY_THRESHOLD_BYTES,
            retry: RetryPolicy::default(),
        }
    }
}

/// Groups one session's photos into burst / near-duplicate clusters.
///
/// One run: load photos → extract features in batches → pairwise similarity
/// → agglomerative clustering → cluster summaries. Progress is pushed to
/// listeners subscribed for the session. Transient failures restart the
/// whole run with smaller batches and a lower threshold, per [`RetryPolicy`].
///
/// The orchestrator holds no per-run state, so concurrent `group` calls for
/// different sessions are independent.
pub struct GroupingOrchestrator {
    catalog: Box<dyn PhotoCatalog>,
    extractor: FeatureExtractor,
    config: EngineConfig,
    registry: Arc<ProgressRegistry>,
    memory: Box<dyn MemoryMonitor>,
    sleeper: Box<dyn Sleeper>,
}

impl GroupingOrchestrator {
    pub fn new(
        catalog: Box<dyn PhotoCatalog>,
        decoder: Arc<dyn PixelDecoder>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            extractor: FeatureExtractor::new(decoder),
            config,
            registry: Arc::new(ProgressRegistry::new()),
            memory: Box::new(ProcessMemoryMonitor::new()),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_memory_monitor(mut self, memory: Box<dyn MemoryMonitor>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Reports which required capabilities are missing, without side effects.
    pub fn check_dependencies(&self) -> DependencyReport {
        self.config.capabilities.report()
    }

    /// Registers `listener` for progress events of `session_id`.
    ///
    /// Listeners run synchronously on the thread calling [`group`](Self::group).
    /// Slow consumers should subscribe the listener half of
    /// [`channel_listener`](crate::pipeline::progress_registry::channel_listener),
    /// which never blocks and drops events once its buffer is full.
    pub fn subscribe(&self, session_id: &str, listener: ProgressListener) -> Subscription {
        self.registry.subscribe(session_id, listener)
    }

    pub fn group(
        &self,
        session_id: &str,
        options: &GroupingOptions,
    ) -> Result<Vec<PhotoCluster>, GroupingError> {
        let never = AtomicBool::new(false);
        self.group_cancellable(session_id, options, &never)
    }

    /// Like [`group`](Self::group), stopping with [`GroupingError::Cancelled`]
    /// once `cancelled` is set. The flag is checked between feature batches
    /// and between clustering merges.
    pub fn group_cancellable(
        &self,
        session_id: &str,
        options: &GroupingOptions,
        cancelled: &AtomicBool,
    ) -> Result<Vec<PhotoCluster>, GroupingError> {
        options.validate()?;

        let report = self.check_dependencies();
        if !report.available {
            log::warn!(
                "Session {session_id}: missing capabilities {}",
                report.missing.join(", ")
            );
            return Err(GroupingError::DependencyUnavailable {
                missing: report.missing,
            });
        }

        let policy = &self.config.retry;
        let mut progress = ProgressEmitter::new(&self.registry, session_id);
        let mut attempt_options = options.clone();
        let mut retries = 0;

        loop {
            match self.run_attempt(session_id, &attempt_options, cancelled, &mut progress) {
                Ok(clusters) => return Ok(clusters),
                Err(e) if e.is_retryable() && retries < policy.max_retries => {
                    retries += 1;
                    let delay = policy.delay_for(retries);
                    attempt_options = policy.relax(&attempt_options);
                    log::warn!(
                        "Session {session_id}: attempt {retries} failed ({e}); retrying in {:?} \
                         with batch_size={} similarity_threshold={:.2}",
                        delay,
                        attempt_options.batch_size,
                        attempt_options.similarity_threshold
                    );
                    progress.retrying(retries, policy.max_retries, &e);
                    self.sleeper.sleep(delay);
                }
                Err(e) => {
                    log::warn!("Session {session_id}: grouping failed ({}): {e}", e.kind());
                    if progress.has_published() || !matches!(e, GroupingError::Validation(_)) {
                        progress.failed(&e);
                    }
                    return Err(e);
                }
            }
        }
    }

    fn run_attempt(
        &self,
        session_id: &str,
        options: &GroupingOptions,
        cancelled: &AtomicBool,
        progress: &mut ProgressEmitter<'_>,
    ) -> Result<Vec<PhotoCluster>, GroupingError> {
        let mut timings = StageTimings::new();

        let photos = self.catalog.photos(session_id)?;
        options.validate_photo_count(photos.len())?;
        let total = photos.len();
        log::info!(
            "Session {session_id}: grouping {total} photos (batch_size={}, threshold={:.2})",
            options.batch_size,
            options.similarity_threshold
        );

        progress.processing(
            GroupingStep::ExtractingFeatures,
            0,
            total,
            format!("Extracting features from {total} photos"),
        );
        let extract_start = Instant::now();
        let mut features = self.extract_all(&photos, options.batch_size, cancelled, progress)?;
        timings.record(GroupingStep::ExtractingFeatures, extract_start.elapsed());

        features.sort_by_key(|f| f.captured_at);

        progress.processing(
            GroupingStep::CalculatingSimilarity,
            0,
            1,
            "Calculating pairwise similarity".to_string(),
        );
        let matrix = timings.time(GroupingStep::CalculatingSimilarity, || {
            SimilarityMatrix::build(&features, &options.weights)
        });
        progress.processing(
            GroupingStep::CalculatingSimilarity,
            1,
            1,
            format!("Compared {} photo pairs", total * total.saturating_sub(1) / 2),
        );

        progress.processing(GroupingStep::Clustering, 0, 1, "Clustering photos".to_string());
        let clusterer = HierarchicalClusterer::new(
            options.similarity_threshold,
            options.min_group_size,
            options.max_group_size,
        );
        let raw = timings
            .time(GroupingStep::Clustering, || {
                clusterer.cluster_cancellable(&matrix, cancelled)
            })
            .ok_or(GroupingError::Cancelled)?;
        progress.processing(
            GroupingStep::Clustering,
            1,
            1,
            format!("Found {} candidate groups", raw.len()),
        );

        progress.processing(
            GroupingStep::CreatingGroups,
            0,
            raw.len(),
            "Summarizing groups".to_string(),
        );
        let clusters = timings.time(GroupingStep::CreatingGroups, || {
            cluster_enhancer::enhance(session_id, &raw, &features)
        });
        progress.processing(
            GroupingStep::CreatingGroups,
            clusters.len(),
            clusters.len(),
            format!("Created {} groups", clusters.len()),
        );

        if let Some(summary) = timings.summary_string(total) {
            log::info!("Session {session_id}: {summary}");
        }
        progress.completed(clusters.len());
        Ok(clusters)
    }

    fn extract_all(
        &self,
        photos: &[PhotoRecord],
        batch_size: usize,
        cancelled: &AtomicBool,
        progress: &mut ProgressEmitter<'_>,
    ) -> Result<Vec<GroupingFeatures>, GroupingError> {
        let total = photos.len();
        let mut features = Vec::with_capacity(total);

        for batch in photos.chunks(batch_size.max(1)) {
            if cancelled.load(Ordering::Relaxed) {
                return Err(GroupingError::Cancelled);
            }
            features.extend(self.extract_batch(batch));
            self.check_memory();
            progress.processing(
                GroupingStep::ExtractingFeatures,
                features.len(),
                total,
                format!("Extracted features for {}/{total} photos", features.len()),
            );
        }

        let degraded = features.iter().filter(|f| f.degraded).count();
        if degraded > 0 {
            log::warn!("{degraded} of {total} photos fell back to basic features");
        }
        Ok(features)
    }

    /// Extracts one batch concurrently, one scoped thread per photo.
    /// Output order matches input order.
    fn extract_batch(&self, batch: &[PhotoRecord]) -> Vec<GroupingFeatures> {
        let extractor = &self.extractor;
        if batch.len() == 1 {
            return vec![extractor.extract(&batch[0])];
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|photo| scope.spawn(move || extractor.extract(photo)))
                .collect();

            handles
                .into_iter()
                .zip(batch)
                .map(|(handle, photo)| {
                    handle.join().unwrap_or_else(|_| {
                        log::warn!("Feature extraction panicked for photo {}", photo.id);
                        feature_extractor::basic(photo)
                    })
                })
                .collect()
        })
    }

    fn check_memory(&self) {
        let Some(used) = self.memory.usage_bytes() else {
            return;
        };
        if used > self.config.memory_threshold_bytes {
            log::warn!(
                "Memory usage {} MiB exceeds threshold {} MiB, requesting reclaim",
                used / (1024 * 1024),
                self.config.memory_threshold_bytes / (1024 * 1024)
            );
            self.memory.reclaim();
        }
    }
}

/// Builds and publishes progress events for one `group` call.
///
/// Keeps a high-water mark so percentages never go backwards, including
/// across retries. Once any event has gone out, every failure ends with a
/// terminal error event.
struct ProgressEmitter<'a> {
    registry: &'a ProgressRegistry,
    session_id: &'a str,
    step: GroupingStep,
    processed: usize,
    total: usize,
    percentage: f64,
    published: bool,
}

impl<'a> ProgressEmitter<'a> {
    fn new(registry: &'a ProgressRegistry, session_id: &'a str) -> Self {
        Self {
            registry,
            session_id,
            step: GroupingStep::ExtractingFeatures,
            processed: 0,
            total: 0,
            percentage: 0.0,
            published: false,
        }
    }

    fn has_published(&self) -> bool {
        self.published
    }

    fn processing(&mut self, step: GroupingStep, processed: usize, total: usize, message: String) {
        self.step = step;
        self.processed = processed;
        self.total = total;
        self.percentage = self.percentage.max(step.percentage(processed, total));
        self.publish(step, ProgressStatus::Processing, message);
    }

    fn retrying(&mut self, retry: u32, max_retries: u32, error: &GroupingError) {
        self.publish(
            self.step,
            ProgressStatus::Retrying,
            format!("Retry {retry}/{max_retries} after: {error}"),
        );
    }

    fn completed(&mut self, groups: usize) {
        self.percentage = 100.0;
        self.publish(
            GroupingStep::Complete,
            ProgressStatus::Completed,
            format!("Grouping complete: {groups} groups"),
        );
    }

    fn failed(&mut self, error: &GroupingError) {
        self.publish(GroupingStep::Error, ProgressStatus::Failed, error.to_string());
    }

    fn publish(&mut self, step: GroupingStep, status: ProgressStatus, message: String) {
        self.published = true;
        log::debug!("Session {} {step} {:.1}%: {message}", self.session_id, self.percentage);
        self.registry.emit(&GroupingProgress {
            session_id: self.session_id.to_string(),
            step,
            processed: self.processed,
            total: self.total,
            percentage: self.percentage,
            status,
            message,
        });
    }
}
