use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use burst_grouper_core::clustering::domain::photo_cluster::PhotoCluster;
use burst_grouper_core::features::infrastructure::image_file_decoder::ImageFileDecoder;
use burst_grouper_core::pipeline::group_photos_use_case::{EngineConfig, GroupingOrchestrator};
use burst_grouper_core::pipeline::grouping_options::GroupingOptions;
use burst_grouper_core::pipeline::grouping_progress::{GroupingProgress, ProgressStatus};
use burst_grouper_core::pipeline::infrastructure::json_photo_catalog::JsonPhotoCatalog;
use burst_grouper_core::pipeline::infrastructure::process_memory_monitor::ProcessMemoryMonitor;
use burst_grouper_core::pipeline::retry_policy::{RetryPolicy, ThreadSleeper};
use burst_grouper_core::shared::constants::ANALYSIS_MAX_EDGE;

/// Groups burst and near-duplicate photos of a session into clusters.
#[derive(Parser)]
#[command(name = "burst-group")]
struct Cli {
    /// JSON manifest mapping session ids to photo records.
    manifest: PathBuf,

    /// Session to group (optional when the manifest holds exactly one).
    #[arg(long)]
    session: Option<String>,

    /// JSON file with grouping options; flags below override it.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Minimum average similarity for a merge (0.0-1.0).
    #[arg(long)]
    threshold: Option<f64>,

    /// Smallest cluster kept in the result.
    #[arg(long)]
    min_size: Option<usize>,

    /// Largest cluster the clusterer may form.
    #[arg(long)]
    max_size: Option<usize>,

    /// Photos analyzed concurrently per batch (1-50).
    #[arg(long)]
    batch_size: Option<usize>,

    /// Longest image edge used for analysis, in pixels.
    #[arg(long, default_value_t = ANALYSIS_MAX_EDGE)]
    max_edge: u32,

    /// Fail on the first transient error instead of retrying.
    #[arg(long)]
    no_retry: bool,

    /// Write clusters here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if !cli.manifest.exists() {
        return Err(format!("Manifest not found: {}", cli.manifest.display()).into());
    }

    let catalog = JsonPhotoCatalog::load(&cli.manifest)?;
    let session_id = pick_session(&catalog, cli.session.as_deref())?;
    let options = build_options(&cli)?;

    let config = EngineConfig {
        retry: if cli.no_retry {
            RetryPolicy::none()
        } else {
            RetryPolicy::default()
        },
        ..EngineConfig::default()
    };
    let orchestrator = GroupingOrchestrator::new(
        Box::new(catalog),
        Arc::new(ImageFileDecoder::new(cli.max_edge)),
        config,
    )
    .with_memory_monitor(Box::new(ProcessMemoryMonitor::new()))
    .with_sleeper(Box::new(ThreadSleeper));

    let subscription = orchestrator.subscribe(&session_id, Arc::new(report_progress));
    let result = orchestrator.group(&session_id, &options);
    subscription.unsubscribe();
    eprintln!();
    let clusters = result?;

    log::info!(
        "Session {session_id}: {} groups covering {} photos",
        clusters.len(),
        clusters.iter().map(PhotoCluster::len).sum::<usize>()
    );
    write_clusters(&clusters, cli.output.as_deref())
}

fn pick_session(
    catalog: &JsonPhotoCatalog,
    requested: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(session) = requested {
        return Ok(session.to_string());
    }
    match catalog.session_ids().as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err("Manifest contains no sessions".into()),
        many => Err(format!(
            "Manifest has {} sessions ({}); choose one with --session",
            many.len(),
            many.join(", ")
        )
        .into()),
    }
}

fn build_options(cli: &Cli) -> Result<GroupingOptions, Box<dyn std::error::Error>> {
    let mut options = match &cli.options {
        Some(path) => read_options(path)?,
        None => GroupingOptions::default(),
    };
    if let Some(threshold) = cli.threshold {
        options.similarity_threshold = threshold;
    }
    if let Some(min) = cli.min_size {
        options.min_group_size = min;
    }
    if let Some(max) = cli.max_size {
        options.max_group_size = max;
    }
    if let Some(batch) = cli.batch_size {
        options.batch_size = batch;
    }
    Ok(options)
}

fn read_options(path: &Path) -> Result<GroupingOptions, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read options file {}: {e}", path.display()))?;
    let options = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid options file {}: {e}", path.display()))?;
    Ok(options)
}

fn report_progress(event: &GroupingProgress) {
    match event.status {
        ProgressStatus::Processing => {
            eprint!("\r[{:5.1}%] {:<60}", event.percentage, event.message);
        }
        ProgressStatus::Retrying => {
            eprintln!();
            log::warn!("{}", event.message);
        }
        ProgressStatus::Completed => {
            eprint!("\r[100.0%] {:<60}", event.message);
        }
        ProgressStatus::Failed => {
            eprintln!();
            log::error!("{}: {}", event.step, event.message);
        }
    }
    log::info!(
        "{} {}/{} ({:.1}%)",
        event.step,
        event.processed,
        event.total,
        event.percentage
    );
}

fn write_clusters(
    clusters: &[PhotoCluster],
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(clusters)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Clusters written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
