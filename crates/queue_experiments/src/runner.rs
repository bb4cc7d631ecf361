//! Parallel episode execution using rayon.
//!
//! Each parameter set builds its own decision process and episode; nothing is shared
//! between workers.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use indicatif::{ProgressBar, ProgressStyle};
use queue_core::runner::{run_episode, Episode};
use queue_core::telemetry::TraceConfig;
use queue_core::telemetry_export::write_step_trace_parquet;
use queue_core::QueueMdp;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::metrics::{extract_metrics, EpisodeResult};
use crate::parameters::ParameterSet;

/// Metrics plus the exported step trace of one episode.
#[derive(Debug, Clone)]
pub struct EpisodeArtifacts {
    pub metrics: EpisodeResult,
    pub step_trace_parquet: Vec<u8>,
}

/// Runs one parameter set and returns its metrics together with the step trace,
/// keeping at most `max_trace_records` trailing steps.
pub fn run_single_episode_with_artifacts(
    param_set: &ParameterSet,
    max_trace_records: usize,
) -> Result<EpisodeArtifacts, String> {
    let (episode, metrics) = execute(param_set, TraceConfig::enabled(max_trace_records))?;
    let step_trace_parquet = serialize_to_parquet_bytes(
        |path| write_step_trace_parquet(path, &episode.telemetry),
        &param_set.experiment_id,
        param_set.run_id,
        "step-trace",
    )?;
    Ok(EpisodeArtifacts {
        metrics,
        step_trace_parquet,
    })
}

/// Run a single episode with the given parameter set.
pub fn run_single_episode(param_set: &ParameterSet) -> Result<EpisodeResult, String> {
    execute(param_set, TraceConfig::default()).map(|(_, metrics)| metrics)
}

fn execute(param_set: &ParameterSet, trace: TraceConfig) -> Result<(Episode, EpisodeResult), String> {
    let config = param_set.queue_config();
    let mdp = QueueMdp::new(&config)
        .map_err(|error| format!("{}: invalid configuration: {error}", param_set.experiment_id))?;
    let policy = param_set.policy().build();

    let mut episode = Episode::with_trace(&mdp, param_set.seed, trace);
    run_episode(&mdp, &mut episode, policy.as_ref(), param_set.max_events).map_err(|error| {
        format!(
            "{} run {}: episode failed: {error}",
            param_set.experiment_id, param_set.run_id
        )
    })?;

    let metrics = extract_metrics(&episode.telemetry);
    debug!(
        experiment = %param_set.experiment_id,
        run = param_set.run_id,
        average_cost = metrics.average_cost,
        "episode finished"
    );
    Ok((episode, metrics))
}

fn serialize_to_parquet_bytes<F>(
    write_fn: F,
    id: &str,
    index: usize,
    suffix: &str,
) -> Result<Vec<u8>, String>
where
    F: FnOnce(&std::path::Path) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut temp_path = std::env::temp_dir();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|error| format!("Failed to read clock for parquet export: {error}"))?
        .as_nanos();
    temp_path.push(format!("queue-experiment-{id}-{index}-{suffix}-{timestamp}.parquet"));

    write_fn(&temp_path).map_err(|error| format!("Parquet export failed: {error}"))?;
    let bytes = fs::read(&temp_path)
        .map_err(|error| format!("Failed to read exported parquet file: {error}"))?;
    let _ = fs::remove_file(&temp_path);
    Ok(bytes)
}

/// Run multiple episodes in parallel.
///
/// Results come back in the order of `parameter_sets`. `num_threads` of `None` uses
/// rayon's default.
pub fn run_parallel_experiments(
    parameter_sets: &[ParameterSet],
    num_threads: Option<usize>,
) -> Result<Vec<EpisodeResult>, String> {
    run_parallel_experiments_with_progress(parameter_sets, num_threads, true)
}

/// [`run_parallel_experiments`] with an optional progress bar.
pub fn run_parallel_experiments_with_progress(
    parameter_sets: &[ParameterSet],
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<EpisodeResult>, String> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map_err(|error| format!("Invalid progress template: {error}"))?
            .progress_chars("#>-");
        bar.set_style(style);
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|error| format!("Failed to create thread pool: {error}"))?;

    info!(episodes = total, threads = pool.current_num_threads(), "running experiments");
    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_episode(param_set);
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect::<Result<Vec<_>, _>>()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    results
}
