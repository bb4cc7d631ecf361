//! Command-line front end: load a queue configuration, sweep policies and parameters,
//! and export the results.
//!
//! Run with: cargo run -p queue_experiments --bin queue_sim -- --config configs/queue_mdp/mdp_config_0.json

use std::fs;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, ValueEnum};
use queue_core::policy::PolicyKind;
use queue_core::QueueConfig;
use queue_experiments::parameters::DEFAULT_MAX_EVENTS;
use queue_experiments::runner::{run_parallel_experiments_with_progress, run_single_episode_with_artifacts};
use queue_experiments::{
    export_summaries_to_csv, export_to_csv, export_to_json, export_to_parquet, find_best_parameters,
    summarize_experiments, ParameterSpace,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "queue_sim",
    about = "Run queueing-policy experiments on a multi-class queue configuration"
)]
struct Cli {
    /// Path to the JSON queue configuration
    #[arg(long)]
    config: PathBuf,
    /// Policies to compare
    #[arg(long, value_delimiter = ',', default_value = "greedy,fifo,idle")]
    policy: Vec<PolicyKind>,
    /// Arrival-rate multipliers to explore
    #[arg(long, value_delimiter = ',')]
    arrival_scale: Vec<f64>,
    /// Tick rates to explore (default: the configured rate)
    #[arg(long, value_delimiter = ',')]
    tick_rate: Vec<f64>,
    /// Discount factors to explore (default: the configured factor)
    #[arg(long, value_delimiter = ',')]
    discount_factor: Vec<f64>,
    /// Independently seeded runs per combination
    #[arg(long, default_value_t = 4)]
    replications: usize,
    /// Stochastic events per episode
    #[arg(long, default_value_t = DEFAULT_MAX_EVENTS)]
    max_events: u64,
    /// Base seed for replication seeds
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Sample this many random combinations instead of the full grid
    #[arg(long)]
    random_samples: Option<usize>,
    /// Worker threads (default: one per core)
    #[arg(long, env = "QUEUE_SIM_THREADS")]
    threads: Option<usize>,
    /// Directory for exported results
    #[arg(long, default_value = "queue_sim_results")]
    output_dir: PathBuf,
    /// Result file format
    #[arg(value_enum, long, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
    /// Also export the step trace of the first episode, keeping this many trailing steps
    #[arg(long)]
    trace_steps: Option<usize>,
    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Parquet,
}

impl OutputFormat {
    fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "results.csv",
            Self::Json => "results.json",
            Self::Parquet => "results.parquet",
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = fs::read_to_string(&cli.config)
        .map_err(|e| format!("failed to read {}: {e}", cli.config.display()))?;
    let base = QueueConfig::from_json_str(&json)?;
    base.validate()?;

    let space = ParameterSpace::grid(base)
        .policy(cli.policy)
        .arrival_scale(cli.arrival_scale)
        .tick_rate(cli.tick_rate)
        .discount_factor(cli.discount_factor)
        .replications(cli.replications)
        .max_events(cli.max_events)
        .base_seed(cli.seed);
    let parameter_sets = match cli.random_samples {
        Some(count) => space.sample_random(count, cli.seed),
        None => space.generate(),
    };
    info!(
        config = %cli.config.display(),
        episodes = parameter_sets.len(),
        max_events = cli.max_events,
        "starting sweep"
    );

    let results = run_parallel_experiments_with_progress(&parameter_sets, cli.threads, !cli.quiet)?;
    let summaries = summarize_experiments(&results, &parameter_sets);

    fs::create_dir_all(&cli.output_dir)?;
    let results_path = cli.output_dir.join(cli.format.file_name());
    match cli.format {
        OutputFormat::Csv => export_to_csv(&results, &parameter_sets, &results_path)?,
        OutputFormat::Json => export_to_json(&results, &results_path)?,
        OutputFormat::Parquet => export_to_parquet(&results, &results_path)?,
    }
    export_summaries_to_csv(&summaries, cli.output_dir.join("summary.csv"))?;
    info!(path = %results_path.display(), "results exported");

    if let (Some(max_records), Some(first)) = (cli.trace_steps, parameter_sets.first()) {
        let artifacts = run_single_episode_with_artifacts(first, max_records)?;
        let trace_path = cli.output_dir.join("step_trace.parquet");
        fs::write(&trace_path, artifacts.step_trace_parquet)?;
        info!(path = %trace_path.display(), "step trace exported");
    }

    println!("\n=== Experiment Summary ===");
    for summary in &summaries {
        println!(
            "  {:10} policy={:6} scale={:<5} tick={:<5} runs={}  avg cost {:.4} (median {:.4}, p90 {:.4})",
            summary.experiment_id,
            summary.policy.name(),
            summary.arrival_scale,
            summary.tick_rate,
            summary.runs,
            summary.mean_average_cost,
            summary.median_average_cost,
            summary.p90_average_cost,
        );
    }
    if let Some(best) = find_best_parameters(&summaries, &parameter_sets) {
        println!(
            "\nBest: {} ({} at arrival scale {})",
            best.experiment_id,
            best.policy().name(),
            best.combination.arrival_scale
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        exit(1);
    }
}
