//! Parallel experimentation framework for queueing-policy sweeps.
//!
//! Runs many episodes of the queueing decision process in parallel, each with its own
//! arrival scale, tick rate, discount factor, policy and seed, and collects per-episode
//! cost and utilisation metrics.
//!
//! # Quick Start
//!
//! ```no_run
//! use queue_core::policy::PolicyKind;
//! use queue_core::QueueConfig;
//! use queue_experiments::{find_best_result_index, run_parallel_experiments, ParameterSpace};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("configs/queue_mdp/mdp_config_0.json")?;
//! let base = QueueConfig::from_json_str(&json)?;
//! let space = ParameterSpace::grid(base)
//!     .arrival_scale(vec![0.5, 1.0, 1.5])
//!     .policy(vec![PolicyKind::Greedy, PolicyKind::Fifo])
//!     .replications(4);
//!
//! let parameter_sets = space.generate();
//! let results = run_parallel_experiments(&parameter_sets, None)?;
//! let best_idx = find_best_result_index(&results);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: Parameter variation framework (grid search, random sampling)
//! - [`runner`]: Parallel episode execution using rayon
//! - [`metrics`]: Metrics extraction from episode telemetry
//! - [`export`]: Result export to CSV/JSON/Parquet and ranking

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;

pub use export::{
    export_summaries_to_csv, export_to_csv, export_to_json, export_to_parquet, find_best_parameters,
    find_best_result_index,
};
pub use metrics::{summarize_experiments, EpisodeResult, ExperimentSummary};
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::run_parallel_experiments;
