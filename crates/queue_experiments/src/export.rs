//! Result export and analysis utilities.
//!
//! Writes experiment results to CSV, JSON and Parquet, and ranks parameter
//! combinations by average cost.

use std::path::Path;

use crate::metrics::{EpisodeResult, ExperimentSummary};
use crate::parameters::ParameterSet;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export episode results to Parquet, one row per episode.
///
/// # Errors
///
/// Returns an error if `results` is empty or if file creation or Parquet writing fails.
pub fn export_to_parquet(
    results: &[EpisodeResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

/// Export episode results as a pretty-printed JSON array.
pub fn export_to_json(
    results: &[EpisodeResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export episode results with their parameters to CSV.
///
/// Parameters and results are paired by index.
///
/// # Errors
///
/// Returns an error if file creation or CSV writing fails, or if the lengths differ.
pub fn export_to_csv(
    results: &[EpisodeResult],
    parameter_sets: &[ParameterSet],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, parameter_sets, file)
}

/// Export per-experiment summaries to CSV.
pub fn export_summaries_to_csv(
    summaries: &[ExperimentSummary],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(summaries)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_summaries_to_csv_impl(summaries, file)
}

/// Index of the episode with the lowest average cost, or `None` if `results` is empty.
pub fn find_best_result_index(results: &[EpisodeResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.average_cost.total_cmp(&b.average_cost))
        .map(|(idx, _)| idx)
}

/// The parameter set of the lowest-cost experiment, comparing replication means.
///
/// Returns `None` if the inputs are empty or their lengths differ.
pub fn find_best_parameters<'a>(
    summaries: &[ExperimentSummary],
    parameter_sets: &'a [ParameterSet],
) -> Option<&'a ParameterSet> {
    let best = summaries
        .iter()
        .min_by(|a, b| a.mean_average_cost.total_cmp(&b.mean_average_cost))?;
    parameter_sets
        .iter()
        .find(|set| set.experiment_id == best.experiment_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::summarize_experiments;
    use crate::parameters::ParameterSpace;
    use queue_core::policy::PolicyKind;
    use queue_core::test_helpers::two_pool_config;
    use tempfile::NamedTempFile;

    fn result(average_cost: f64) -> EpisodeResult {
        EpisodeResult {
            events_processed: 100,
            arrivals: 20,
            arrivals_blocked: 5,
            ticks: 40,
            completions: 15,
            self_transitions: 25,
            actions_executed: 15,
            actions_skipped: 3,
            total_cost: average_cost * 100.0,
            discounted_cost: average_cost * 90.0,
            average_cost,
            blocking_rate: 0.25,
            mean_waiting_classes: 1.2,
            mean_busy_servers: 0.8,
        }
    }

    fn sets() -> Vec<ParameterSet> {
        ParameterSpace::grid(two_pool_config([1, 1]))
            .policy(vec![PolicyKind::Idle, PolicyKind::Greedy])
            .generate()
    }

    #[test]
    fn test_export_to_json() {
        let results = vec![result(1.5)];
        let file = NamedTempFile::new().unwrap();
        export_to_json(&results, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("average_cost"));
        assert!(contents.contains("blocking_rate"));
    }

    #[test]
    fn test_export_to_csv_pairs_parameters() {
        let results = vec![result(4.0), result(1.0)];
        let file = NamedTempFile::new().unwrap();
        export_to_csv(&results, &sets(), file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("experiment_id,run_id,seed,policy"));
        assert!(lines[1].starts_with("exp_0,0,"));
        assert!(lines[1].contains(",idle,"));
        assert!(lines[2].contains(",greedy,"));
    }

    #[test]
    fn test_export_to_csv_rejects_length_mismatch() {
        let file = NamedTempFile::new().unwrap();
        assert!(export_to_csv(&[result(1.0)], &sets(), file.path()).is_err());
    }

    #[test]
    fn test_export_rejects_empty_results() {
        let file = NamedTempFile::new().unwrap();
        assert!(export_to_parquet(&[], file.path()).is_err());
    }

    #[test]
    fn test_export_to_parquet() {
        let results = vec![result(1.0), result(2.0), result(3.0)];
        let file = NamedTempFile::new().unwrap();
        export_to_parquet(&results, file.path()).unwrap();
        assert!(std::fs::metadata(file.path()).unwrap().len() > 0);
    }

    #[test]
    fn test_find_best_result_index() {
        let results = vec![result(3.0), result(0.5), result(2.0)];
        assert_eq!(find_best_result_index(&results), Some(1));
        assert_eq!(find_best_result_index(&[]), None);
    }

    #[test]
    fn test_find_best_parameters() {
        let sets = sets();
        let results = vec![result(4.0), result(1.0)];
        let summaries = summarize_experiments(&results, &sets);
        let best = find_best_parameters(&summaries, &sets).unwrap();
        assert_eq!(best.policy(), PolicyKind::Greedy);
    }
}
