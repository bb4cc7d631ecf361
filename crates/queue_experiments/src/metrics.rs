//! Metrics extraction from episode telemetry.

use std::collections::BTreeMap;

use queue_core::policy::PolicyKind;
use queue_core::telemetry::EpisodeTelemetry;
use queue_core::EventKind;

use crate::parameters::ParameterSet;

/// Aggregated metrics from a single episode.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EpisodeResult {
    /// Stochastic events processed (including self-transitions).
    pub events_processed: u64,
    pub arrivals: u64,
    /// Arrivals that found their class slot occupied.
    pub arrivals_blocked: u64,
    pub ticks: u64,
    pub completions: u64,
    pub self_transitions: u64,
    pub actions_executed: u64,
    pub actions_skipped: u64,
    pub total_cost: f64,
    pub discounted_cost: f64,
    /// Cost per uniformized event.
    pub average_cost: f64,
    /// Blocked share of all arrival events.
    pub blocking_rate: f64,
    pub mean_waiting_classes: f64,
    pub mean_busy_servers: f64,
}

/// Extract metrics from the telemetry of a finished episode.
pub fn extract_metrics(telemetry: &EpisodeTelemetry) -> EpisodeResult {
    let arrivals = telemetry.count(EventKind::Arrival);
    let blocking_rate = if arrivals > 0 {
        telemetry.arrivals_blocked as f64 / arrivals as f64
    } else {
        0.0
    };

    EpisodeResult {
        events_processed: telemetry.events_processed,
        arrivals,
        arrivals_blocked: telemetry.arrivals_blocked,
        ticks: telemetry.count(EventKind::Tick),
        completions: telemetry.count(EventKind::JobCompletion),
        self_transitions: telemetry.count(EventKind::Nothing),
        actions_executed: telemetry.actions_executed,
        actions_skipped: telemetry.actions_skipped,
        total_cost: telemetry.total_cost,
        discounted_cost: telemetry.discounted_cost,
        average_cost: telemetry.average_cost(),
        blocking_rate,
        mean_waiting_classes: telemetry.mean_waiting_classes(),
        mean_busy_servers: telemetry.mean_busy_servers(),
    }
}

/// Replication statistics of one experiment (one parameter combination).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExperimentSummary {
    pub experiment_id: String,
    pub policy: PolicyKind,
    pub arrival_scale: f64,
    pub tick_rate: f64,
    pub discount_factor: f64,
    pub runs: usize,
    pub mean_average_cost: f64,
    pub median_average_cost: f64,
    pub p90_average_cost: f64,
    pub mean_discounted_cost: f64,
    pub mean_busy_servers: f64,
}

impl ExperimentSummary {
    /// Mean, median and P90 of `values`.
    fn calculate_stats(values: &[f64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };
        let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(sorted.len() - 1)];

        (avg, median, p90)
    }
}

/// Group results by experiment and summarize across replications.
///
/// Results and parameter sets are paired by index. Summaries are ordered by experiment id.
pub fn summarize_experiments(
    results: &[EpisodeResult],
    parameter_sets: &[ParameterSet],
) -> Vec<ExperimentSummary> {
    let mut groups: BTreeMap<&str, Vec<(&EpisodeResult, &ParameterSet)>> = BTreeMap::new();
    for (result, set) in results.iter().zip(parameter_sets) {
        groups.entry(set.experiment_id.as_str()).or_default().push((result, set));
    }

    groups
        .into_iter()
        .filter_map(|(experiment_id, runs)| {
            let (_, first) = runs.first()?;
            let costs: Vec<f64> = runs.iter().map(|(r, _)| r.average_cost).collect();
            let (mean, median, p90) = ExperimentSummary::calculate_stats(&costs);
            let n = runs.len() as f64;
            Some(ExperimentSummary {
                experiment_id: experiment_id.to_string(),
                policy: first.policy(),
                arrival_scale: first.combination.arrival_scale,
                tick_rate: first.combination.tick_rate,
                discount_factor: first.combination.discount_factor,
                runs: runs.len(),
                mean_average_cost: mean,
                median_average_cost: median,
                p90_average_cost: p90,
                mean_discounted_cost: runs.iter().map(|(r, _)| r.discounted_cost).sum::<f64>() / n,
                mean_busy_servers: runs.iter().map(|(r, _)| r.mean_busy_servers).sum::<f64>() / n,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterSpace;
    use queue_core::telemetry::StepRecord;
    use queue_core::test_helpers::two_pool_config;

    fn result(average_cost: f64) -> EpisodeResult {
        EpisodeResult {
            events_processed: 10,
            arrivals: 4,
            arrivals_blocked: 1,
            ticks: 3,
            completions: 2,
            self_transitions: 1,
            actions_executed: 2,
            actions_skipped: 1,
            total_cost: average_cost * 10.0,
            discounted_cost: average_cost * 9.0,
            average_cost,
            blocking_rate: 0.25,
            mean_waiting_classes: 1.0,
            mean_busy_servers: 1.5,
        }
    }

    #[test]
    fn test_extract_metrics_counts_events() {
        let mut telemetry = EpisodeTelemetry::default();
        for (step, event) in [EventKind::Arrival, EventKind::Arrival, EventKind::Tick].into_iter().enumerate() {
            telemetry.record_step(StepRecord {
                step: step as u64,
                event,
                job_class: None,
                cost: 1.0,
                discounted_cost: 1.0,
                waiting_classes: 1,
                busy_servers: 0,
                actions_executed: 0,
            });
        }
        telemetry.arrivals_blocked = 1;

        let metrics = extract_metrics(&telemetry);
        assert_eq!(metrics.arrivals, 2);
        assert_eq!(metrics.ticks, 1);
        assert_eq!(metrics.blocking_rate, 0.5);
        assert_eq!(metrics.average_cost, 1.0);
    }

    #[test]
    fn test_calculate_stats() {
        let (avg, median, p90) = ExperimentSummary::calculate_stats(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(avg, 2.5);
        assert_eq!(median, 2.5);
        assert_eq!(p90, 3.0);
    }

    #[test]
    fn test_summaries_group_replications() {
        let sets = ParameterSpace::grid(two_pool_config([1, 1]))
            .policy(vec![PolicyKind::Greedy, PolicyKind::Idle])
            .replications(2)
            .generate();
        let results = vec![result(1.0), result(3.0), result(5.0), result(7.0)];

        let summaries = summarize_experiments(&results, &sets);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].experiment_id, "exp_0");
        assert_eq!(summaries[0].policy, PolicyKind::Greedy);
        assert_eq!(summaries[0].runs, 2);
        assert_eq!(summaries[0].mean_average_cost, 2.0);
        assert_eq!(summaries[1].mean_average_cost, 6.0);
    }
}
