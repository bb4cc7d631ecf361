use crate::metrics::{EpisodeResult, ExperimentSummary};
use crate::parameters::ParameterSet;

pub(crate) fn export_to_csv_impl(
    results: &[EpisodeResult],
    parameter_sets: &[ParameterSet],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.len() != parameter_sets.len() {
        return Err(format!(
            "Results length ({}) doesn't match parameter_sets length ({})",
            results.len(),
            parameter_sets.len()
        )
        .into());
    }

    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "seed",
        "policy",
        "arrival_scale",
        "tick_rate",
        "discount_factor",
        "max_events",
        "events_processed",
        "arrivals",
        "arrivals_blocked",
        "ticks",
        "completions",
        "self_transitions",
        "actions_executed",
        "actions_skipped",
        "total_cost",
        "discounted_cost",
        "average_cost",
        "blocking_rate",
        "mean_waiting_classes",
        "mean_busy_servers",
    ])?;

    for (result, param_set) in results.iter().zip(parameter_sets.iter()) {
        let combination = &param_set.combination;
        let record = [
            param_set.experiment_id.clone(),
            param_set.run_id.to_string(),
            param_set.seed.to_string(),
            combination.policy.name().to_string(),
            combination.arrival_scale.to_string(),
            combination.tick_rate.to_string(),
            combination.discount_factor.to_string(),
            param_set.max_events.to_string(),
            result.events_processed.to_string(),
            result.arrivals.to_string(),
            result.arrivals_blocked.to_string(),
            result.ticks.to_string(),
            result.completions.to_string(),
            result.self_transitions.to_string(),
            result.actions_executed.to_string(),
            result.actions_skipped.to_string(),
            result.total_cost.to_string(),
            result.discounted_cost.to_string(),
            result.average_cost.to_string(),
            result.blocking_rate.to_string(),
            result.mean_waiting_classes.to_string(),
            result.mean_busy_servers.to_string(),
        ];
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub(crate) fn export_summaries_to_csv_impl(
    summaries: &[ExperimentSummary],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}
