//! Telemetry / KPIs: per-episode counters and an optional bounded step trace.

use std::collections::{HashMap, VecDeque};

use crate::event::EventKind;

/// One processed stochastic event and the scheduling phase that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: u64,
    pub event: EventKind,
    /// Job class of an arrival or completion.
    pub job_class: Option<usize>,
    pub cost: f64,
    pub discounted_cost: f64,
    /// Classes with a waiting head-of-line job after the step.
    pub waiting_classes: u32,
    /// Busy servers across all pools after the step.
    pub busy_servers: u32,
    /// Actions executed in the scheduling phase after the event.
    pub actions_executed: u32,
}

/// Trace capture configuration.
#[derive(Debug, Clone, Copy)]
pub struct TraceConfig {
    pub enabled: bool,
    /// Oldest records are dropped once this many are held.
    pub max_records: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_records: 100_000,
        }
    }
}

impl TraceConfig {
    pub fn enabled(max_records: usize) -> Self {
        Self {
            enabled: true,
            max_records,
        }
    }
}

/// Collects episode telemetry.
#[derive(Debug, Default, Clone)]
pub struct EpisodeTelemetry {
    pub events_processed: u64,
    pub events_by_kind: HashMap<EventKind, u64>,
    pub arrivals_blocked: u64,
    pub actions_executed: u64,
    pub actions_skipped: u64,
    pub total_cost: f64,
    pub discounted_cost: f64,
    /// Sum over events of waiting classes, for time averages under uniformization.
    pub waiting_class_sum: u64,
    /// Sum over events of busy servers.
    pub busy_server_sum: u64,
    pub trace: VecDeque<StepRecord>,
    pub trace_config: TraceConfig,
}

impl EpisodeTelemetry {
    pub fn with_trace(trace_config: TraceConfig) -> Self {
        Self {
            trace_config,
            ..Self::default()
        }
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.events_by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn record_step(&mut self, record: StepRecord) {
        self.events_processed += 1;
        *self.events_by_kind.entry(record.event).or_insert(0) += 1;
        self.total_cost += record.cost;
        self.discounted_cost += record.discounted_cost;
        self.waiting_class_sum += record.waiting_classes as u64;
        self.busy_server_sum += record.busy_servers as u64;

        if self.trace_config.enabled && self.trace_config.max_records > 0 {
            if self.trace.len() >= self.trace_config.max_records {
                self.trace.pop_front();
            }
            self.trace.push_back(record);
        }
    }

    /// Average cost per uniformized event.
    pub fn average_cost(&self) -> f64 {
        if self.events_processed == 0 {
            0.0
        } else {
            self.total_cost / self.events_processed as f64
        }
    }

    /// Time-average number of classes with a waiting job.
    pub fn mean_waiting_classes(&self) -> f64 {
        if self.events_processed == 0 {
            0.0
        } else {
            self.waiting_class_sum as f64 / self.events_processed as f64
        }
    }

    /// Time-average number of busy servers.
    pub fn mean_busy_servers(&self) -> f64 {
        if self.events_processed == 0 {
            0.0
        } else {
            self.busy_server_sum as f64 / self.events_processed as f64
        }
    }

    /// Print summary statistics.
    pub fn print_summary(&self) {
        println!("\n=== Episode Summary ===");
        println!("Events processed: {}", self.events_processed);
        println!("Total cost: {:.3}", self.total_cost);
        println!("Discounted cost: {:.3}", self.discounted_cost);
        println!("Average cost per event: {:.5}", self.average_cost());
        println!(
            "Actions executed/skipped: {}/{}",
            self.actions_executed, self.actions_skipped
        );
        println!("\nEvents by kind:");
        for kind in EventKind::ALL {
            println!("  {:15} : {}", format!("{kind:?}"), self.count(kind));
        }
    }
}
