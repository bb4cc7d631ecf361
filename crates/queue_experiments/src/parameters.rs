//! Parameter variation framework for exploring the queueing parameter space.
//!
//! A [`ParameterSpace`] starts from a base [`QueueConfig`] and lists values to explore
//! for arrival scale, tick rate, discount factor and policy. Grid search expands the
//! Cartesian product; random sampling draws unique combinations.

use queue_core::policy::PolicyKind;
use queue_core::QueueConfig;
use serde::Serialize;

#[path = "parameters/sampling.rs"]
mod sampling;


/// Default number of stochastic events per episode.
pub const DEFAULT_MAX_EVENTS: u64 = 100_000;

/// One point of the parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterCombination {
    pub arrival_scale: f64,
    pub tick_rate: f64,
    pub discount_factor: f64,
    pub policy: PolicyKind,
}

/// A single episode configuration.
///
/// Replications of one combination share the `experiment_id` and differ in `run_id`
/// and seed. In a grid, seeds depend only on the run index, so every policy arm sees the
/// same random streams.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    base: QueueConfig,
    pub combination: ParameterCombination,
    pub max_events: u64,
    /// Unique experiment ID for this parameter combination.
    pub experiment_id: String,
    /// Replication index within the experiment.
    pub run_id: usize,
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(
        base: QueueConfig,
        combination: ParameterCombination,
        max_events: u64,
        experiment_id: String,
        run_id: usize,
        seed: u64,
    ) -> Self {
        Self {
            base,
            combination,
            max_events,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// The base configuration with this combination applied.
    pub fn queue_config(&self) -> QueueConfig {
        self.base
            .clone()
            .with_arrival_scale(self.combination.arrival_scale)
            .with_tick_rate(self.combination.tick_rate)
            .with_discount_factor(self.combination.discount_factor)
    }

    pub fn policy(&self) -> PolicyKind {
        self.combination.policy
    }
}

/// Seed of replication `run_id`.
pub fn replication_seed(base_seed: u64, run_id: usize) -> u64 {
    base_seed ^ (run_id as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

/// Defines a parameter space for exploration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: QueueConfig,
    arrival_scales: Vec<f64>,
    tick_rates: Vec<f64>,
    discount_factors: Vec<f64>,
    policies: Vec<PolicyKind>,
    replications: usize,
    max_events: u64,
    base_seed: u64,
}

impl ParameterSpace {
    /// Create a parameter space around `base`. Unset dimensions take the base value.
    pub fn grid(base: QueueConfig) -> Self {
        Self {
            base,
            arrival_scales: vec![],
            tick_rates: vec![],
            discount_factors: vec![],
            policies: vec![],
            replications: 1,
            max_events: DEFAULT_MAX_EVENTS,
            base_seed: 0,
        }
    }

    /// Set arrival-rate multipliers to explore.
    pub fn arrival_scale(mut self, scales: Vec<f64>) -> Self {
        self.arrival_scales = scales;
        self
    }

    /// Set tick rates to explore.
    pub fn tick_rate(mut self, rates: Vec<f64>) -> Self {
        self.tick_rates = rates;
        self
    }

    /// Set discount factors to explore.
    pub fn discount_factor(mut self, factors: Vec<f64>) -> Self {
        self.discount_factors = factors;
        self
    }

    /// Set policies to compare. Defaults to greedy only.
    pub fn policy(mut self, policies: Vec<PolicyKind>) -> Self {
        self.policies = policies;
        self
    }

    /// Number of independently seeded runs per combination (at least 1).
    pub fn replications(mut self, replications: usize) -> Self {
        self.replications = replications.max(1);
        self
    }

    pub fn max_events(mut self, max_events: u64) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    fn arrival_scales(&self) -> Vec<f64> {
        non_empty_or(&self.arrival_scales, 1.0)
    }

    fn tick_rates(&self) -> Vec<f64> {
        non_empty_or(&self.tick_rates, self.base.tick_rate)
    }

    fn discount_factors(&self) -> Vec<f64> {
        non_empty_or(&self.discount_factors, self.base.discount_factor)
    }

    fn policies(&self) -> Vec<PolicyKind> {
        non_empty_or(&self.policies, PolicyKind::Greedy)
    }

    /// All combinations of the explored values (Cartesian product).
    pub fn combinations(&self) -> Vec<ParameterCombination> {
        let policies = self.policies();
        let discount_factors = self.discount_factors();
        let tick_rates = self.tick_rates();
        let mut out = Vec::new();
        for arrival_scale in self.arrival_scales() {
            for &tick_rate in &tick_rates {
                for &discount_factor in &discount_factors {
                    for &policy in &policies {
                        out.push(ParameterCombination {
                            arrival_scale,
                            tick_rate,
                            discount_factor,
                            policy,
                        });
                    }
                }
            }
        }
        out
    }

    /// Generate all parameter sets using grid search, `replications` per combination.
    pub fn generate(&self) -> Vec<ParameterSet> {
        self.combinations()
            .into_iter()
            .enumerate()
            .flat_map(|(experiment_id, combination)| {
                (0..self.replications).map(move |run_id| {
                    ParameterSet::new(
                        self.base.clone(),
                        combination,
                        self.max_events,
                        format!("exp_{}", experiment_id),
                        run_id,
                        replication_seed(self.base_seed, run_id),
                    )
                })
            })
            .collect()
    }
}

fn non_empty_or<T: Copy>(values: &[T], default: T) -> Vec<T> {
    if values.is_empty() {
        vec![default]
    } else {
        values.to_vec()
    }
}
