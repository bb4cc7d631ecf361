//! Typed construction input for the queueing model.
//!
//! Mirrors the JSON layout used by the model configuration files: job-class rates and
//! costs, a global tick rate, and one block per server class.

use serde::{Deserialize, Serialize};

use crate::catalog::{JobClass, ServerCatalog, ServerClass};
use crate::error::{QueueError, QueueResult};

fn default_tick_rate() -> f64 {
    1.0
}

fn default_discount_factor() -> f64 {
    1.0
}

fn default_cost_rate() -> f64 {
    1.0
}

/// One server class block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTypeConfig {
    pub n_servers: u32,
    pub service_rate: f64,
    pub can_serve: Vec<usize>,
}

/// Cost parameters of one job class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobTypeConfig {
    #[serde(default = "default_cost_rate")]
    pub cost_rate: f64,
    #[serde(default)]
    pub due_time: i64,
}

impl Default for JobTypeConfig {
    fn default() -> Self {
        Self {
            cost_rate: default_cost_rate(),
            due_time: 0,
        }
    }
}

/// Full model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Optional model identifier carried through from configuration files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub k_servers: usize,
    pub n_jobs: usize,
    pub arrival_rates: Vec<f64>,
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f64,
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,
    pub server_types: Vec<ServerTypeConfig>,
    /// Per-class cost parameters; missing entries fall back to [`JobTypeConfig::default`].
    #[serde(default)]
    pub job_types: Vec<JobTypeConfig>,
}

impl QueueConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> QueueResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> QueueResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    /// Multiply every arrival rate by `scale` (load sweeps).
    pub fn with_arrival_scale(mut self, scale: f64) -> Self {
        for rate in &mut self.arrival_rates {
            *rate *= scale;
        }
        self
    }

    pub fn with_job_types(mut self, job_types: Vec<JobTypeConfig>) -> Self {
        self.job_types = job_types;
        self
    }

    /// Check dimensions, indices and rates.
    pub fn validate(&self) -> QueueResult<()> {
        let invalid = |msg: String| Err(QueueError::InvalidConfig(msg));

        if self.arrival_rates.len() != self.n_jobs {
            return invalid(format!(
                "arrival_rates has {} entries, n_jobs = {}",
                self.arrival_rates.len(),
                self.n_jobs
            ));
        }
        if self.server_types.len() != self.k_servers {
            return invalid(format!(
                "server_types has {} entries, k_servers = {}",
                self.server_types.len(),
                self.k_servers
            ));
        }
        if self.job_types.len() > self.n_jobs {
            return invalid(format!(
                "job_types has {} entries, n_jobs = {}",
                self.job_types.len(),
                self.n_jobs
            ));
        }
        if let Some((n, rate)) = self
            .arrival_rates
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_finite() || **r < 0.0)
        {
            return invalid(format!("job class {n} has invalid arrival rate {rate}"));
        }
        if !self.tick_rate.is_finite() || self.tick_rate < 0.0 {
            return invalid(format!("invalid tick rate {}", self.tick_rate));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return invalid(format!(
                "discount factor {} outside [0, 1]",
                self.discount_factor
            ));
        }
        if let Some((n, job)) = self
            .job_types
            .iter()
            .enumerate()
            .find(|(_, j)| !j.cost_rate.is_finite() || j.cost_rate < 0.0)
        {
            return invalid(format!("job class {n} has invalid cost rate {}", job.cost_rate));
        }
        self.server_catalog().map(|_| ())
    }

    /// Build the immutable server catalog.
    pub fn server_catalog(&self) -> QueueResult<ServerCatalog> {
        let classes = self
            .server_types
            .iter()
            .map(|st| ServerClass::new(st.n_servers, st.service_rate, st.can_serve.clone()))
            .collect();
        ServerCatalog::new(classes, self.n_jobs)
    }

    /// Job classes with their arrival rate and cost parameters.
    pub fn job_classes(&self) -> Vec<JobClass> {
        self.arrival_rates
            .iter()
            .enumerate()
            .map(|(n, &arrival_rate)| {
                let job = self.job_types.get(n).copied().unwrap_or_default();
                JobClass {
                    arrival_rate,
                    cost_rate: job.cost_rate,
                    due_time: job.due_time,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "queue_mdp",
        "k_servers": 2,
        "n_jobs": 3,
        "arrival_rates": [0.3, 0.2, 0.1],
        "tick_rate": 1.0,
        "server_types": [
            { "n_servers": 1, "service_rate": 0.5, "can_serve": [0, 1] },
            { "n_servers": 2, "service_rate": 0.25, "can_serve": [1, 2] }
        ],
        "job_types": [
            { "cost_rate": 2.0, "due_time": 3 },
            { "cost_rate": 1.0, "due_time": 5 }
        ]
    }"#;

    #[test]
    fn parses_sample_config() {
        let config = QueueConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.id.as_deref(), Some("queue_mdp"));
        assert_eq!(config.discount_factor, 1.0);
        let jobs = config.job_classes();
        assert_eq!(jobs[0].due_time, 3);
        assert_eq!(jobs[2].cost_rate, 1.0);
        assert_eq!(jobs[2].due_time, 0);
        assert_eq!(config.server_catalog().unwrap().len(), 2);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let mut config = QueueConfig::from_json_str(SAMPLE).unwrap();
        config.arrival_rates.pop();
        assert!(matches!(config.validate(), Err(QueueError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unknown_servable_class() {
        let mut config = QueueConfig::from_json_str(SAMPLE).unwrap();
        config.server_types[1].can_serve.push(9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            QueueConfig::from_json_str("{ \"k_servers\": 1 }"),
            Err(QueueError::Json(_))
        ));
    }

    #[test]
    fn arrival_scale_multiplies_rates() {
        let config = QueueConfig::from_json_str(SAMPLE).unwrap().with_arrival_scale(2.0);
        assert_eq!(config.arrival_rates, vec![0.6, 0.4, 0.2]);
    }
}
