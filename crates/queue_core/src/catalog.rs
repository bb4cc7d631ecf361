//! Static description of server and job classes.
//!
//! The catalog is built once from configuration and shared read-only (behind an
//! [`Arc`](std::sync::Arc)) by every episode simulated from that configuration.

use serde::{Deserialize, Serialize};

use crate::error::{QueueError, QueueResult};

/// One pool of identical servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerClass {
    /// Number of identical servers in the pool.
    pub capacity: u32,
    /// Exponential service rate of a single busy server.
    pub service_rate: f64,
    /// Job classes this pool may serve, in the order used to index busy counts.
    pub serves: Vec<usize>,
}

impl ServerClass {
    pub fn new(capacity: u32, service_rate: f64, serves: Vec<usize>) -> Self {
        Self {
            capacity,
            service_rate,
            serves,
        }
    }

    /// Position of `job_class` within [`ServerClass::serves`], if servable.
    pub fn can_serve_index(&self, job_class: usize) -> Option<usize> {
        self.serves.iter().position(|&n| n == job_class)
    }

    /// Largest completion rate this pool can contribute (all servers busy).
    pub fn max_service_rate(&self) -> f64 {
        self.capacity as f64 * self.service_rate
    }
}

/// Cost parameters of one job class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobClass {
    pub arrival_rate: f64,
    /// Cost charged per tick while the head-of-line job is past its due time.
    pub cost_rate: f64,
    /// Waiting time in ticks after which the class starts accruing cost.
    pub due_time: i64,
}

/// Immutable table of server classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCatalog {
    classes: Vec<ServerClass>,
    n_jobs: usize,
}

impl ServerCatalog {
    /// Build a catalog, rejecting servable classes outside `[0, n_jobs)` and duplicates.
    pub fn new(classes: Vec<ServerClass>, n_jobs: usize) -> QueueResult<Self> {
        for (k, class) in classes.iter().enumerate() {
            for (j, &n) in class.serves.iter().enumerate() {
                if n >= n_jobs {
                    return Err(QueueError::InvalidConfig(format!(
                        "server class {k} serves job class {n}, but n_jobs = {n_jobs}"
                    )));
                }
                if class.serves[..j].contains(&n) {
                    return Err(QueueError::InvalidConfig(format!(
                        "server class {k} lists job class {n} twice"
                    )));
                }
            }
            if !class.service_rate.is_finite() || class.service_rate < 0.0 {
                return Err(QueueError::InvalidConfig(format!(
                    "server class {k} has invalid service rate {}",
                    class.service_rate
                )));
            }
        }
        Ok(Self { classes, n_jobs })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    pub fn classes(&self) -> &[ServerClass] {
        &self.classes
    }

    pub fn get(&self, server_class: usize) -> QueueResult<&ServerClass> {
        self.classes
            .get(server_class)
            .ok_or(QueueError::InvalidServerClass {
                index: server_class,
                k_servers: self.classes.len(),
            })
    }

    /// Position of `job_class` within the servable list of `server_class`.
    ///
    /// Returns `None` when the server class does not serve the job class or either index
    /// is out of range.
    pub fn can_serve_index(&self, server_class: usize, job_class: usize) -> Option<usize> {
        self.classes
            .get(server_class)
            .and_then(|class| class.can_serve_index(job_class))
    }

    /// `Σ_k capacity_k · μ_k`.
    pub fn max_total_service_rate(&self) -> f64 {
        self.classes.iter().map(ServerClass::max_service_rate).sum()
    }
}
