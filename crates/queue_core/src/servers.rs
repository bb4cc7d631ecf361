//! Server pool state and the admissible-action queue.
//!
//! Busy counts are kept per (server class, servable job class) pair. Between two
//! stochastic events a controller walks the admissible-action list with a cursor,
//! skipping or executing one action at a time. Executing an action consumes capacity,
//! so the list is pruned in place and the cursor is moved to keep the already-decided
//! prefix behind it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::catalog::ServerCatalog;
use crate::error::{QueueError, QueueResult};

/// Assign one idle server of `server_class` to the waiting job of `job_class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub server_class: usize,
    pub job_class: usize,
}

impl Action {
    pub fn new(server_class: usize, job_class: usize) -> Self {
        Self {
            server_class,
            job_class,
        }
    }
}

impl From<(usize, usize)> for Action {
    fn from((server_class, job_class): (usize, usize)) -> Self {
        Self::new(server_class, job_class)
    }
}

/// Controller decision on the action under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Skip,
    Execute,
}

impl Decision {
    /// Numeric action code: `0` skips, anything else executes.
    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            Decision::Skip
        } else {
            Decision::Execute
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Decision::Skip => 0,
            Decision::Execute => 1,
        }
    }
}

impl From<i64> for Decision {
    fn from(code: i64) -> Self {
        Decision::from_code(code)
    }
}

/// Serializable view of [`ServerPoolState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    pub busy_on: Vec<Vec<u32>>,
    pub has_idle_capacity_per_job: Vec<u32>,
    pub has_idle_capacity: bool,
    pub total_service_rate: f64,
}

#[derive(Debug, Clone)]
pub struct ServerPoolState {
    catalog: Arc<ServerCatalog>,
    busy_on: Vec<Vec<u32>>,
    busy_total: Vec<u32>,
    idle_capacity_per_job: Vec<u32>,
    has_idle_capacity: bool,
    total_service_rate: f64,
    actions: Vec<Action>,
    action_counter: usize,
}

impl ServerPoolState {
    pub fn new(catalog: Arc<ServerCatalog>) -> Self {
        let mut state = Self {
            catalog,
            busy_on: Vec::new(),
            busy_total: Vec::new(),
            idle_capacity_per_job: Vec::new(),
            has_idle_capacity: false,
            total_service_rate: 0.0,
            actions: Vec::new(),
            action_counter: 0,
        };
        state.initialize();
        state
    }

    /// Zero all busy counts, clear the action list and reset the cursor.
    pub fn initialize(&mut self) {
        self.busy_on = self
            .catalog
            .classes()
            .iter()
            .map(|class| vec![0; class.serves.len()])
            .collect();
        self.busy_total = vec![0; self.catalog.len()];
        self.total_service_rate = 0.0;
        self.actions.clear();
        self.action_counter = 0;
        self.update_idle_capacity();
    }

    pub fn catalog(&self) -> &Arc<ServerCatalog> {
        &self.catalog
    }

    /// Busy counts indexed by server class, then by position in its servable list.
    pub fn busy_on(&self) -> &[Vec<u32>] {
        &self.busy_on
    }

    /// Total busy servers of `server_class` across all the classes it serves.
    pub fn busy_servers(&self, server_class: usize) -> u32 {
        self.busy_total.get(server_class).copied().unwrap_or(0)
    }

    pub fn total_busy_servers(&self) -> u32 {
        self.busy_total.iter().sum()
    }

    pub fn idle_capacity_per_job(&self) -> &[u32] {
        &self.idle_capacity_per_job
    }

    pub fn has_idle_capacity(&self) -> bool {
        self.has_idle_capacity
    }

    /// `Σ busy[k][j] · μ_k`.
    pub fn total_service_rate(&self) -> f64 {
        self.total_service_rate
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action_counter(&self) -> usize {
        self.action_counter
    }

    pub fn set_action_counter(&mut self, counter: usize) {
        self.action_counter = counter;
    }

    /// Action under the cursor, if the cursor is inside the list.
    pub fn pending_action(&self) -> Option<Action> {
        self.actions.get(self.action_counter).copied()
    }

    /// Whether every action has been decided on.
    pub fn actions_exhausted(&self) -> bool {
        self.action_counter >= self.actions.len()
    }

    /// Replace the action list, e.g. to seed a specific walk-through.
    pub fn set_actions(&mut self, actions: Vec<Action>, counter: usize) {
        self.actions = actions;
        self.action_counter = counter;
    }

    /// Whether one more server of `server_class` could start a job of `job_class`.
    pub fn can_assign_job(&self, server_class: usize, job_class: usize) -> bool {
        let Some(class) = self.catalog.classes().get(server_class) else {
            return false;
        };
        class.can_serve_index(job_class).is_some() && self.busy_total[server_class] < class.capacity
    }

    /// Occupy one server of `server_class` with a job of `job_class`.
    ///
    /// Returns `false` without mutating when the pair is not servable or the pool is full.
    pub fn assign_job(&mut self, server_class: usize, job_class: usize) -> QueueResult<bool> {
        let class = self.catalog.get(server_class)?;
        self.check_job_index(job_class)?;
        let Some(idx) = class.can_serve_index(job_class) else {
            return Ok(false);
        };
        if self.busy_total[server_class] >= class.capacity {
            return Ok(false);
        }
        let rate = class.service_rate;
        self.busy_on[server_class][idx] += 1;
        self.busy_total[server_class] += 1;
        self.total_service_rate += rate;
        self.update_idle_capacity();
        Ok(true)
    }

    /// Release one server of `server_class` that was serving `job_class`.
    ///
    /// Returns `false` without mutating when no such server is busy.
    pub fn complete_job(&mut self, server_class: usize, job_class: usize) -> QueueResult<bool> {
        let class = self.catalog.get(server_class)?;
        self.check_job_index(job_class)?;
        let Some(idx) = class.can_serve_index(job_class) else {
            return Ok(false);
        };
        if self.busy_on[server_class][idx] == 0 {
            return Ok(false);
        }
        let rate = class.service_rate;
        self.busy_on[server_class][idx] -= 1;
        self.busy_total[server_class] -= 1;
        if self.busy_total.iter().all(|&busy| busy == 0) {
            self.total_service_rate = 0.0;
        } else {
            self.total_service_rate -= rate;
        }
        self.update_idle_capacity();
        Ok(true)
    }

    /// Rebuild the admissible-action list from the waiting slots.
    ///
    /// Ordered by job class first, then server class. Resets the cursor.
    pub fn generate_actions(&mut self, fil_waiting: &[i64]) {
        self.actions.clear();
        self.action_counter = 0;
        for (job_class, _) in fil_waiting.iter().enumerate().filter(|(_, &fil)| fil >= 0) {
            for server_class in 0..self.catalog.len() {
                if self.can_assign_job(server_class, job_class) {
                    self.actions.push(Action::new(server_class, job_class));
                }
            }
        }
        trace!(actions = self.actions.len(), "generated admissible actions");
    }

    /// Skip or execute the action under the cursor.
    ///
    /// Skipping past the end is a no-op. Executing requires the cursor to be inside the
    /// list; the executed assignment may exhaust a pool, in which case every action that
    /// is no longer feasible is dropped and the cursor is placed after the leading run of
    /// the surviving list that still lines up with the already-decided prefix.
    pub fn take_action(&mut self, decision: Decision) -> QueueResult<()> {
        match decision {
            Decision::Skip => {
                if self.action_counter < self.actions.len() {
                    self.action_counter += 1;
                }
                Ok(())
            }
            Decision::Execute => {
                let Some(taken) = self.pending_action() else {
                    return Err(QueueError::ActionOutOfRange {
                        cursor: self.action_counter,
                        len: self.actions.len(),
                    });
                };
                let old_actions = self.actions.clone();
                let old_counter = self.action_counter;

                if !self.assign_job(taken.server_class, taken.job_class)? {
                    warn!(?taken, "executed action was not feasible; busy counts unchanged");
                }

                let mut surviving = std::mem::take(&mut self.actions);
                surviving.retain(|a| self.can_assign_job(a.server_class, a.job_class));
                self.action_counter = surviving
                    .iter()
                    .zip(&old_actions[..=old_counter])
                    .take_while(|(new, old)| new == old)
                    .count();
                self.actions = surviving;
                trace!(
                    ?taken,
                    remaining = self.actions.len(),
                    cursor = self.action_counter,
                    "executed action"
                );
                Ok(())
            }
        }
    }

    /// [`ServerPoolState::take_action`] with a numeric code (`0` skips).
    pub fn take_action_code(&mut self, code: i64) -> QueueResult<()> {
        self.take_action(Decision::from_code(code))
    }

    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            busy_on: self.busy_on.clone(),
            has_idle_capacity_per_job: self.idle_capacity_per_job.clone(),
            has_idle_capacity: self.has_idle_capacity,
            total_service_rate: self.total_service_rate,
        }
    }

    /// Restore busy counts from a snapshot; derived fields are recomputed.
    pub fn restore(&mut self, snapshot: &ServerSnapshot) -> QueueResult<()> {
        if snapshot.busy_on.len() != self.catalog.len() {
            return Err(QueueError::SnapshotMismatch(format!(
                "server snapshot has {} classes, catalog has {}",
                snapshot.busy_on.len(),
                self.catalog.len()
            )));
        }
        for (k, (row, class)) in snapshot.busy_on.iter().zip(self.catalog.classes()).enumerate() {
            if row.len() != class.serves.len() {
                return Err(QueueError::SnapshotMismatch(format!(
                    "server class {k} has {} busy counts, serves {} classes",
                    row.len(),
                    class.serves.len()
                )));
            }
            if row.iter().sum::<u32>() > class.capacity {
                return Err(QueueError::SnapshotMismatch(format!(
                    "server class {k} exceeds its capacity of {}",
                    class.capacity
                )));
            }
        }
        self.busy_on.clone_from(&snapshot.busy_on);
        self.busy_total = self.busy_on.iter().map(|row| row.iter().sum()).collect();
        self.total_service_rate = self
            .busy_total
            .iter()
            .zip(self.catalog.classes())
            .map(|(&busy, class)| busy as f64 * class.service_rate)
            .sum();
        self.actions.clear();
        self.action_counter = 0;
        self.update_idle_capacity();
        Ok(())
    }

    fn update_idle_capacity(&mut self) {
        self.idle_capacity_per_job.clear();
        self.idle_capacity_per_job.resize(self.catalog.n_jobs(), 0);
        for (class, &busy) in self.catalog.classes().iter().zip(&self.busy_total) {
            let idle = class.capacity.saturating_sub(busy);
            for &n in &class.serves {
                self.idle_capacity_per_job[n] += idle;
            }
        }
        self.has_idle_capacity = self.idle_capacity_per_job.iter().any(|&idle| idle > 0);
    }

    fn check_job_index(&self, job_class: usize) -> QueueResult<()> {
        if job_class >= self.catalog.n_jobs() {
            return Err(QueueError::InvalidJobClass {
                index: job_class,
                n_jobs: self.catalog.n_jobs(),
            });
        }
        Ok(())
    }
}
