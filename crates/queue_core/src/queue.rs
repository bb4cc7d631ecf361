//! Per-class first-in-line queue state.
//!
//! Each job class owns a single waiting slot. `FIL[n] = -1` means nothing of class `n`
//! is waiting, `FIL[n] = t >= 0` means the head-of-line job has waited `t` ticks.
//! Total arrival and tick rates are maintained incrementally alongside every mutation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distributions::{sample_next_fil, NextFil};
use crate::error::{QueueError, QueueResult};

/// Sentinel for an empty waiting slot.
pub const EMPTY_SLOT: i64 = -1;

/// Serializable view of [`QueueState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub fil_waiting: Vec<i64>,
    pub total_tick_rate: f64,
    pub total_arrival_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueState {
    fil_waiting: Vec<i64>,
    arrival_rates: Vec<f64>,
    tick_rate: f64,
    waiting_classes: usize,
    total_arrival_rate: f64,
    total_tick_rate: f64,
}

impl QueueState {
    /// All slots empty; every class contributes its arrival rate.
    pub fn new(arrival_rates: Vec<f64>, tick_rate: f64) -> Self {
        let total_arrival_rate = arrival_rates.iter().sum();
        Self {
            fil_waiting: vec![EMPTY_SLOT; arrival_rates.len()],
            arrival_rates,
            tick_rate,
            waiting_classes: 0,
            total_arrival_rate,
            total_tick_rate: 0.0,
        }
    }

    pub fn n_jobs(&self) -> usize {
        self.fil_waiting.len()
    }

    pub fn fil_waiting(&self) -> &[i64] {
        &self.fil_waiting
    }

    pub fn fil(&self, job_class: usize) -> QueueResult<i64> {
        self.check_index(job_class)?;
        Ok(self.fil_waiting[job_class])
    }

    pub fn is_waiting(&self, job_class: usize) -> bool {
        self.fil_waiting
            .get(job_class)
            .is_some_and(|&fil| fil >= 0)
    }

    pub fn arrival_rates(&self) -> &[f64] {
        &self.arrival_rates
    }

    pub fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    pub fn total_arrival_rate(&self) -> f64 {
        self.total_arrival_rate
    }

    pub fn total_tick_rate(&self) -> f64 {
        self.total_tick_rate
    }

    /// Number of classes with a waiting head-of-line job.
    pub fn waiting_classes(&self) -> usize {
        self.waiting_classes
    }

    /// Register an arrival of class `job_class`.
    ///
    /// Returns `true` when the slot was empty and is now occupied; an arrival into an
    /// occupied slot is blocked and leaves the state untouched.
    pub fn arrival(&mut self, job_class: usize) -> QueueResult<bool> {
        self.check_index(job_class)?;
        if self.fil_waiting[job_class] >= 0 {
            return Ok(false);
        }
        self.fil_waiting[job_class] = 0;
        self.occupy(job_class);
        Ok(true)
    }

    /// Age every waiting head-of-line job by one tick.
    pub fn tick(&mut self) {
        for fil in self.fil_waiting.iter_mut().filter(|fil| **fil >= 0) {
            *fil += 1;
        }
    }

    /// A server finished a job of class `job_class`; resample the head-of-line age.
    pub fn complete_job<R: Rng + ?Sized>(&mut self, job_class: usize, rng: &mut R) -> QueueResult<()> {
        self.check_index(job_class)?;
        let age = self.fil_waiting[job_class];
        if age < 0 {
            return Ok(());
        }
        let next = if age == 0 {
            NextFil::Empty
        } else {
            sample_next_fil(age, self.arrival_rates[job_class], self.tick_rate, rng)
        };
        match next {
            NextFil::Empty => {
                self.fil_waiting[job_class] = EMPTY_SLOT;
                self.release(job_class);
            }
            NextFil::Waiting(new_age) => self.fil_waiting[job_class] = new_age,
        }
        Ok(())
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            fil_waiting: self.fil_waiting.clone(),
            total_tick_rate: self.total_tick_rate,
            total_arrival_rate: self.total_arrival_rate,
        }
    }

    /// Restore waiting ages from a snapshot.
    ///
    /// Totals are recomputed from the restored ages rather than trusted.
    pub fn restore(&mut self, snapshot: &QueueSnapshot) -> QueueResult<()> {
        if snapshot.fil_waiting.len() != self.fil_waiting.len() {
            return Err(QueueError::SnapshotMismatch(format!(
                "queue snapshot has {} classes, model has {}",
                snapshot.fil_waiting.len(),
                self.fil_waiting.len()
            )));
        }
        if let Some(bad) = snapshot.fil_waiting.iter().find(|&&fil| fil < EMPTY_SLOT) {
            return Err(QueueError::SnapshotMismatch(format!(
                "invalid first-in-line age {bad}"
            )));
        }
        self.fil_waiting.clone_from(&snapshot.fil_waiting);
        self.recompute_totals();
        Ok(())
    }

    fn recompute_totals(&mut self) {
        self.waiting_classes = self.fil_waiting.iter().filter(|&&fil| fil >= 0).count();
        self.total_tick_rate = self.tick_rate * self.waiting_classes as f64;
        self.total_arrival_rate = self
            .fil_waiting
            .iter()
            .zip(&self.arrival_rates)
            .filter(|(&fil, _)| fil < 0)
            .map(|(_, rate)| rate)
            .sum();
    }

    fn occupy(&mut self, job_class: usize) {
        self.waiting_classes += 1;
        self.total_tick_rate = self.tick_rate * self.waiting_classes as f64;
        if self.waiting_classes == self.fil_waiting.len() {
            // Snap to zero so the sampler never sees residual arrival mass.
            self.total_arrival_rate = 0.0;
        } else {
            self.total_arrival_rate -= self.arrival_rates[job_class];
        }
    }

    fn release(&mut self, job_class: usize) {
        self.waiting_classes -= 1;
        self.total_tick_rate = self.tick_rate * self.waiting_classes as f64;
        self.total_arrival_rate += self.arrival_rates[job_class];
    }

    fn check_index(&self, job_class: usize) -> QueueResult<()> {
        if job_class >= self.fil_waiting.len() {
            return Err(QueueError::InvalidJobClass {
                index: job_class,
                n_jobs: self.fil_waiting.len(),
            });
        }
        Ok(())
    }
}
