//! Stochastic events and the uniformized event sampler.
//!
//! All reachable states share one exponential clock running at the uniformization rate.
//! Each draw is attributed to an arrival, a tick, or a completion in proportion to the
//! state's current rates; mass left over falls to [`Event::Nothing`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::ServerCatalog;
use crate::queue::QueueState;
use crate::servers::ServerPoolState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// A job of this class arrives.
    Arrival { job_class: usize },
    /// Discretization tick: every waiting head-of-line job ages by one.
    Tick,
    /// A server of `server_class` finishes a job of `job_class`.
    JobCompletion {
        server_class: usize,
        job_class: usize,
    },
    /// Uniformization self-transition.
    Nothing,
}

/// Event discriminant without payload, for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Arrival,
    Tick,
    JobCompletion,
    Nothing,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Arrival,
        EventKind::Tick,
        EventKind::JobCompletion,
        EventKind::Nothing,
    ];

    pub fn code(self) -> u8 {
        match self {
            EventKind::Arrival => 0,
            EventKind::Tick => 1,
            EventKind::JobCompletion => 2,
            EventKind::Nothing => 3,
        }
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Arrival { .. } => EventKind::Arrival,
            Event::Tick => EventKind::Tick,
            Event::JobCompletion { .. } => EventKind::JobCompletion,
            Event::Nothing => EventKind::Nothing,
        }
    }
}

/// Draws events from a fixed-rate uniformized clock.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSampler {
    uniformization_rate: f64,
}

impl EventSampler {
    /// `N·γ + Σ λ_n + Σ_k capacity_k·μ_k`, which bounds the total rate of every state.
    pub fn new(arrival_rates: &[f64], tick_rate: f64, catalog: &ServerCatalog) -> Self {
        let max_tick_rate = arrival_rates.len() as f64 * tick_rate;
        let max_arrival_rate: f64 = arrival_rates.iter().sum();
        Self {
            uniformization_rate: max_tick_rate + max_arrival_rate + catalog.max_total_service_rate(),
        }
    }

    pub fn uniformization_rate(&self) -> f64 {
        self.uniformization_rate
    }

    /// Draw the next event for the given state.
    pub fn get_event<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        queue: &QueueState,
        servers: &ServerPoolState,
    ) -> Event {
        let u = rng.gen::<f64>() * self.uniformization_rate;
        self.event_at(u, queue, servers)
    }

    /// Attribute a point `u ∈ [0, uniformization_rate)` of the clock to an event.
    pub fn event_at(&self, u: f64, queue: &QueueState, servers: &ServerPoolState) -> Event {
        let arrival_total = queue.total_arrival_rate();
        if u < arrival_total {
            let mut cumulative = 0.0;
            let mut last_empty = None;
            for (job_class, (&fil, &rate)) in queue
                .fil_waiting()
                .iter()
                .zip(queue.arrival_rates())
                .enumerate()
            {
                if fil >= 0 {
                    continue;
                }
                cumulative += rate;
                if u < cumulative {
                    return Event::Arrival { job_class };
                }
                if rate > 0.0 {
                    last_empty = Some(job_class);
                }
            }
            // Incremental totals can exceed the fresh sum by rounding error.
            if let Some(job_class) = last_empty {
                return Event::Arrival { job_class };
            }
            return Event::Nothing;
        }

        let tick_total = queue.total_tick_rate();
        if u < arrival_total + tick_total {
            return Event::Tick;
        }

        let mut remaining = u - arrival_total - tick_total;
        for (server_class, (row, class)) in servers
            .busy_on()
            .iter()
            .zip(servers.catalog().classes())
            .enumerate()
        {
            for (&busy, &job_class) in row.iter().zip(&class.serves) {
                let rate = busy as f64 * class.service_rate;
                if remaining < rate {
                    return Event::JobCompletion {
                        server_class,
                        job_class,
                    };
                }
                remaining -= rate;
            }
        }
        Event::Nothing
    }

    /// Every event reachable from the state together with its probability.
    ///
    /// [`Event::Nothing`] is listed last and absorbs the unused rate.
    pub fn event_probabilities(&self, queue: &QueueState, servers: &ServerPoolState) -> Vec<(Event, f64)> {
        let rate = self.uniformization_rate;
        if rate <= 0.0 {
            return vec![(Event::Nothing, 1.0)];
        }
        let mut out = Vec::new();
        for (job_class, (&fil, &lambda)) in queue
            .fil_waiting()
            .iter()
            .zip(queue.arrival_rates())
            .enumerate()
        {
            if fil < 0 && lambda > 0.0 {
                out.push((Event::Arrival { job_class }, lambda / rate));
            }
        }
        if queue.total_tick_rate() > 0.0 {
            out.push((Event::Tick, queue.total_tick_rate() / rate));
        }
        for (server_class, (row, class)) in servers
            .busy_on()
            .iter()
            .zip(servers.catalog().classes())
            .enumerate()
        {
            for (&busy, &job_class) in row.iter().zip(&class.serves) {
                let mass = busy as f64 * class.service_rate;
                if mass > 0.0 {
                    out.push((
                        Event::JobCompletion {
                            server_class,
                            job_class,
                        },
                        mass / rate,
                    ));
                }
            }
        }
        let used: f64 = out.iter().map(|(_, p)| p).sum();
        out.push((Event::Nothing, (1.0 - used).max(0.0)));
        out
    }
}
