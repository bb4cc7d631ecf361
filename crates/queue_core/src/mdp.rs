//! The queueing decision process: state, transitions and external hooks.
//!
//! A state alternates between awaiting a stochastic event and awaiting scheduling
//! decisions. Events mutate the queue and server pool and rebuild the admissible-action
//! list; decisions walk that list one action at a time.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::{JobClass, ServerCatalog};
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::event::{Event, EventSampler};
use crate::queue::{QueueSnapshot, QueueState};
use crate::servers::{Action, Decision, ServerPoolState, ServerSnapshot};

/// Which kind of transition a state expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateCategory {
    AwaitEvent,
    AwaitAction,
}

/// Operations a generic solver or runner needs from a decision process.
pub trait MarkovDecisionProcess {
    type State;
    type Event;

    fn initial_state(&self) -> Self::State;

    fn get_event<R: Rng + ?Sized>(&self, rng: &mut R, state: &Self::State) -> Self::Event;

    /// Apply an event and return the incurred cost.
    fn modify_state_with_event<R: Rng + ?Sized>(
        &self,
        state: &mut Self::State,
        event: &Self::Event,
        rng: &mut R,
    ) -> QueueResult<f64>;

    /// Apply a decision and return the incurred cost.
    fn modify_state_with_action(&self, state: &mut Self::State, decision: Decision) -> QueueResult<f64>;

    fn state_category(&self, state: &Self::State) -> StateCategory;
}

/// Dynamic per-episode state.
#[derive(Debug, Clone)]
pub struct QueueMdpState {
    pub queue: QueueState,
    pub servers: ServerPoolState,
    pub category: StateCategory,
}

impl QueueMdpState {
    pub fn fil_waiting(&self) -> &[i64] {
        self.queue.fil_waiting()
    }

    pub fn actions(&self) -> &[Action] {
        self.servers.actions()
    }

    pub fn pending_action(&self) -> Option<Action> {
        self.servers.pending_action()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            category: self.category,
            queue: self.queue.snapshot(),
            servers: self.servers.snapshot(),
        }
    }
}

/// Serializable form of [`QueueMdpState`] used by solvers and persistence layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub category: StateCategory,
    pub queue: QueueSnapshot,
    pub servers: ServerSnapshot,
}

/// Features handed to a policy: the action under the cursor and the waiting ages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueFeatures {
    pub pending_action: Option<Action>,
    pub fil_waiting: Vec<i64>,
}

impl QueueFeatures {
    /// Flat numeric encoding: `[server_class, job_class, fil_0, .., fil_{N-1}]`, with
    /// `-1` for both action entries when no action is pending.
    pub fn to_vec(&self) -> Vec<f64> {
        let (k, n) = self
            .pending_action
            .map(|a| (a.server_class as f64, a.job_class as f64))
            .unwrap_or((-1.0, -1.0));
        let mut out = Vec::with_capacity(self.fil_waiting.len() + 2);
        out.push(k);
        out.push(n);
        out.extend(self.fil_waiting.iter().map(|&fil| fil as f64));
        out
    }
}

/// Static model: catalog, job classes, rates and the event sampler.
#[derive(Debug, Clone)]
pub struct QueueMdp {
    catalog: Arc<ServerCatalog>,
    job_classes: Vec<JobClass>,
    tick_rate: f64,
    discount_factor: f64,
    sampler: EventSampler,
}

impl QueueMdp {
    /// Number of distinct decision codes (skip and execute).
    pub const VALID_ACTIONS: usize = 2;

    pub fn new(config: &QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let catalog = Arc::new(config.server_catalog()?);
        let sampler = EventSampler::new(&config.arrival_rates, config.tick_rate, &catalog);
        Ok(Self {
            catalog,
            job_classes: config.job_classes(),
            tick_rate: config.tick_rate,
            discount_factor: config.discount_factor,
            sampler,
        })
    }

    pub fn catalog(&self) -> &Arc<ServerCatalog> {
        &self.catalog
    }

    pub fn job_classes(&self) -> &[JobClass] {
        &self.job_classes
    }

    pub fn n_jobs(&self) -> usize {
        self.job_classes.len()
    }

    pub fn k_servers(&self) -> usize {
        self.catalog.len()
    }

    pub fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn uniformization_rate(&self) -> f64 {
        self.sampler.uniformization_rate()
    }

    pub fn sampler(&self) -> &EventSampler {
        &self.sampler
    }

    fn arrival_rates(&self) -> Vec<f64> {
        self.job_classes.iter().map(|j| j.arrival_rate).collect()
    }

    /// Empty queue, idle servers, awaiting an event.
    pub fn get_initial_state(&self) -> QueueMdpState {
        QueueMdpState {
            queue: QueueState::new(self.arrival_rates(), self.tick_rate),
            servers: ServerPoolState::new(Arc::clone(&self.catalog)),
            category: StateCategory::AwaitEvent,
        }
    }

    /// Rebuild a state from a snapshot. The action list is regenerated from the restored
    /// waiting slots with the cursor at 0.
    pub fn state_from_snapshot(&self, snapshot: &StateSnapshot) -> QueueResult<QueueMdpState> {
        let mut state = self.get_initial_state();
        state.queue.restore(&snapshot.queue)?;
        state.servers.restore(&snapshot.servers)?;
        state.servers.generate_actions(state.queue.fil_waiting());
        state.category = match snapshot.category {
            StateCategory::AwaitAction if !state.servers.actions().is_empty() => {
                StateCategory::AwaitAction
            }
            _ => StateCategory::AwaitEvent,
        };
        Ok(state)
    }

    /// Cost accrued by one tick: classes waiting past their due time.
    pub fn tick_cost(&self, queue: &QueueState) -> f64 {
        queue
            .fil_waiting()
            .iter()
            .zip(&self.job_classes)
            .filter(|(&fil, job)| fil >= 0 && fil > job.due_time)
            .map(|(_, job)| job.cost_rate)
            .sum()
    }

    pub fn get_event<R: Rng + ?Sized>(&self, rng: &mut R, state: &QueueMdpState) -> Event {
        self.sampler.get_event(rng, &state.queue, &state.servers)
    }

    pub fn event_probabilities(&self, state: &QueueMdpState) -> Vec<(Event, f64)> {
        self.sampler.event_probabilities(&state.queue, &state.servers)
    }

    pub fn modify_state_with_event<R: Rng + ?Sized>(
        &self,
        state: &mut QueueMdpState,
        event: &Event,
        rng: &mut R,
    ) -> QueueResult<f64> {
        if state.category != StateCategory::AwaitEvent {
            return Err(QueueError::WrongCategory {
                operation: "apply an event",
                category: state.category,
            });
        }
        let cost = match *event {
            Event::Nothing => return Ok(0.0),
            Event::JobCompletion {
                server_class,
                job_class,
            } => {
                state.servers.complete_job(server_class, job_class)?;
                state.queue.complete_job(job_class, rng)?;
                0.0
            }
            Event::Arrival { job_class } => {
                state.queue.arrival(job_class)?;
                0.0
            }
            Event::Tick => {
                state.queue.tick();
                self.tick_cost(&state.queue)
            }
        };
        state.servers.generate_actions(state.queue.fil_waiting());
        if !state.servers.actions().is_empty() {
            state.category = StateCategory::AwaitAction;
        }
        trace!(?event, cost, category = ?state.category, "applied event");
        Ok(cost)
    }

    pub fn modify_state_with_action(&self, state: &mut QueueMdpState, decision: Decision) -> QueueResult<f64> {
        if state.category != StateCategory::AwaitAction {
            return Err(QueueError::WrongCategory {
                operation: "apply an action",
                category: state.category,
            });
        }
        state.servers.take_action(decision)?;
        if state.servers.actions_exhausted() {
            state.servers.set_action_counter(0);
            state.category = StateCategory::AwaitEvent;
        }
        Ok(0.0)
    }

    /// Whether `decision` may be applied in `state`.
    pub fn is_allowed_action(&self, state: &QueueMdpState, decision: Decision) -> bool {
        match (state.category, decision) {
            (StateCategory::AwaitAction, Decision::Skip) => true,
            (StateCategory::AwaitAction, Decision::Execute) => state.servers.pending_action().is_some(),
            (StateCategory::AwaitEvent, _) => false,
        }
    }

    pub fn features(&self, state: &QueueMdpState) -> QueueFeatures {
        QueueFeatures {
            pending_action: state.servers.pending_action(),
            fil_waiting: state.queue.fil_waiting().to_vec(),
        }
    }
}

impl MarkovDecisionProcess for QueueMdp {
    type State = QueueMdpState;
    type Event = Event;

    fn initial_state(&self) -> QueueMdpState {
        self.get_initial_state()
    }

    fn get_event<R: Rng + ?Sized>(&self, rng: &mut R, state: &QueueMdpState) -> Event {
        QueueMdp::get_event(self, rng, state)
    }

    fn modify_state_with_event<R: Rng + ?Sized>(
        &self,
        state: &mut QueueMdpState,
        event: &Event,
        rng: &mut R,
    ) -> QueueResult<f64> {
        QueueMdp::modify_state_with_event(self, state, event, rng)
    }

    fn modify_state_with_action(&self, state: &mut QueueMdpState, decision: Decision) -> QueueResult<f64> {
        QueueMdp::modify_state_with_action(self, state, decision)
    }

    fn state_category(&self, state: &QueueMdpState) -> StateCategory {
        state.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JobTypeConfig, ServerTypeConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mdp() -> QueueMdp {
        let config = QueueConfig {
            id: None,
            k_servers: 1,
            n_jobs: 2,
            arrival_rates: vec![0.5, 0.5],
            tick_rate: 1.0,
            discount_factor: 1.0,
            server_types: vec![ServerTypeConfig {
                n_servers: 1,
                service_rate: 1.0,
                can_serve: vec![0, 1],
            }],
            job_types: vec![
                JobTypeConfig {
                    cost_rate: 3.0,
                    due_time: 1,
                },
                JobTypeConfig {
                    cost_rate: 1.0,
                    due_time: 0,
                },
            ],
        };
        QueueMdp::new(&config).unwrap()
    }

    #[test]
    fn arrival_opens_scheduling_phase() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        let cost = mdp
            .modify_state_with_event(&mut state, &Event::Arrival { job_class: 1 }, &mut rng)
            .unwrap();
        assert_eq!(cost, 0.0);
        assert_eq!(state.category, StateCategory::AwaitAction);
        assert_eq!(state.actions(), &[Action::new(0, 1)]);
    }

    #[test]
    fn nothing_leaves_state_untouched() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        let before = state.snapshot();
        assert_eq!(
            mdp.modify_state_with_event(&mut state, &Event::Nothing, &mut rng).unwrap(),
            0.0
        );
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn tick_charges_classes_past_due_time() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        state.queue.arrival(0).unwrap();
        state.queue.arrival(1).unwrap();
        // FIL = [1, 1]: class 1 is past due (1 > 0), class 0 is not (1 > 1 fails).
        assert_eq!(mdp.modify_state_with_event(&mut state, &Event::Tick, &mut rng).unwrap(), 1.0);
        state.category = StateCategory::AwaitEvent;
        assert_eq!(mdp.modify_state_with_event(&mut state, &Event::Tick, &mut rng).unwrap(), 4.0);
    }

    #[test]
    fn exhausting_actions_returns_to_event_phase() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        mdp.modify_state_with_event(&mut state, &Event::Arrival { job_class: 0 }, &mut rng)
            .unwrap();
        mdp.modify_state_with_action(&mut state, Decision::Execute).unwrap();
        assert_eq!(state.category, StateCategory::AwaitEvent);
        assert_eq!(state.servers.action_counter(), 0);
        assert_eq!(state.servers.busy_on()[0], vec![1, 0]);
    }

    #[test]
    fn wrong_category_is_rejected() {
        let mdp = mdp();
        let mut state = mdp.get_initial_state();
        assert!(matches!(
            mdp.modify_state_with_action(&mut state, Decision::Skip),
            Err(QueueError::WrongCategory { .. })
        ));
        assert!(!mdp.is_allowed_action(&state, Decision::Skip));
    }

    #[test]
    fn completion_releases_server_and_resamples_queue() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        state.queue.arrival(0).unwrap();
        state.servers.assign_job(0, 0).unwrap();
        let event = Event::JobCompletion {
            server_class: 0,
            job_class: 0,
        };
        mdp.modify_state_with_event(&mut state, &event, &mut rng).unwrap();
        assert_eq!(state.servers.total_busy_servers(), 0);
        assert_eq!(state.fil_waiting(), &[-1, -1]);
        assert_eq!(state.category, StateCategory::AwaitEvent);
    }

    #[test]
    fn snapshot_restores_state() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        mdp.modify_state_with_event(&mut state, &Event::Arrival { job_class: 1 }, &mut rng)
            .unwrap();
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        let snapshot: StateSnapshot = serde_json::from_str(&json).unwrap();
        let restored = mdp.state_from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.snapshot(), state.snapshot());
        assert_eq!(restored.actions(), state.actions());
    }

    #[test]
    fn features_expose_pending_action() {
        let mdp = mdp();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = mdp.get_initial_state();
        assert_eq!(mdp.features(&state).to_vec(), vec![-1.0, -1.0, -1.0, -1.0]);
        mdp.modify_state_with_event(&mut state, &Event::Arrival { job_class: 1 }, &mut rng)
            .unwrap();
        assert_eq!(mdp.features(&state).to_vec(), vec![0.0, 1.0, -1.0, 0.0]);
    }
}
