//! Episode runner: alternates event sampling with scheduling phases.
//!
//! Each step samples one event from the uniformized clock, applies it, then lets the
//! policy walk the admissible-action list until the state awaits the next event.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::error::QueueResult;
use crate::event::Event;
use crate::mdp::{QueueMdp, QueueMdpState, StateCategory};
use crate::policy::Policy;
use crate::servers::Decision;
use crate::telemetry::{EpisodeTelemetry, StepRecord, TraceConfig};

/// One simulated episode: dynamic state, RNG and telemetry.
#[derive(Debug, Clone)]
pub struct Episode {
    pub state: QueueMdpState,
    pub telemetry: EpisodeTelemetry,
    rng: StdRng,
    step: u64,
    discount: f64,
}

impl Episode {
    pub fn new(mdp: &QueueMdp, seed: u64) -> Self {
        Self::with_trace(mdp, seed, TraceConfig::default())
    }

    pub fn with_trace(mdp: &QueueMdp, seed: u64, trace_config: TraceConfig) -> Self {
        Self {
            state: mdp.get_initial_state(),
            telemetry: EpisodeTelemetry::with_trace(trace_config),
            rng: StdRng::seed_from_u64(seed),
            step: 0,
            discount: 1.0,
        }
    }

    /// Number of stochastic events processed so far.
    pub fn steps(&self) -> u64 {
        self.step
    }
}

/// Applies policy decisions until the state awaits an event.
/// Returns the number of actions executed.
pub fn run_scheduling_phase(
    mdp: &QueueMdp,
    episode: &mut Episode,
    policy: &dyn Policy,
) -> QueueResult<u32> {
    let mut executed = 0;
    while episode.state.category == StateCategory::AwaitAction {
        let decision = if episode.state.pending_action().is_some() {
            policy.decide(mdp, &episode.state)
        } else {
            Decision::Skip
        };
        trace!(?decision, pending = ?episode.state.pending_action(), "scheduling decision");
        mdp.modify_state_with_action(&mut episode.state, decision)?;
        match decision {
            Decision::Execute => {
                executed += 1;
                episode.telemetry.actions_executed += 1;
            }
            Decision::Skip => episode.telemetry.actions_skipped += 1,
        }
    }
    Ok(executed)
}

/// Runs one step: samples and applies the next event, then the scheduling phase.
pub fn run_next_event(mdp: &QueueMdp, episode: &mut Episode, policy: &dyn Policy) -> QueueResult<Event> {
    run_next_event_with_hook(mdp, episode, policy, |_, _| {})
}

/// Runs one step and invokes `hook` once the state awaits the next event.
pub fn run_next_event_with_hook<F>(
    mdp: &QueueMdp,
    episode: &mut Episode,
    policy: &dyn Policy,
    mut hook: F,
) -> QueueResult<Event>
where
    F: FnMut(&QueueMdpState, &Event),
{
    // A restored state may still be mid-way through a scheduling phase.
    run_scheduling_phase(mdp, episode, policy)?;

    let event = mdp.get_event(&mut episode.rng, &episode.state);
    let blocked = matches!(event, Event::Arrival { job_class } if episode.state.queue.is_waiting(job_class));
    let cost = mdp.modify_state_with_event(&mut episode.state, &event, &mut episode.rng)?;
    let executed = run_scheduling_phase(mdp, episode, policy)?;

    let job_class = match event {
        Event::Arrival { job_class } | Event::JobCompletion { job_class, .. } => Some(job_class),
        Event::Tick | Event::Nothing => None,
    };
    if blocked {
        episode.telemetry.arrivals_blocked += 1;
    }
    episode.telemetry.record_step(StepRecord {
        step: episode.step,
        event: event.kind(),
        job_class,
        cost,
        discounted_cost: episode.discount * cost,
        waiting_classes: episode.state.queue.waiting_classes() as u32,
        busy_servers: episode.state.servers.total_busy_servers(),
        actions_executed: executed,
    });
    episode.step += 1;
    episode.discount *= mdp.discount_factor();

    hook(&episode.state, &event);
    Ok(event)
}

/// Runs `max_events` steps. Returns the number of steps executed.
pub fn run_episode(
    mdp: &QueueMdp,
    episode: &mut Episode,
    policy: &dyn Policy,
    max_events: u64,
) -> QueueResult<u64> {
    run_episode_with_hook(mdp, episode, policy, max_events, |_, _| {})
}

/// Runs `max_events` steps and invokes `hook` after each step.
pub fn run_episode_with_hook<F>(
    mdp: &QueueMdp,
    episode: &mut Episode,
    policy: &dyn Policy,
    max_events: u64,
    mut hook: F,
) -> QueueResult<u64>
where
    F: FnMut(&QueueMdpState, &Event),
{
    debug!(max_events, start = episode.step, "episode started");
    let mut steps = 0;
    while steps < max_events {
        run_next_event_with_hook(mdp, episode, policy, &mut hook)?;
        steps += 1;
    }
    debug!(
        steps,
        total_cost = episode.telemetry.total_cost,
        discounted_cost = episode.telemetry.discounted_cost,
        "episode finished"
    );
    Ok(steps)
}
