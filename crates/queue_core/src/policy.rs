//! Reference scheduling policies.
//!
//! A policy only sees the public state of the decision process and answers one
//! question per scheduling step: skip or execute the action under the cursor.

use serde::{Deserialize, Serialize};

use crate::mdp::{QueueMdp, QueueMdpState};
use crate::servers::Decision;

/// Trait for scheduling policies consulted while a state awaits an action.
pub trait Policy: Send + Sync {
    fn decide(&self, mdp: &QueueMdp, state: &QueueMdpState) -> Decision;
}

/// Execute every admissible action in list order.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl Policy for GreedyPolicy {
    fn decide(&self, _mdp: &QueueMdp, state: &QueueMdpState) -> Decision {
        if state.pending_action().is_some() {
            Decision::Execute
        } else {
            Decision::Skip
        }
    }
}

/// Never assign a server. Baseline for cost comparisons.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn decide(&self, _mdp: &QueueMdp, _state: &QueueMdpState) -> Decision {
        Decision::Skip
    }
}

/// First in, first out across classes.
///
/// Executes the pending action only when its job class holds the oldest head-of-line
/// job among the classes still pending at or after the cursor.
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoPolicy;

impl Policy for FifoPolicy {
    fn decide(&self, _mdp: &QueueMdp, state: &QueueMdpState) -> Decision {
        let Some(pending) = state.pending_action() else {
            return Decision::Skip;
        };
        let fil = state.fil_waiting();
        let cursor = state.servers.action_counter();
        let oldest = state.actions()[cursor..]
            .iter()
            .map(|a| fil[a.job_class])
            .max()
            .unwrap_or(-1);
        if fil[pending.job_class] >= oldest {
            Decision::Execute
        } else {
            Decision::Skip
        }
    }
}

/// Policy selector used by configuration and command-line front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Greedy,
    Idle,
    Fifo,
}

impl PolicyKind {
    pub fn build(self) -> Box<dyn Policy> {
        match self {
            PolicyKind::Greedy => Box::new(GreedyPolicy),
            PolicyKind::Idle => Box::new(IdlePolicy),
            PolicyKind::Fifo => Box::new(FifoPolicy),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Greedy => "greedy",
            PolicyKind::Idle => "idle",
            PolicyKind::Fifo => "fifo",
        }
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(PolicyKind::Greedy),
            "idle" => Ok(PolicyKind::Idle),
            "fifo" => Ok(PolicyKind::Fifo),
            other => Err(format!("unknown policy '{other}' (expected greedy, idle or fifo)")),
        }
    }
}
