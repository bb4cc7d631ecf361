//! Continuous-time multi-class queueing model embedded in a discrete-decision MDP.
//!
//! Jobs of several classes arrive into single first-in-line slots and are served by
//! heterogeneous server pools. Events are drawn from a uniformized clock
//! ([`event::EventSampler`]); between events a controller walks the admissible
//! (server class, job class) actions maintained by [`servers::ServerPoolState`].

pub mod catalog;
pub mod config;
pub mod distributions;
pub mod error;
pub mod event;
pub mod mdp;
pub mod policy;
pub mod queue;
pub mod runner;
pub mod servers;
pub mod telemetry;
pub mod telemetry_export;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use catalog::{JobClass, ServerCatalog, ServerClass};
pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use event::{Event, EventKind, EventSampler};
pub use mdp::{MarkovDecisionProcess, QueueMdp, QueueMdpState, StateCategory};
pub use servers::{Action, Decision};
