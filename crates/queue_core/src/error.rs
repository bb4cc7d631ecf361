//! Error type shared by every fallible operation of the core.

use thiserror::Error;

use crate::mdp::StateCategory;

/// Errors raised by queue, server pool and transition operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A job class index outside `[0, n_jobs)`.
    #[error("job class {index} out of range (n_jobs = {n_jobs})")]
    InvalidJobClass { index: usize, n_jobs: usize },

    /// A server class index outside `[0, k_servers)`.
    #[error("server class {index} out of range (k_servers = {k_servers})")]
    InvalidServerClass { index: usize, k_servers: usize },

    /// An execute decision was demanded while the cursor points past the action list.
    #[error("action cursor {cursor} outside admissible action list of length {len}")]
    ActionOutOfRange { cursor: usize, len: usize },

    /// A transition was applied in a state category that does not accept it.
    #[error("cannot {operation} while state is {category:?}")]
    WrongCategory {
        operation: &'static str,
        category: StateCategory,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A snapshot does not fit the dimensions of the model it is restored into.
    #[error("snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;
