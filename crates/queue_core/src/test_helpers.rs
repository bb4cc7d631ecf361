//! Test helpers for common fixtures.
//!
//! The two-pool layout is used throughout the tests: server class 0 serves job classes
//! {0, 1}, server class 1 serves {1, 2}.

use std::sync::Arc;

use crate::catalog::{ServerCatalog, ServerClass};
use crate::config::{JobTypeConfig, QueueConfig, ServerTypeConfig};
use crate::servers::ServerPoolState;

/// Two server classes over three job classes with the given capacities.
pub fn two_pool_config(capacities: [u32; 2]) -> QueueConfig {
    QueueConfig {
        id: Some("two_pool".to_string()),
        k_servers: 2,
        n_jobs: 3,
        arrival_rates: vec![0.4, 0.3, 0.2],
        tick_rate: 1.0,
        discount_factor: 1.0,
        server_types: vec![
            ServerTypeConfig {
                n_servers: capacities[0],
                service_rate: 0.5,
                can_serve: vec![0, 1],
            },
            ServerTypeConfig {
                n_servers: capacities[1],
                service_rate: 0.25,
                can_serve: vec![1, 2],
            },
        ],
        job_types: vec![
            JobTypeConfig {
                cost_rate: 3.0,
                due_time: 2,
            },
            JobTypeConfig {
                cost_rate: 2.0,
                due_time: 4,
            },
            JobTypeConfig {
                cost_rate: 1.0,
                due_time: 6,
            },
        ],
    }
}

/// Catalog of [`two_pool_config`].
///
/// # Panics
///
/// Never for the fixed fixture layout.
pub fn two_pool_catalog(capacities: [u32; 2]) -> Arc<ServerCatalog> {
    let catalog = ServerCatalog::new(
        vec![
            ServerClass::new(capacities[0], 0.5, vec![0, 1]),
            ServerClass::new(capacities[1], 0.25, vec![1, 2]),
        ],
        3,
    )
    .expect("two-pool catalog is valid");
    Arc::new(catalog)
}

/// Fresh server pool over [`two_pool_catalog`].
pub fn two_pool_servers(capacities: [u32; 2]) -> ServerPoolState {
    ServerPoolState::new(two_pool_catalog(capacities))
}
