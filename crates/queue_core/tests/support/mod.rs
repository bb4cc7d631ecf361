#![allow(dead_code)]

use queue_core::queue::QueueState;
use queue_core::test_helpers::two_pool_config;
use queue_core::QueueMdp;

/// Decision process over the two-pool fixture.
pub fn two_pool_mdp(capacities: [u32; 2]) -> QueueMdp {
    QueueMdp::new(&two_pool_config(capacities)).expect("fixture config is valid")
}

/// Waiting ages with the listed classes at age 0 and every other class empty.
pub fn waiting(n_jobs: usize, classes: &[usize]) -> Vec<i64> {
    (0..n_jobs)
        .map(|n| if classes.contains(&n) { 0 } else { -1 })
        .collect()
}

/// Queue over a single class that has waited `age` ticks.
pub fn aged_single_class(arrival_rate: f64, tick_rate: f64, age: u32) -> QueueState {
    let mut queue = QueueState::new(vec![arrival_rate], tick_rate);
    queue.arrival(0).expect("class 0 exists");
    for _ in 0..age {
        queue.tick();
    }
    queue
}
