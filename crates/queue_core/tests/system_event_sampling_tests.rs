//! Uniformized event clock: partition of the rate and empirical convergence.

use std::collections::HashMap;

use queue_core::queue::QueueState;
use queue_core::servers::ServerPoolState;
use queue_core::test_helpers::{two_pool_catalog, two_pool_servers};
use queue_core::{Event, EventSampler};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn loaded_state() -> (EventSampler, QueueState, ServerPoolState) {
    let catalog = two_pool_catalog([1, 2]);
    let rates = vec![0.4, 0.3, 0.2];
    let sampler = EventSampler::new(&rates, 1.0, &catalog);
    let mut queue = QueueState::new(rates, 1.0);
    queue.arrival(0).unwrap();
    let mut servers = two_pool_servers([1, 2]);
    assert!(servers.assign_job(0, 0).unwrap());
    assert!(servers.assign_job(1, 2).unwrap());
    (sampler, queue, servers)
}

#[test]
fn uniformization_rate_covers_worst_case() {
    let (sampler, _, _) = loaded_state();
    // 3 ticking classes + all arrivals + every server busy.
    assert!((sampler.uniformization_rate() - (3.0 + 0.9 + 0.5 + 2.0 * 0.25)).abs() < 1e-12);
}

#[test]
fn probabilities_match_state_rates() {
    let (sampler, queue, servers) = loaded_state();
    let u = sampler.uniformization_rate();
    let probabilities: HashMap<Event, f64> = sampler.event_probabilities(&queue, &servers).into_iter().collect();

    let expect = |event: Event, rate: f64| {
        let p = probabilities.get(&event).copied().unwrap_or(0.0);
        assert!((p - rate / u).abs() < 1e-12, "{event:?}: {p}");
    };
    expect(Event::Arrival { job_class: 0 }, 0.0);
    expect(Event::Arrival { job_class: 1 }, 0.3);
    expect(Event::Arrival { job_class: 2 }, 0.2);
    expect(Event::Tick, 1.0);
    expect(
        Event::JobCompletion {
            server_class: 0,
            job_class: 0,
        },
        0.5,
    );
    expect(
        Event::JobCompletion {
            server_class: 1,
            job_class: 2,
        },
        0.25,
    );
    expect(Event::Nothing, u - 2.25);
    assert_eq!(probabilities.len(), 6);
}

#[test]
fn empirical_frequencies_converge_to_probabilities() {
    let (sampler, queue, servers) = loaded_state();
    let mut rng = StdRng::seed_from_u64(7);
    let draws = 200_000;

    let mut counts: HashMap<Event, u64> = HashMap::new();
    for _ in 0..draws {
        *counts.entry(sampler.get_event(&mut rng, &queue, &servers)).or_insert(0) += 1;
    }

    let probabilities = sampler.event_probabilities(&queue, &servers);
    assert_eq!(counts.len(), probabilities.len(), "sampled an unlisted event");
    for (event, p) in probabilities {
        let freq = counts.get(&event).copied().unwrap_or(0) as f64 / draws as f64;
        assert!((freq - p).abs() < 0.005, "{event:?}: freq {freq} vs p {p}");
    }
}

#[test]
fn clock_partition_is_exhaustive() {
    let (sampler, queue, servers) = loaded_state();
    let u_max = sampler.uniformization_rate();
    let steps = 10_000;
    let mut seen = HashMap::new();
    for i in 0..steps {
        let u = u_max * i as f64 / steps as f64;
        *seen.entry(sampler.event_at(u, &queue, &servers)).or_insert(0u32) += 1;
    }
    for (event, p) in sampler.event_probabilities(&queue, &servers) {
        let share = seen.get(&event).copied().unwrap_or(0) as f64 / steps as f64;
        assert!((share - p).abs() < 1e-3, "{event:?}: share {share} vs p {p}");
    }
}
