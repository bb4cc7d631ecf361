//! Episode runner: scheduling phases, reproducibility and policy comparisons.

mod support;

use queue_core::policy::{FifoPolicy, GreedyPolicy, IdlePolicy, Policy, PolicyKind};
use queue_core::runner::{run_episode, run_episode_with_hook, run_next_event, Episode};
use queue_core::telemetry::TraceConfig;
use queue_core::{EventKind, StateCategory};

use support::two_pool_mdp;

#[test]
fn episode_alternates_events_and_scheduling() {
    let mdp = two_pool_mdp([1, 2]);
    let mut episode = Episode::with_trace(&mdp, 5, TraceConfig::enabled(1_000));

    let steps = run_episode(&mdp, &mut episode, &GreedyPolicy, 500).unwrap();

    assert_eq!(steps, 500);
    assert_eq!(episode.steps(), 500);
    assert_eq!(episode.state.category, StateCategory::AwaitEvent);
    assert_eq!(episode.telemetry.events_processed, 500);
    assert_eq!(episode.telemetry.trace.len(), 500);
    let by_kind: u64 = EventKind::ALL.iter().map(|&k| episode.telemetry.count(k)).sum();
    assert_eq!(by_kind, 500);
}

#[test]
fn same_seed_reproduces_episode() {
    let mdp = two_pool_mdp([1, 1]);
    let run = |seed| {
        let mut episode = Episode::with_trace(&mdp, seed, TraceConfig::enabled(10_000));
        run_episode(&mdp, &mut episode, &FifoPolicy, 2_000).unwrap();
        episode
    };
    let a = run(9);
    let b = run(9);
    assert_eq!(a.telemetry.trace, b.telemetry.trace);
    assert_eq!(a.telemetry.total_cost, b.telemetry.total_cost);
    assert_eq!(a.state.fil_waiting(), b.state.fil_waiting());
}

#[test]
fn idle_policy_never_occupies_a_server() {
    let mdp = two_pool_mdp([2, 2]);
    let mut episode = Episode::new(&mdp, 1);
    run_episode_with_hook(&mdp, &mut episode, &IdlePolicy, 1_000, |state, _| {
        assert_eq!(state.servers.total_busy_servers(), 0);
    })
    .unwrap();
    assert_eq!(episode.telemetry.actions_executed, 0);
    assert_eq!(episode.telemetry.count(EventKind::JobCompletion), 0);
}

#[test]
fn serving_policies_beat_idling() {
    let mdp = two_pool_mdp([1, 2]);
    let cost = |policy: &dyn Policy| {
        let mut episode = Episode::new(&mdp, 21);
        run_episode(&mdp, &mut episode, policy, 20_000).unwrap();
        episode.telemetry.average_cost()
    };
    let idle = cost(&IdlePolicy);
    let greedy = cost(&GreedyPolicy);
    let fifo = cost(&FifoPolicy);
    assert!(greedy < idle, "greedy {greedy} vs idle {idle}");
    assert!(fifo < idle, "fifo {fifo} vs idle {idle}");
}

#[test]
fn step_hook_sees_settled_state() {
    let mdp = two_pool_mdp([1, 1]);
    let mut episode = Episode::new(&mdp, 2);
    let mut calls = 0;
    run_episode_with_hook(&mdp, &mut episode, &GreedyPolicy, 300, |state, _| {
        calls += 1;
        assert_eq!(state.category, StateCategory::AwaitEvent);
        assert_eq!(state.servers.action_counter(), 0);
    })
    .unwrap();
    assert_eq!(calls, 300);
}

#[test]
fn discount_shrinks_later_costs() {
    let config = queue_core::test_helpers::two_pool_config([1, 1]).with_discount_factor(0.99);
    let mdp = queue_core::QueueMdp::new(&config).unwrap();
    let mut episode = Episode::with_trace(&mdp, 4, TraceConfig::enabled(5_000));
    for _ in 0..3_000 {
        run_next_event(&mdp, &mut episode, &IdlePolicy).unwrap();
    }
    let t = &episode.telemetry;
    assert!(t.total_cost > 0.0);
    assert!(t.discounted_cost < t.total_cost);
    for record in &t.trace {
        assert!(record.discounted_cost <= record.cost + 1e-12);
    }
}

#[test]
fn policy_kinds_build_named_policies() {
    for kind in [PolicyKind::Greedy, PolicyKind::Idle, PolicyKind::Fifo] {
        let parsed: PolicyKind = kind.name().parse().unwrap();
        assert_eq!(parsed, kind);
        let mdp = two_pool_mdp([1, 1]);
        let mut episode = Episode::new(&mdp, 0);
        run_episode(&mdp, &mut episode, kind.build().as_ref(), 50).unwrap();
    }
}
