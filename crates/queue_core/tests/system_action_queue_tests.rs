//! Admissible-action list: generation order, cursor movement and pruning on execute.

mod support;

use queue_core::servers::{Action, Decision};
use queue_core::test_helpers::two_pool_servers;
use queue_core::QueueError;

use support::waiting;

fn actions(pairs: &[(usize, usize)]) -> Vec<Action> {
    pairs.iter().copied().map(Action::from).collect()
}

#[test]
fn generates_actions_job_class_major() {
    let mut servers = two_pool_servers([1, 1]);
    servers.generate_actions(&waiting(3, &[0, 1, 2]));
    assert_eq!(servers.actions(), actions(&[(0, 0), (0, 1), (1, 1), (1, 2)]).as_slice());
    assert_eq!(servers.action_counter(), 0);
}

#[test]
fn generation_skips_empty_classes_and_full_pools() {
    let mut servers = two_pool_servers([1, 1]);
    servers.assign_job(1, 2).unwrap();
    servers.generate_actions(&waiting(3, &[1, 2]));
    assert_eq!(servers.actions(), actions(&[(0, 1)]).as_slice());
}

#[test]
fn executing_exhausting_action_prunes_pool_and_rewinds_cursor() {
    let mut servers = two_pool_servers([1, 1]);
    servers.generate_actions(&waiting(3, &[0, 1, 2]));
    servers.set_action_counter(1);
    assert_eq!(servers.pending_action(), Some(Action::new(0, 1)));

    servers.take_action(Decision::Execute).unwrap();

    assert_eq!(servers.busy_on()[0], vec![0, 1]);
    assert_eq!(servers.actions(), actions(&[(1, 1), (1, 2)]).as_slice());
    assert_eq!(servers.action_counter(), 0);
}

#[test]
fn executing_on_prefilled_pool_prunes_seeded_queue() {
    let mut servers = two_pool_servers([1, 1]);
    servers.assign_job(0, 0).unwrap();
    servers.set_actions(actions(&[(0, 0), (1, 1), (0, 1), (1, 2)]), 2);

    servers.take_action(Decision::Execute).unwrap();

    assert_eq!(servers.busy_on()[0], vec![1, 0]);
    assert_eq!(servers.actions(), actions(&[(1, 1), (1, 2)]).as_slice());
    assert_eq!(servers.action_counter(), 0);
}

#[test]
fn executing_with_spare_capacity_keeps_pool_entries() {
    let mut servers = two_pool_servers([1, 2]);
    servers.generate_actions(&waiting(3, &[0, 1, 2]));
    servers.set_action_counter(2);
    assert_eq!(servers.pending_action(), Some(Action::new(1, 1)));

    servers.take_action(Decision::Execute).unwrap();

    assert_eq!(servers.busy_on()[1], vec![1, 0]);
    assert_eq!(servers.actions().len(), 4);
    assert_eq!(servers.action_counter(), 3);
    assert_eq!(servers.pending_action(), Some(Action::new(1, 2)));
}

#[test]
fn second_execution_exhausts_pool() {
    let mut servers = two_pool_servers([1, 2]);
    servers.generate_actions(&waiting(3, &[0, 1, 2]));
    servers.set_action_counter(2);
    servers.take_action(Decision::Execute).unwrap();
    servers.take_action(Decision::Execute).unwrap();

    assert_eq!(servers.busy_on()[1], vec![1, 1]);
    assert_eq!(servers.actions(), actions(&[(0, 0), (0, 1)]).as_slice());
    assert_eq!(servers.action_counter(), 2);
}

#[test]
fn skip_past_end_never_mutates_busy_counts() {
    let mut servers = two_pool_servers([1, 1]);
    servers.generate_actions(&waiting(3, &[0, 1, 2]));
    for _ in 0..10 {
        servers.take_action(Decision::Skip).unwrap();
    }
    assert_eq!(servers.action_counter(), servers.actions().len());
    assert_eq!(servers.total_busy_servers(), 0);
}

#[test]
fn execute_on_empty_list_is_out_of_range() {
    let mut servers = two_pool_servers([1, 1]);
    servers.generate_actions(&waiting(3, &[]));
    assert!(matches!(
        servers.take_action(Decision::Execute),
        Err(QueueError::ActionOutOfRange { cursor: 0, len: 0 })
    ));
}
