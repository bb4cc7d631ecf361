//! Run the bundled queue configuration under each reference policy and print a summary.
//!
//! Run with: cargo run -p queue_core --example episode_run

use queue_core::policy::PolicyKind;
use queue_core::runner::{run_episode, Episode};
use queue_core::telemetry::TraceConfig;
use queue_core::{QueueConfig, QueueMdp};

const CONFIG: &str = include_str!("../../../configs/queue_mdp/mdp_config_0.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const MAX_EVENTS: u64 = 200_000;
    const SEED: u64 = 123;

    let config = QueueConfig::from_json_str(CONFIG)?;
    let mdp = QueueMdp::new(&config)?;

    println!(
        "--- {} ({} server classes, {} job classes, uniformization rate {:.3}) ---",
        config.id.as_deref().unwrap_or("unnamed"),
        mdp.k_servers(),
        mdp.n_jobs(),
        mdp.uniformization_rate()
    );

    for kind in [PolicyKind::Idle, PolicyKind::Greedy, PolicyKind::Fifo] {
        let mut episode = Episode::with_trace(&mdp, SEED, TraceConfig::enabled(10));
        let steps = run_episode(&mdp, &mut episode, kind.build().as_ref(), MAX_EVENTS)?;
        println!("\nPolicy: {} ({steps} events)", kind.name());
        episode.telemetry.print_summary();
        println!("Mean waiting classes: {:.3}", episode.telemetry.mean_waiting_classes());
        println!("Mean busy servers: {:.3}", episode.telemetry.mean_busy_servers());
        println!("Final waiting ages: {:?}", episode.state.fil_waiting());
    }
    Ok(())
}
