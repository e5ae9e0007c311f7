//! Reproducibility: a seed fully determines the simulation trace.

use obelisk_kernel::{Dashboard, Engine, NullDashboard};
use obelisk_simulator::{build_topology, SimulatorConfig};
use obelisk_types::Hash;
use std::sync::Arc;

fn test_config() -> SimulatorConfig {
    SimulatorConfig {
        nodes: 8,
        peer_degree: 3,
        blocksteps: 25,
        txsteps_range: (4, 9),
        latency_range: (1, 3),
        quorum_fraction: 0.9,
        observer_fraction: 0.0,
    }
}

/// Run the simulation and capture every node's chain as hash sequences.
fn run_chains(seed: u64, steps: u64) -> Vec<Vec<Hash>> {
    let engine = Arc::new(Engine::new(seed));
    let dashboard: Arc<dyn Dashboard> = Arc::new(NullDashboard);
    let nodes = build_topology(&engine, &dashboard, &test_config()).expect("valid config");

    for _ in 0..steps {
        engine.step();
    }

    nodes
        .iter()
        .map(|node| node.chain().iter().map(|block| block.hash()).collect())
        .collect()
}

#[test]
fn test_same_seed_identical_chains() {
    let first = run_chains(12345, 400);
    let second = run_chains(12345, 400);
    assert_eq!(first, second);
}

#[test]
fn test_same_seed_identical_mid_run() {
    // Determinism holds at every boundary, not just at the end.
    let first = run_chains(777, 130);
    let second = run_chains(777, 130);
    assert_eq!(first, second);
}

#[test]
fn test_different_seeds_differ() {
    // Distinct seeds draw distinct per-node cadences and latencies; the
    // resulting graphs differ.
    let build = |seed: u64| -> Vec<i64> {
        let engine = Arc::new(Engine::new(seed));
        let dashboard: Arc<dyn Dashboard> = Arc::new(NullDashboard);
        let nodes = build_topology(&engine, &dashboard, &test_config()).expect("valid config");
        nodes.iter().map(|node| node.config().txsteps).collect()
    };
    assert_ne!(build(1), build(2));
}
