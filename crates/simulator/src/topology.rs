//! Random peer graph construction.

use crate::SimulatorConfig;
use crate::SimulatorError;
use obelisk_kernel::{Component, Dashboard, Engine};
use obelisk_net::{connect, MeshNode};
use obelisk_node::{ConsensusNode, NodeConfig};
use obelisk_types::NodeId;
use std::sync::Arc;
use tracing::info;

/// Build the node population and wire a connected random peer graph.
///
/// Every node is registered with the engine. Node `j > 0` first connects to
/// a uniformly chosen earlier node, which keeps the graph connected; each
/// node then attempts up to `peer_degree` further connects to random
/// non-self, non-peer candidates. Latencies and per-node transaction
/// cadences are drawn from the engine PRNG, so the whole graph is a function
/// of the seed.
pub fn build_topology(
    engine: &Arc<Engine>,
    dashboard: &Arc<dyn Dashboard>,
    config: &SimulatorConfig,
) -> Result<Vec<Arc<ConsensusNode>>, SimulatorError> {
    config.validate()?;

    let quorum = config.quorum();
    let observers = config.observer_count();

    let mut nodes = Vec::with_capacity(config.nodes);
    for i in 0..config.nodes {
        let node_config = NodeConfig {
            blocksteps: config.blocksteps,
            txsteps: engine.rand_int(config.txsteps_range.0, config.txsteps_range.1),
            quorum,
            observer: i < observers,
        };
        let node = ConsensusNode::new(
            NodeId(i as u32 + 1),
            node_config,
            engine,
            Arc::clone(dashboard),
        );
        engine.register(Arc::clone(&node) as Arc<dyn Component>);
        nodes.push(node);
    }

    // Connectivity pass: attach every node to some earlier node.
    for j in 1..nodes.len() {
        let earlier = engine.rand_int(0, j as i64 - 1) as usize;
        let latency = engine.rand_int(config.latency_range.0, config.latency_range.1);
        connect(engine, &nodes[j], &nodes[earlier], latency);
    }

    // Degree pass: top every node up toward the target with random peers.
    for j in 0..nodes.len() {
        let mut attempts = config.peer_degree;
        while nodes[j].mesh().connections() < config.peer_degree && attempts > 0 {
            attempts -= 1;
            let candidate = engine.rand_int(0, nodes.len() as i64 - 1) as usize;
            if candidate == j || nodes[j].mesh().has_peer(nodes[candidate].id()) {
                continue;
            }
            let latency = engine.rand_int(config.latency_range.0, config.latency_range.1);
            connect(engine, &nodes[j], &nodes[candidate], latency);
        }
    }

    info!(
        nodes = nodes.len(),
        quorum,
        observers,
        components = engine.component_count(),
        "topology built"
    );

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use obelisk_kernel::NullDashboard;

    fn build(nodes: usize, degree: usize, seed: u64) -> Vec<Arc<ConsensusNode>> {
        let engine = Arc::new(Engine::new(seed));
        let dashboard: Arc<dyn Dashboard> = Arc::new(NullDashboard);
        let config = SimulatorConfig {
            nodes,
            peer_degree: degree,
            ..Default::default()
        };
        build_topology(&engine, &dashboard, &config).expect("valid config")
    }

    #[test]
    fn test_every_node_connected() {
        let nodes = build(20, 3, 42);
        assert_eq!(nodes.len(), 20);
        assert!(nodes.iter().all(|n| n.mesh().is_connected()));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let nodes = build(5, 2, 42);
        let ids: Vec<u32> = nodes.iter().map(|n| n.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_graph_reaches_all_nodes() {
        // Breadth-first walk over the peer tables must visit every node:
        // the connectivity pass guarantees a single component.
        let nodes = build(25, 2, 7);
        let mut seen = vec![false; nodes.len()];
        let mut frontier = vec![0usize];
        seen[0] = true;
        while let Some(current) = frontier.pop() {
            for (other, node) in nodes.iter().enumerate() {
                if !seen[other] && nodes[current].mesh().has_peer(node.id()) {
                    seen[other] = true;
                    frontier.push(other);
                }
            }
        }
        assert!(seen.iter().all(|&v| v), "graph is not connected");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = Arc::new(Engine::new(1));
        let dashboard: Arc<dyn Dashboard> = Arc::new(NullDashboard);
        let config = SimulatorConfig {
            nodes: 0,
            ..Default::default()
        };
        assert!(build_topology(&engine, &dashboard, &config).is_err());
    }

    #[test]
    fn test_same_seed_same_graph() {
        let a = build(15, 3, 1234);
        let b = build(15, 3, 1234);
        for (left, right) in a.iter().zip(&b) {
            assert_eq!(left.mesh().connections(), right.mesh().connections());
            assert_eq!(left.config().txsteps, right.config().txsteps);
            assert_eq!(left.config().observer, right.config().observer);
        }
    }
}
