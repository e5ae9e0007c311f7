//! Simulation parameters.

use obelisk_kernel::Step;
use serde::Deserialize;
use thiserror::Error;

/// Parameters for a simulated network.
///
/// Defaults describe the reference scenario: 50 nodes ticking 20 steps per
/// simulated second, a block round every 10 seconds, a transaction every
/// 1–2 seconds per node, link latencies of 100–400 ms, and a 90% quorum.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Number of nodes in the network.
    #[serde(default = "default_nodes")]
    pub nodes: usize,

    /// Target peer degree per node.
    #[serde(default = "default_peer_degree")]
    pub peer_degree: usize,

    /// Ticks between block proposal attempts.
    #[serde(default = "default_blocksteps")]
    pub blocksteps: Step,

    /// Per-node transaction cadence, drawn uniformly from this inclusive range.
    #[serde(default = "default_txsteps_range")]
    pub txsteps_range: (Step, Step),

    /// Link latency in ticks, drawn uniformly from this inclusive range.
    #[serde(default = "default_latency_range")]
    pub latency_range: (Step, Step),

    /// Fraction of nodes whose opinions must arrive before a tally
    /// (the quorum `Z`, as a share of `nodes`).
    #[serde(default = "default_quorum_fraction")]
    pub quorum_fraction: f64,

    /// Fraction of nodes emitting verbose chain diagnostics.
    #[serde(default = "default_observer_fraction")]
    pub observer_fraction: f64,
}

fn default_nodes() -> usize {
    50
}

fn default_peer_degree() -> usize {
    3
}

fn default_blocksteps() -> Step {
    200
}

fn default_txsteps_range() -> (Step, Step) {
    (20, 40)
}

fn default_latency_range() -> (Step, Step) {
    (2, 8)
}

fn default_quorum_fraction() -> f64 {
    0.9
}

fn default_observer_fraction() -> f64 {
    0.2
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            peer_degree: default_peer_degree(),
            blocksteps: default_blocksteps(),
            txsteps_range: default_txsteps_range(),
            latency_range: default_latency_range(),
            quorum_fraction: default_quorum_fraction(),
            observer_fraction: default_observer_fraction(),
        }
    }
}

impl SimulatorConfig {
    /// Validate the configuration, returning the first violation found.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if self.nodes == 0 {
            return Err(SimulatorError::NoNodes);
        }
        if self.peer_degree >= self.nodes {
            return Err(SimulatorError::DegreeTooHigh {
                degree: self.peer_degree,
                nodes: self.nodes,
            });
        }
        if self.blocksteps < 1 {
            return Err(SimulatorError::InvalidRange {
                what: "blocksteps",
                lo: self.blocksteps,
                hi: self.blocksteps,
            });
        }
        for (what, range) in [
            ("txsteps_range", self.txsteps_range),
            ("latency_range", self.latency_range),
        ] {
            if range.0 < 1 || range.1 < range.0 {
                return Err(SimulatorError::InvalidRange {
                    what,
                    lo: range.0,
                    hi: range.1,
                });
            }
        }
        if !(self.quorum_fraction > 0.0 && self.quorum_fraction <= 1.0) {
            return Err(SimulatorError::InvalidQuorum(self.quorum_fraction));
        }
        if !(0.0..=1.0).contains(&self.observer_fraction) {
            return Err(SimulatorError::InvalidObserverFraction(
                self.observer_fraction,
            ));
        }
        Ok(())
    }

    /// The opinion count required before a node tallies.
    pub fn quorum(&self) -> usize {
        ((self.nodes as f64 * self.quorum_fraction) as usize).max(1)
    }

    /// How many nodes run with the observer flag.
    pub fn observer_count(&self) -> usize {
        (self.nodes as f64 * self.observer_fraction) as usize
    }
}

/// Initialization failures. These abort the simulation; there is no retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("node count must be positive")]
    NoNodes,

    #[error("peer degree {degree} must be below the node count {nodes}")]
    DegreeTooHigh { degree: usize, nodes: usize },

    #[error("invalid {what}: {lo}..={hi}")]
    InvalidRange {
        what: &'static str,
        lo: Step,
        hi: Step,
    },

    #[error("quorum fraction {0} outside (0, 1]")]
    InvalidQuorum(f64),

    #[error("observer fraction {0} outside [0, 1]")]
    InvalidObserverFraction(f64),
}
