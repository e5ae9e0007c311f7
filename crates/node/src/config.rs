//! Consensus node configuration.

use obelisk_kernel::Step;

/// Configuration for a [`ConsensusNode`](crate::ConsensusNode).
///
/// Defaults correspond to a 50-node network ticking 20 steps per simulated
/// second: a block round every 10 seconds, a 90% quorum.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Ticks between block proposal attempts.
    pub blocksteps: Step,

    /// Ticks between locally minted transactions.
    pub txsteps: Step,

    /// Opinions required before a round is tallied (the quorum `Z`).
    pub quorum: usize,

    /// Emit a chain line to the dashboard on every chain extension.
    /// No effect on protocol behavior.
    pub observer: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            blocksteps: 200,
            txsteps: 30,
            quorum: 45,
            observer: false,
        }
    }
}
