//! Consensus node for the obelisk simulator.
//!
//! Each [`ConsensusNode`] is both a kernel component (its cadences and tally
//! run once per tick) and a mesh participant (packets from its links feed the
//! gossip handlers). A round opens when the block cadence fires on a
//! non-empty mempool, collects peer opinions, and closes at quorum with
//! either a commit of the local candidate or a fetch of the plurality
//! winner.

mod config;
mod node;
mod tally;

pub use config::NodeConfig;
pub use node::{genesis_block, ConsensusNode, NodeStats};
pub use tally::plurality_winner;
