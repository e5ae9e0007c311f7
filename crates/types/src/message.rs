//! Gossip message types exchanged between nodes.

use crate::{Block, Hash, Transaction};
use std::fmt;

/// Identifier of a node in the peer mesh. Assigned monotonically at
/// construction; stands in for a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node's declaration of which candidate block it considers authoritative
/// for a consensus round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opinion {
    /// Originating node.
    pub node: NodeId,
    /// Consensus round: `current_step / blocksteps` at proposal time.
    pub seq: i64,
    /// The candidate block the originator backs.
    pub block_sha: Hash,
}

/// Everything that travels over the simulated links.
///
/// Packets are passive data; links clone them once per destination queue.
#[derive(Debug, Clone)]
pub enum Packet {
    /// Gossip a transaction into peer mempools.
    Transaction(Transaction),
    /// Gossip a full block: a committed extension or a fetch reply.
    Block(Block),
    /// Gossip an opinion for the active round.
    Opinion(Opinion),
    /// Ask peers to supply the block with this hash.
    BlockRequest(Hash),
}

impl Packet {
    /// Short tag for tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Transaction(_) => "transaction",
            Packet::Block(_) => "block",
            Packet::Opinion(_) => "opinion",
            Packet::BlockRequest(_) => "block_request",
        }
    }
}
