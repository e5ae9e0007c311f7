//! Core chain types for the obelisk consensus simulator.
//!
//! Everything in this crate is a content-addressed value: transactions and
//! blocks carry their own SHA-256 identity and can be shared freely between
//! nodes and packet queues.

mod block;
mod hash;
mod message;
mod transaction;

pub use block::Block;
pub use hash::{merkle_root, Hash, HexError};
pub use message::{NodeId, Opinion, Packet};
pub use transaction::Transaction;
