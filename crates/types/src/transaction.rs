//! Transactions with content-addressed identity.

use crate::Hash;
use std::cmp::Ordering;

/// An opaque transaction identified by its content hash.
///
/// The pseudonymous `pubkey` field is derived from a numeric seed; the
/// transaction hash is derived from the pubkey bytes. Two transactions built
/// from the same seed are indistinguishable. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Public-key stand-in: `SHA256(seed as 8 LE bytes)`.
    pubkey: Hash,
    /// Content hash: `SHA256(pubkey bytes)`.
    sha: Hash,
}

impl Transaction {
    /// Create a transaction from a numeric seed.
    pub fn new(seed: i64) -> Self {
        let pubkey = Hash::from_bytes(&seed.to_le_bytes());
        let mut tx = Self {
            pubkey,
            sha: Hash::ZERO,
        };
        tx.recompute_hash();
        tx
    }

    /// Get the transaction hash (content-addressed identity).
    pub fn hash(&self) -> Hash {
        self.sha
    }

    /// Get the pseudonymous public key.
    pub fn pubkey(&self) -> Hash {
        self.pubkey
    }

    /// Re-derive the content hash from the pubkey bytes.
    pub fn recompute_hash(&mut self) {
        self.sha = Hash::from_bytes(self.pubkey.as_bytes());
    }
}

// Identity is the content hash.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.sha == other.sha
    }
}

impl Eq for Transaction {}

// Total order by hash, used to canonicalize mempool ordering.
impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Transaction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sha.cmp(&other.sha)
    }
}
