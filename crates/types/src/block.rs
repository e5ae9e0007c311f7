//! Blocks: ordered transaction collections with a recomputable identity.

use crate::{merkle_root, Hash, Transaction};

/// A block in the simulated chain.
///
/// Identity is `sha = SHA256(prev_block || merkle)`, where `merkle`
/// aggregates the contained transaction hashes. Any mutation must be
/// followed by [`recompute_hash`](Self::recompute_hash); blocks are treated
/// as frozen thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Transactions committed by this block, in canonical (hash) order.
    pub txs: Vec<Transaction>,
    /// Hash of the predecessor block; zero for genesis.
    pub prev_block: Hash,
    /// Merkle root over the transaction hashes.
    pub merkle: Hash,
    /// Block identity, `SHA256(prev_block || merkle)`.
    pub sha: Hash,
}

impl Block {
    /// Build a block over `txs` extending `prev_block`, hashes populated.
    pub fn new(prev_block: Hash, txs: Vec<Transaction>) -> Self {
        let mut block = Self {
            txs,
            prev_block,
            merkle: Hash::ZERO,
            sha: Hash::ZERO,
        };
        block.recompute_hash();
        block
    }

    /// Get the block hash (content-addressed identity).
    pub fn hash(&self) -> Hash {
        self.sha
    }

    /// Populate `merkle` from the transaction hashes, then `sha` from
    /// `prev_block` and `merkle`.
    pub fn recompute_hash(&mut self) {
        let hashes: Vec<Hash> = self.txs.iter().map(Transaction::hash).collect();
        self.merkle = merkle_root(&hashes);
        self.sha = Hash::from_parts(&[self.prev_block.as_bytes(), self.merkle.as_bytes()]);
    }

    /// Whether a transaction with `hash` is committed by this block.
    pub fn contains_tx(&self, hash: Hash) -> bool {
        self.txs.iter().any(|tx| tx.hash() == hash)
    }

    /// Verify that `merkle` and `sha` match the block contents.
    pub fn verify(&self) -> bool {
        let hashes: Vec<Hash> = self.txs.iter().map(Transaction::hash).collect();
        self.merkle == merkle_root(&hashes)
            && self.sha == Hash::from_parts(&[self.prev_block.as_bytes(), self.merkle.as_bytes()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_txs() -> Vec<Transaction> {
        vec![Transaction::new(1), Transaction::new(2), Transaction::new(3)]
    }

    #[test]
    fn test_new_populates_hashes() {
        let block = Block::new(Hash::ZERO, sample_txs());
        assert!(block.verify());
        assert_ne!(block.sha, Hash::ZERO);
        assert_ne!(block.merkle, Hash::ZERO);
    }

    #[test]
    fn test_sha_binds_prev_and_merkle() {
        let block = Block::new(Hash::ZERO, sample_txs());
        let expected = Hash::from_parts(&[block.prev_block.as_bytes(), block.merkle.as_bytes()]);
        assert_eq!(block.sha, expected);
    }

    #[test]
    fn test_identity_depends_on_predecessor() {
        let a = Block::new(Hash::ZERO, sample_txs());
        let b = Block::new(Hash::from_bytes(b"other tip"), sample_txs());
        assert_eq!(a.merkle, b.merkle);
        assert_ne!(a.sha, b.sha);
    }

    #[test]
    fn test_recompute_after_mutation() {
        let mut block = Block::new(Hash::ZERO, sample_txs());
        let before = block.sha;
        block.txs.push(Transaction::new(4));
        block.recompute_hash();
        assert_ne!(block.sha, before);
        assert!(block.verify());
    }

    #[test]
    fn test_empty_block_merkle_is_zero() {
        let block = Block::new(Hash::ZERO, Vec::new());
        assert_eq!(block.merkle, Hash::ZERO);
        assert!(block.verify());
    }

    #[test]
    fn test_contains_tx() {
        let block = Block::new(Hash::ZERO, sample_txs());
        assert!(block.contains_tx(Transaction::new(2).hash()));
        assert!(!block.contains_tx(Transaction::new(99).hash()));
    }
}
