//! Consensus node: transaction pool, block proposal, opinion tally, and
//! block-fetch recovery.

use crate::tally::plurality_winner;
use crate::NodeConfig;
use obelisk_kernel::{Component, Dashboard, Engine, Step};
use obelisk_net::{Mesh, MeshNode};
use obelisk_types::{Block, Hash, NodeId, Opinion, Packet, Transaction};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Seed of the single transaction in the shared genesis block. Negative, so
/// it cannot collide with a runtime-minted transaction seed.
const GENESIS_TX_SEED: i64 = -1;

/// The deterministic first block shared by every node at startup.
pub fn genesis_block() -> Block {
    Block::new(Hash::ZERO, vec![Transaction::new(GENESIS_TX_SEED)])
}

/// Counters accumulated over a node's lifetime. Diagnostic only; no
/// protocol behavior depends on them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeStats {
    /// Transactions admitted to the mempool (minted and gossiped).
    pub txs_admitted: u64,
    /// Transactions minted locally on the transaction cadence.
    pub txs_minted: u64,
    /// Rounds in which this node proposed a candidate.
    pub rounds_proposed: u64,
    /// Rounds won, committing the local candidate.
    pub rounds_won: u64,
    /// Rounds lost to a peer's candidate.
    pub rounds_lost: u64,
    /// Foreign blocks appended to the chain.
    pub blocks_accepted: u64,
    /// Blocks dropped because they did not extend the tip.
    pub blocks_stale: u64,
    /// Fetch requests answered from the local chain.
    pub fetches_served: u64,
}

impl NodeStats {
    /// Total chain extensions: own commits plus accepted foreign blocks.
    pub fn blocks_committed(&self) -> u64 {
        self.rounds_won + self.blocks_accepted
    }
}

/// Mutable consensus state, serialized by the node's mutex.
///
/// Entry points lock once; the helpers below take the guarded state, so no
/// path ever re-locks.
struct ChainState {
    /// Transactions not yet committed; drained into candidates in hash order.
    mempool: Vec<Transaction>,
    /// The appended chain. `chain[0]` is genesis and is never empty.
    chain: Vec<Block>,
    /// Locally proposed candidate while a round is active.
    current_block: Option<Block>,
    /// At most one opinion per originating node.
    opinions: BTreeMap<NodeId, Opinion>,
    /// Active round number, −1 when idle.
    cur_seq: i64,
    /// Tick of the last proposal attempt.
    last_blockstep: Step,
    /// Tick of the last locally minted transaction.
    last_txstep: Step,
    /// Tally winner awaited from a pending fetch.
    curr_winner: Option<Hash>,
    /// Lifetime counters.
    stats: NodeStats,
}

/// A consensus node in the simulated peer mesh.
///
/// Registered with the kernel as a component: each tick it runs its block
/// and transaction cadences and tallies the round once enough opinions have
/// arrived. Packets delivered by its links feed [`MeshNode::on_packet`].
pub struct ConsensusNode {
    id: NodeId,
    config: NodeConfig,
    engine: Weak<Engine>,
    mesh: Mesh,
    dashboard: Arc<dyn Dashboard>,
    state: Mutex<ChainState>,
}

impl ConsensusNode {
    /// Create a node with a genesis-initialized chain. The node is not yet
    /// registered with the engine nor connected to any peer.
    pub fn new(
        id: NodeId,
        config: NodeConfig,
        engine: &Arc<Engine>,
        dashboard: Arc<dyn Dashboard>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            config,
            engine: Arc::downgrade(engine),
            mesh: Mesh::new(),
            dashboard,
            state: Mutex::new(ChainState {
                mempool: Vec::new(),
                chain: vec![genesis_block()],
                current_block: None,
                opinions: BTreeMap::new(),
                cur_seq: -1,
                last_blockstep: 0,
                last_txstep: 0,
                curr_winner: None,
                stats: NodeStats::default(),
            }),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Admit `tx` unless it is already pooled or committed. Admitted
    /// transactions are gossiped to all neighbors. Returns whether the
    /// transaction was admitted.
    pub fn add_tx(&self, tx: Transaction, now: Step) -> bool {
        let mut state = self.state.lock();
        self.admit_tx(&mut state, tx, now)
    }

    // ─── Test / harness accessors ───

    /// Snapshot of the appended chain.
    pub fn chain(&self) -> Vec<Block> {
        self.state.lock().chain.clone()
    }

    /// Hash of the chain tip.
    pub fn tip(&self) -> Hash {
        self.state.lock().chain.last().expect("chain starts at genesis").hash()
    }

    /// Number of pooled (uncommitted) transactions.
    pub fn mempool_len(&self) -> usize {
        self.state.lock().mempool.len()
    }

    /// Active round number, −1 when idle.
    pub fn cur_seq(&self) -> i64 {
        self.state.lock().cur_seq
    }

    /// Number of recorded opinions for the active round.
    pub fn opinion_count(&self) -> usize {
        self.state.lock().opinions.len()
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> NodeStats {
        self.state.lock().stats.clone()
    }

    // ─── Internals (called with the state lock held) ───

    fn has_tx(state: &ChainState, hash: Hash) -> bool {
        state.mempool.iter().any(|tx| tx.hash() == hash)
            || state.chain.iter().any(|block| block.contains_tx(hash))
    }

    fn admit_tx(&self, state: &mut ChainState, tx: Transaction, now: Step) -> bool {
        if Self::has_tx(state, tx.hash()) {
            return false;
        }
        trace!(node = %self.id, tx = %tx.hash().shortcode(), "transaction admitted");
        state.mempool.push(tx.clone());
        state.stats.txs_admitted += 1;
        self.mesh.broadcast(&Packet::Transaction(tx), now);
        true
    }

    /// Start a round: drain the sorted mempool into a candidate block and
    /// broadcast the node's opinion. No-op while the mempool is empty.
    fn create_block(&self, state: &mut ChainState, now: Step) {
        if state.mempool.is_empty() {
            return;
        }

        state.cur_seq = now / self.config.blocksteps;
        state.mempool.sort();
        let txs = std::mem::take(&mut state.mempool);
        let prev = state.chain.last().expect("chain starts at genesis").hash();
        let block = Block::new(prev, txs);

        debug!(
            node = %self.id,
            seq = state.cur_seq,
            candidate = %block.hash().shortcode(),
            txs = block.txs.len(),
            "proposing candidate"
        );

        let opinion = Opinion {
            node: self.id,
            seq: state.cur_seq,
            block_sha: block.hash(),
        };
        state.current_block = Some(block);
        state.stats.rounds_proposed += 1;
        // Record our own opinion so the tally includes self.
        state.opinions.insert(self.id, opinion);
        self.mesh.broadcast(&Packet::Opinion(opinion), now);
    }

    /// Decide the round: commit our candidate if it won the plurality,
    /// otherwise remember the winner and ask peers to supply it. Ends the
    /// round either way.
    fn tally(&self, state: &mut ChainState, now: Step) {
        let cur_seq = state.cur_seq;
        state.opinions.retain(|_, opinion| opinion.seq == cur_seq);

        let mut hashes: Vec<Hash> = state.opinions.values().map(|o| o.block_sha).collect();
        hashes.sort();
        let winner = plurality_winner(&hashes);

        let won = state
            .current_block
            .as_ref()
            .is_some_and(|candidate| candidate.hash() == winner);

        if won {
            let block = state.current_block.take().expect("candidate checked above");
            debug!(node = %self.id, block = %winner.shortcode(), "candidate won; committing");
            state.stats.rounds_won += 1;
            self.extend_chain(state, block);
        } else {
            debug!(node = %self.id, winner = %winner.shortcode(), "candidate lost; fetching winner");
            state.stats.rounds_lost += 1;
            state.curr_winner = Some(winner);
            self.mesh.broadcast(&Packet::BlockRequest(winner), now);
        }

        state.opinions.clear();
        state.cur_seq = -1;
        state.current_block = None;
    }

    /// Append a block to the chain, purge its transactions from the mempool,
    /// and emit the observer chain line.
    fn extend_chain(&self, state: &mut ChainState, block: Block) {
        state.mempool.retain(|tx| !block.contains_tx(tx.hash()));
        state.chain.push(block);

        if self.config.observer {
            let mut line = format!("{}-chain:", self.id);
            for block in &state.chain {
                line.push(' ');
                line.push_str(&block.hash().shortcode());
            }
            self.dashboard.log(&line);
        }
    }

    // ─── Packet handlers ───

    fn on_transaction(&self, tx: Transaction, now: Step) {
        let mut state = self.state.lock();
        self.admit_tx(&mut state, tx, now);
    }

    /// Opinions are only meaningful while a round is active; the first
    /// opinion per originator wins and is passed along.
    fn on_opinion(&self, opinion: Opinion, now: Step) {
        let mut state = self.state.lock();
        if state.cur_seq < 0 {
            trace!(node = %self.id, from = %opinion.node, "opinion dropped: no active round");
            return;
        }
        if state.opinions.contains_key(&opinion.node) {
            return;
        }
        state.opinions.insert(opinion.node, opinion);
        self.mesh.broadcast(&Packet::Opinion(opinion), now);
    }

    /// Accept an unseen block that extends the tip; anything else drops.
    fn on_block(&self, block: Block, now: Step) {
        let mut state = self.state.lock();
        let sha = block.hash();

        if state.chain.iter().any(|b| b.hash() == sha) {
            return;
        }
        let tip = state.chain.last().expect("chain starts at genesis").hash();
        if block.prev_block != tip {
            debug!(node = %self.id, block = %sha.shortcode(), "block does not extend tip; dropped");
            state.stats.blocks_stale += 1;
            return;
        }

        if let Some(awaited) = state.curr_winner {
            if awaited != sha {
                warn!(
                    node = %self.id,
                    awaited = %awaited.shortcode(),
                    got = %sha.shortcode(),
                    "accepted block differs from awaited winner"
                );
            }
        }
        state.curr_winner = None;
        state.stats.blocks_accepted += 1;

        self.extend_chain(&mut state, block.clone());
        self.mesh.broadcast(&Packet::Block(block), now);
    }

    /// Reply to a fetch with the requested block, if we hold it. Unknown
    /// hashes are ignored.
    fn on_block_request(&self, hash: Hash, now: Step) {
        let mut state = self.state.lock();
        if let Some(block) = state.chain.iter().find(|b| b.hash() == hash) {
            trace!(node = %self.id, block = %hash.shortcode(), "serving fetch request");
            let reply = Packet::Block(block.clone());
            state.stats.fetches_served += 1;
            self.mesh.broadcast(&reply, now);
        }
    }
}

impl Component for ConsensusNode {
    fn step(&self, now: Step) {
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        let mut state = self.state.lock();

        if now - state.last_blockstep > self.config.blocksteps {
            state.last_blockstep = now;
            self.create_block(&mut state, now);
        }

        if now - state.last_txstep > self.config.txsteps {
            state.last_txstep = now;
            let seed = engine.rand_int(0, i64::MAX);
            if self.admit_tx(&mut state, Transaction::new(seed), now) {
                state.stats.txs_minted += 1;
            }
        }

        if state.opinions.len() >= self.config.quorum {
            self.tally(&mut state, now);
        }
    }
}

impl MeshNode for ConsensusNode {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn on_packet(&self, pkt: Packet, now: Step) {
        match pkt {
            Packet::Transaction(tx) => self.on_transaction(tx, now),
            Packet::Opinion(opinion) => self.on_opinion(opinion, now),
            Packet::Block(block) => self.on_block(block, now),
            Packet::BlockRequest(hash) => self.on_block_request(hash, now),
        }
    }
}
