//! In-memory reference implementations of every collaborator trait.
//! Exists purely so the core's own test suite (and downstream
//! integration tests) can exercise `Proposer` without standing up a
//! real store, codec, or network stack.
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use sha3::{Digest, Sha3_256};

use crate::codec::BlockCodec;
use crate::consensus::evaluator::{ActionEvaluation, ActionEvaluator, TxExecution};
use crate::consensus::policy::{Policy, Violation};
use crate::node::chain::{Chain, ChainId, TipChanged, TipInfo, TipWatch};
use crate::node::stage::{StagePolicy, TxPriority};
use crate::node::store::Store;
use crate::primitives::{Address, Block, BlockMetadata, Hash, PreEvaluationBlock, Transaction, TxId};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TestError(pub String);

/// An in-memory `Store`. `index_block_hash` answers from a map of
/// previously `set_block_hash`-seeded entries; `get_tx_nonce` answers
/// from a map seeded via `set_tx_nonce`, defaulting to 0.
#[derive(Default)]
pub struct MemStore {
    block_hashes: Mutex<HashMap<(ChainId, u64), Hash>>,
    nonces: Mutex<HashMap<(ChainId, Address), u64>>,
    executions: Mutex<Vec<TxExecution>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_hash(&self, chain_id: ChainId, index: u64, hash: Hash) {
        self.block_hashes.lock().unwrap().insert((chain_id, index), hash);
    }

    pub fn set_tx_nonce(&self, chain_id: ChainId, signer: Address, nonce: u64) {
        self.nonces.lock().unwrap().insert((chain_id, signer), nonce);
    }

    pub fn executions(&self) -> Vec<TxExecution> {
        self.executions.lock().unwrap().clone()
    }
}

impl Store for MemStore {
    type Error = TestError;

    fn index_block_hash(&self, chain_id: ChainId, index: u64) -> Result<Option<Hash>, Self::Error> {
        Ok(self.block_hashes.lock().unwrap().get(&(chain_id, index)).copied())
    }

    fn get_tx_nonce(&self, chain_id: ChainId, signer: &Address) -> Result<u64, Self::Error> {
        Ok(self.nonces.lock().unwrap().get(&(chain_id, *signer)).copied().unwrap_or(0))
    }

    fn update_tx_executions(&self, executions: &[TxExecution]) -> Result<(), Self::Error> {
        self.executions.lock().unwrap().extend_from_slice(executions);
        Ok(())
    }
}

/// An in-memory `StagePolicy`: a single shared queue, sorted on read.
#[derive(Default)]
pub struct MemStage {
    staged: Mutex<Vec<Transaction>>,
    ignored: Mutex<Vec<TxId>>,
}

impl MemStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, tx: Transaction) {
        self.staged.lock().unwrap().push(tx);
    }

    pub fn ignored(&self) -> Vec<TxId> {
        self.ignored.lock().unwrap().clone()
    }
}

impl StagePolicy for MemStage {
    type Error = TestError;

    fn list_staged(
        &self,
        _chain_id: ChainId,
        priority: Option<&dyn TxPriority>,
    ) -> Result<Vec<Transaction>, Self::Error> {
        let mut txs = self.staged.lock().unwrap().clone();
        txs.sort_by(|a, b| {
            if let Some(priority) = priority {
                let ord = priority.compare(a, b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (a.signer, a.nonce).cmp(&(b.signer, b.nonce))
        });
        Ok(txs)
    }

    fn ignore(&self, _chain_id: ChainId, tx_id: TxId) -> Result<(), Self::Error> {
        self.staged.lock().unwrap().retain(|tx| tx.id != tx_id);
        self.ignored.lock().unwrap().push(tx_id);
        Ok(())
    }
}

/// A permissive `Policy` with generous, configurable caps. All
/// `validate_next_block_tx` calls succeed unless `reject` has been
/// populated with the offending tx id.
pub struct TestPolicy {
    pub max_block_bytes: u64,
    pub max_transactions: usize,
    pub max_transactions_per_signer: usize,
    pub min_transactions: usize,
    pub difficulty: u64,
    pub rejected: Mutex<Vec<TxId>>,
}

impl Default for TestPolicy {
    fn default() -> Self {
        Self {
            max_block_bytes: 1_000_000,
            max_transactions: 1_000,
            max_transactions_per_signer: 1_000,
            min_transactions: 0,
            difficulty: 0,
            rejected: Mutex::new(Vec::new()),
        }
    }
}

impl TestPolicy {
    pub fn reject(&self, tx_id: TxId) {
        self.rejected.lock().unwrap().push(tx_id);
    }
}

impl Policy for TestPolicy {
    fn max_block_bytes(&self, _index: u64) -> u64 {
        self.max_block_bytes
    }

    fn max_transactions_per_block(&self, _index: u64) -> usize {
        self.max_transactions
    }

    fn max_transactions_per_signer_per_block(&self, _index: u64) -> usize {
        self.max_transactions_per_signer
    }

    fn min_transactions_per_block(&self, _index: u64) -> usize {
        self.min_transactions
    }

    fn next_block_difficulty(&self, _chain_id: ChainId, _count: u64, _tip: Option<Hash>) -> u64 {
        self.difficulty
    }

    fn validate_next_block_tx(&self, _chain_id: ChainId, tx: &Transaction) -> Result<(), Violation> {
        if self.rejected.lock().unwrap().contains(&tx.id) {
            return Err(Violation::new("rejected by test policy"));
        }
        Ok(())
    }
}

/// A `BlockCodec` backed by SHA3-256. `Encoding` is a running byte
/// count rather than a real partial encoding — cheap, and sufficient
/// since the core only ever reads `encoding_length` from it.
#[derive(Default)]
pub struct TestCodec;

impl TestCodec {
    pub fn new() -> Self {
        Self
    }

    fn header_len(&self, metadata: &BlockMetadata) -> u64 {
        let fixed = 8 * 4 + Self::DIGEST_SIZE as u64 * 3;
        let sig = if metadata.public_key.is_some() { Self::PLACEHOLDER_SIGNATURE_BYTES as u64 } else { 0 };
        fixed + sig
    }
}

impl BlockCodec for TestCodec {
    type Encoding = u64;

    const DIGEST_SIZE: usize = 32;
    const PLACEHOLDER_SIGNATURE_BYTES: usize = 71;

    fn empty_encoding(&self, metadata: &BlockMetadata) -> Self::Encoding {
        self.header_len(metadata)
    }

    fn append_tx(&self, encoding: &Self::Encoding, tx: &Transaction) -> Self::Encoding {
        encoding + tx.size_bytes
    }

    fn encoding_length(&self, encoding: &Self::Encoding) -> u64 {
        *encoding
    }

    fn pre_evaluation_hash(&self, metadata: &BlockMetadata, transactions: &[Transaction], nonce: u64) -> Hash {
        let mut hasher = Sha3_256::new();
        hasher.update(metadata.index.to_le_bytes());
        hasher.update(metadata.difficulty.to_le_bytes());
        hasher.update(metadata.total_difficulty.to_le_bytes());
        hasher.update(metadata.timestamp.to_le_bytes());
        if let Some(prev) = metadata.previous_hash {
            hasher.update(prev);
        }
        for tx in transactions {
            hasher.update(tx.id);
            hasher.update(tx.nonce.to_le_bytes());
        }
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    fn meets_target(&self, hash: &Hash, difficulty: u64) -> bool {
        leading_zero_bits(hash) >= difficulty
    }

    fn block_hash(&self, block: &Block) -> Hash {
        let mut hasher = Sha3_256::new();
        hasher.update(block.pre_evaluation.pre_evaluation_hash);
        hasher.update(block.state_root_hash);
        if let Some(sig) = &block.signature {
            hasher.update(sig);
        }
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

fn leading_zero_bits(hash: &Hash) -> u64 {
    let mut count = 0u64;
    for byte in hash {
        if *byte == 0 {
            count += 8;
            continue;
        }
        count += byte.leading_zeros() as u64;
        break;
    }
    count
}

/// An `ActionEvaluator` that marks every transaction successful and
/// derives a deterministic state-root from the pre-evaluation hash.
#[derive(Default)]
pub struct TestEvaluator;

impl TestEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl ActionEvaluator for TestEvaluator {
    type Error = TestError;

    fn evaluate(
        &self,
        pre_evaluation: &PreEvaluationBlock,
        _proposer_public_key: &[u8],
        _chain_id: ChainId,
    ) -> Result<(Block, Vec<ActionEvaluation>), Self::Error> {
        let mut hasher = Sha3_256::new();
        hasher.update(pre_evaluation.pre_evaluation_hash);
        hasher.update(b"state-root");
        let digest = hasher.finalize();
        let mut state_root_hash = [0u8; 32];
        state_root_hash.copy_from_slice(&digest);

        let evaluations: Vec<ActionEvaluation> = pre_evaluation
            .content
            .transactions
            .iter()
            .map(|tx| ActionEvaluation { tx_id: tx.id, success: true, output: Vec::new() })
            .collect();

        let mut block = Block {
            pre_evaluation: pre_evaluation.clone(),
            state_root_hash,
            signature: None,
            hash: [0u8; 32],
        };
        let codec = TestCodec::new();
        block.hash = codec.block_hash(&block);

        Ok((block, evaluations))
    }
}

struct ChannelTipWatch {
    receiver: Receiver<TipChanged>,
}

impl TipWatch for ChannelTipWatch {
    fn poll(&mut self) -> Option<TipChanged> {
        self.receiver.try_recv().ok()
    }
}

struct TestChainState {
    count: u64,
    tip: Option<TipInfo>,
    subscribers: Vec<Sender<TipChanged>>,
}

/// A `Chain` that keeps its state in memory and fans out `TipChanged`
/// over one `mpsc` channel per live subscription.
pub struct TestChain {
    id: ChainId,
    state: Mutex<TestChainState>,
}

impl TestChain {
    pub fn new(id: ChainId) -> Self {
        Self { id, state: Mutex::new(TestChainState { count: 0, tip: None, subscribers: Vec::new() }) }
    }

    /// Test-only: forcibly advances the tip without going through
    /// `append`, to simulate a concurrent actor racing the proposer.
    pub fn force_tip_change(&self, new_tip: Hash, new_total_difficulty: u64) {
        let mut state = self.state.lock().unwrap();
        let old_tip = state.tip.map(|t| t.hash);
        state.tip = Some(TipInfo { hash: new_tip, total_difficulty: new_total_difficulty });
        state.count += 1;
        state.subscribers.retain(|s| s.send(TipChanged { old_tip, new_tip }).is_ok());
    }
}

impl Chain for TestChain {
    type Error = TestError;

    fn id(&self) -> ChainId {
        self.id
    }

    fn count(&self) -> u64 {
        self.state.lock().unwrap().count
    }

    fn tip(&self) -> Option<TipInfo> {
        self.state.lock().unwrap().tip
    }

    fn append(&self, block: Block, _evaluations: Vec<ActionEvaluation>) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        let old_tip = state.tip.map(|t| t.hash);
        let new_tip = block.hash;
        state.tip = Some(TipInfo { hash: new_tip, total_difficulty: block.pre_evaluation.content.metadata.total_difficulty });
        state.count += 1;
        state.subscribers.retain(|s| s.send(TipChanged { old_tip, new_tip }).is_ok());
        Ok(())
    }

    fn subscribe_tip_changed(&self) -> Box<dyn TipWatch> {
        let (tx, rx) = channel();
        self.state.lock().unwrap().subscribers.push(tx);
        Box::new(ChannelTipWatch { receiver: rx })
    }
}
