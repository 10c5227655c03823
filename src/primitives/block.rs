// Data structures: block metadata and the block shapes that the core
// carries a proposal through (content -> pre-evaluation -> final).
use super::transaction::Transaction;

/// A digest produced by the codec. The core fixes this at 32 bytes (the
/// width every collaborator in this deployment's codec family uses); a
/// codec with a different native digest width would need its own
/// build of this crate.
pub type Hash = [u8; 32];

/// Ephemeral block header fields, discarded if mining aborts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockMetadata {
    pub index: u64,
    pub difficulty: u64,
    pub total_difficulty: u64,
    /// Proposer public key. Absent in legacy genesis blocks.
    pub public_key: Option<Vec<u8>>,
    /// Absent iff `index == 0`.
    pub previous_hash: Option<Hash>,
    pub timestamp: u64,
}

/// Metadata plus the gatherer's fixed transaction order.
#[derive(Debug, Clone)]
pub struct BlockContent {
    pub metadata: BlockMetadata,
    pub transactions: Vec<Transaction>,
}

/// A block whose proof-of-work search has succeeded but whose
/// state-root hash (post action-evaluation) is not yet set.
#[derive(Debug, Clone)]
pub struct PreEvaluationBlock {
    pub content: BlockContent,
    pub nonce: u64,
    pub pre_evaluation_hash: Hash,
}

/// A fully finalized, immutable block.
#[derive(Debug, Clone)]
pub struct Block {
    pub pre_evaluation: PreEvaluationBlock,
    pub state_root_hash: Hash,
    pub signature: Option<Vec<u8>>,
    pub hash: Hash,
}
