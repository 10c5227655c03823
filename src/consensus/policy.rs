use crate::node::chain::ChainId;
use crate::primitives::{Hash, Transaction};

/// Why a staged transaction failed `validate_next_block_tx`. Recovered
/// locally by the gatherer (eviction + continue); never surfaced as a
/// `ProposeError`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}")]
pub struct Violation {
    pub reason: String,
}

impl Violation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// The consensus policy. Consumed, not implemented, by the core: caps,
/// difficulty, and per-tx admission rules are entirely the policy's
/// concern.
pub trait Policy: Send + Sync {
    fn max_block_bytes(&self, index: u64) -> u64;
    fn max_transactions_per_block(&self, index: u64) -> usize;
    fn max_transactions_per_signer_per_block(&self, index: u64) -> usize;
    fn min_transactions_per_block(&self, index: u64) -> usize;

    /// Difficulty for the block that would follow `tip` (the chain
    /// currently holding `count` blocks).
    fn next_block_difficulty(&self, chain_id: ChainId, count: u64, tip: Option<Hash>) -> u64;

    fn validate_next_block_tx(&self, chain_id: ChainId, tx: &Transaction) -> Result<(), Violation>;
}
