use crate::consensus::evaluator::TxExecution;
use crate::node::chain::ChainId;
use crate::primitives::{Address, Hash};

/// The persistent store. Consumed, not implemented, by the core: block
/// and transaction byte formats are entirely the store's concern.
pub trait Store: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Hash of the block at `index` on `chain_id`'s main branch, or
    /// `None` if no such block exists yet.
    fn index_block_hash(&self, chain_id: ChainId, index: u64) -> Result<Option<Hash>, Self::Error>;

    /// Next nonce expected from `signer` (0 if the signer has never been
    /// seen on this chain).
    fn get_tx_nonce(&self, chain_id: ChainId, signer: &Address) -> Result<u64, Self::Error>;

    fn update_tx_executions(&self, executions: &[TxExecution]) -> Result<(), Self::Error>;
}
