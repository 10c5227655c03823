use crate::node::chain::ChainId;
use crate::primitives::{Transaction, TxId};

/// An optional ordering preference over staged transactions (e.g. fee
/// priority). Ties — and, mandatorily, nonce order within one signer —
/// are always broken by `(signer, nonce)` ascending regardless of what
/// a priority comparator says.
pub trait TxPriority: Send + Sync {
    fn compare(&self, a: &Transaction, b: &Transaction) -> std::cmp::Ordering;
}

/// The staging pool. Consumed, not implemented, by the core.
pub trait StagePolicy: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// An ordered snapshot of staged transactions: sorted by `priority`
    /// if given, ties (and same-signer ordering) broken by
    /// `(signer, nonce)` ascending.
    fn list_staged(
        &self,
        chain_id: ChainId,
        priority: Option<&dyn TxPriority>,
    ) -> Result<Vec<Transaction>, Self::Error>;

    /// Permanently evicts a transaction from the pool (used when a
    /// staged tx fails policy validation during gather).
    fn ignore(&self, chain_id: ChainId, tx_id: TxId) -> Result<(), Self::Error>;
}
