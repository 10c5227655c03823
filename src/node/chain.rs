use crate::primitives::{Block, Hash};
use crate::consensus::evaluator::ActionEvaluation;

/// Identifies which chain a proposal is being built for. Opaque to the
/// core beyond equality/hashing, since chain selection and multi-chain
/// bookkeeping live entirely in the collaborators.
pub type ChainId = u64;

/// The tip's identity plus the cumulative proof-of-work weight through it,
/// so `BlockMetadataBuilder` can compute `total_difficulty` without a
/// dedicated store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipInfo {
    pub hash: Hash,
    pub total_difficulty: u64,
}

/// Fired whenever `Chain::append` advances the tip. `old_tip` is `None`
/// only when the appended block is genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipChanged {
    pub old_tip: Option<Hash>,
    pub new_tip: Hash,
}

/// A live subscription to tip-change events. Dropping the handle
/// unsubscribes; this is the mechanism the Proposer relies on for
/// exception-safe teardown on every exit path, including cancellation
/// or a failure partway through evaluation.
pub trait TipWatch: Send {
    /// Non-blocking check for a pending tip change. Implementations may
    /// coalesce multiple appends into one delivery; the core only needs
    /// to know that *a* change happened.
    fn poll(&mut self) -> Option<TipChanged>;
}

/// The chain handle: tip/count/id plus the two operations the core needs
/// from it (append, and subscribing to tip-change events).
pub trait Chain: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn id(&self) -> ChainId;

    /// Number of blocks on the main branch, i.e. the index the next
    /// block will receive.
    fn count(&self) -> u64;

    fn tip(&self) -> Option<TipInfo>;

    /// Atomically extends the chain with `block` and its action
    /// evaluations, and notifies tip-change subscribers.
    fn append(&self, block: Block, evaluations: Vec<ActionEvaluation>) -> Result<(), Self::Error>;

    fn subscribe_tip_changed(&self) -> Box<dyn TipWatch>;
}
