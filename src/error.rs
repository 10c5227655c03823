use std::error::Error as StdError;

use crate::gather::GatherError;
use crate::miner::CancelReason;

/// Errors surfaced by `Proposer::propose`. Collaborator errors are
/// boxed rather than threaded through as generic parameters, so this
/// type stays concrete regardless of which `Policy`/`Store`/etc. a
/// caller plugs in.
#[derive(Debug, thiserror::Error)]
pub enum ProposeError {
    #[error("gathered {have} transactions, need at least {need}")]
    InsufficientTransactions { have: usize, need: usize },

    #[error("proposal cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("mining exhausted the nonce space without a solution")]
    NonceSpaceExhausted,

    #[error("gather failed: {0}")]
    Gather(#[source] GatherError),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn StdError + Send + Sync>),

    #[error("chain error: {0}")]
    Chain(#[source] Box<dyn StdError + Send + Sync>),

    #[error("action evaluator error: {0}")]
    Evaluator(#[source] Box<dyn StdError + Send + Sync>),
}
