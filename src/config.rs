use std::time::Duration;

use crate::miner::CancelToken;
use crate::node::stage::TxPriority;

/// Gather-time budget. The teacher hard-codes this at 4s; exposed here
/// as a configurable default since the gatherer is the largest single
/// component by share of the admission pipeline and an embedder may
/// need to tune the collection window for its own transaction volume.
pub const DEFAULT_GATHER_BUDGET: Duration = Duration::from_secs(4);

/// Resolved admission caps and budget for one gather call, after
/// `ProposeOptions` overrides (if any) have been applied over `Policy`
/// defaults.
#[derive(Debug, Clone)]
pub struct GatherConfig {
    pub max_block_bytes: u64,
    pub max_transactions: usize,
    pub max_transactions_per_signer: usize,
    pub gather_budget: Duration,
}

/// Per-call overrides to `Proposer::propose`. Every cap defaults from
/// `Policy` at the chain's current block count when left `None`.
pub struct ProposeOptions<'a> {
    pub timestamp: Option<u64>,
    pub append: bool,
    pub max_block_bytes: Option<u64>,
    pub max_transactions: Option<usize>,
    pub max_transactions_per_signer: Option<usize>,
    pub gather_budget: Duration,
    pub tx_priority: Option<&'a dyn TxPriority>,
    pub cancel: Option<CancelToken>,
    pub num_mining_workers: usize,
}

impl<'a> Default for ProposeOptions<'a> {
    fn default() -> Self {
        Self {
            timestamp: None,
            append: true,
            max_block_bytes: None,
            max_transactions: None,
            max_transactions_per_signer: None,
            gather_budget: DEFAULT_GATHER_BUDGET,
            tx_priority: None,
            cancel: None,
            num_mining_workers: default_worker_count(),
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
