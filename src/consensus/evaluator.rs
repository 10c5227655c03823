use crate::node::chain::ChainId;
use crate::primitives::{Address, Block, PreEvaluationBlock, TxId};

/// The deterministic execution result of one transaction's payload
/// against current state.
#[derive(Debug, Clone)]
pub struct ActionEvaluation {
    pub tx_id: TxId,
    pub success: bool,
    /// Evaluator-defined opaque log/trace bytes, passed through to the
    /// store untouched.
    pub output: Vec<u8>,
}

/// What the core persists via `Store::update_tx_executions` once a
/// block has been evaluated.
#[derive(Debug, Clone)]
pub struct TxExecution {
    pub tx_id: TxId,
    pub signer: Address,
    pub nonce: u64,
    pub success: bool,
}

/// The action evaluator. Consumed, not implemented, by the core:
/// running a transaction's payload against state and producing the
/// final state-root hash is entirely the evaluator's concern.
pub trait ActionEvaluator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn evaluate(
        &self,
        pre_evaluation: &PreEvaluationBlock,
        proposer_public_key: &[u8],
        chain_id: ChainId,
    ) -> Result<(Block, Vec<ActionEvaluation>), Self::Error>;
}
