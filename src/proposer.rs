use crate::codec::BlockCodec;
use crate::config::{GatherConfig, ProposeOptions};
use crate::consensus::evaluator::{ActionEvaluator, TxExecution};
use crate::consensus::metadata::BlockMetadataBuilder;
use crate::consensus::policy::Policy;
use crate::error::ProposeError;
use crate::gather::TxGatherer;
use crate::miner::{CancelState, MineError, MiningDriver, TipWatcherGuard};
use crate::node::chain::{Chain, ChainId};
use crate::node::stage::StagePolicy;
use crate::node::store::Store;
use crate::primitives::{Block, BlockContent};

/// Assembles the external collaborators into one block-proposal
/// pipeline: gather → enforce minimum → mine → evaluate → append.
pub struct Proposer<P, S, SP, CH, AE, BC> {
    pub policy: P,
    pub store: S,
    pub stage: SP,
    pub chain: CH,
    pub evaluator: AE,
    pub codec: BC,
    pub chain_id: ChainId,
}

impl<P, S, SP, CH, AE, BC> Proposer<P, S, SP, CH, AE, BC>
where
    P: Policy,
    S: Store,
    SP: StagePolicy,
    CH: Chain,
    AE: ActionEvaluator,
    BC: BlockCodec,
{
    pub fn propose(&self, proposer_key: &[u8], opts: ProposeOptions) -> Result<Block, ProposeError> {
        let count = self.chain.count();
        let tip = self.chain.tip();
        let timestamp = opts.timestamp.unwrap_or_else(now_utc);

        let metadata = BlockMetadataBuilder::build(
            &self.policy,
            &self.store,
            self.chain_id,
            count,
            tip,
            Some(proposer_key.to_vec()),
            timestamp,
        )
        .map_err(|e| ProposeError::Store(Box::new(e)))?;

        log::debug!(
            "propose: built metadata index={} difficulty={}",
            metadata.index,
            metadata.difficulty
        );

        let limits = GatherConfig {
            max_block_bytes: opts.max_block_bytes.unwrap_or_else(|| self.policy.max_block_bytes(metadata.index)),
            max_transactions: opts
                .max_transactions
                .unwrap_or_else(|| self.policy.max_transactions_per_block(metadata.index)),
            max_transactions_per_signer: opts
                .max_transactions_per_signer
                .unwrap_or_else(|| self.policy.max_transactions_per_signer_per_block(metadata.index)),
            gather_budget: opts.gather_budget,
        };

        let transactions = TxGatherer::gather(
            &self.codec,
            &self.store,
            &self.stage,
            &self.policy,
            self.chain_id,
            &metadata,
            &limits,
            opts.tx_priority,
        )
        .map_err(ProposeError::Gather)?;

        let min_needed = self.policy.min_transactions_per_block(metadata.index);
        if transactions.len() < min_needed {
            log::warn!(
                "propose: insufficient transactions, have {} need {}",
                transactions.len(),
                min_needed
            );
            return Err(ProposeError::InsufficientTransactions { have: transactions.len(), need: min_needed });
        }

        log::info!("propose: gathered {} transactions for index {}", transactions.len(), metadata.index);

        let content = BlockContent { metadata, transactions };

        let cancel_state = CancelState::new();
        let tip_guard = TipWatcherGuard::subscribe(self.chain.subscribe_tip_changed(), cancel_state.clone());

        let mine_result =
            MiningDriver::mine(&self.codec, &content, &cancel_state, opts.cancel.as_ref(), opts.num_mining_workers);

        // Unsubscribe before doing anything else, on every path: success,
        // cancellation, or (below) evaluator failure.
        drop(tip_guard);

        let pre_evaluation = match mine_result {
            Ok(pre) => pre,
            Err(MineError::Cancelled(reason)) => {
                log::info!("propose: mining cancelled ({reason})");
                return Err(ProposeError::Cancelled(reason));
            }
            Err(MineError::NonceSpaceExhausted) => {
                log::error!("propose: nonce space exhausted without a solution");
                return Err(ProposeError::NonceSpaceExhausted);
            }
        };

        log::debug!("propose: found nonce {}", pre_evaluation.nonce);

        let (block, evaluations) = self
            .evaluator
            .evaluate(&pre_evaluation, proposer_key, self.chain_id)
            .map_err(|e| ProposeError::Evaluator(Box::new(e)))?;

        let executions: Vec<TxExecution> = pre_evaluation
            .content
            .transactions
            .iter()
            .zip(evaluations.iter())
            .map(|(tx, eval)| TxExecution {
                tx_id: tx.id,
                signer: tx.signer,
                nonce: tx.nonce,
                success: eval.success,
            })
            .collect();

        self.store.update_tx_executions(&executions).map_err(|e| ProposeError::Store(Box::new(e)))?;

        if opts.append {
            self.chain.append(block.clone(), evaluations).map_err(|e| ProposeError::Chain(Box::new(e)))?;
            log::info!("propose: appended block index={}", block.pre_evaluation.content.metadata.index);
        }

        Ok(block)
    }
}

fn now_utc() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
