use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Instant;

use crate::codec::BlockCodec;
use crate::config::GatherConfig;
use crate::gather::size_estimator::SizeEstimator;
use crate::node::chain::ChainId;
use crate::node::stage::{StagePolicy, TxPriority};
use crate::node::store::Store;
use crate::primitives::{Address, BlockMetadata, Transaction};

use crate::consensus::policy::Policy;

#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error("store error: {0}")]
    Store(#[source] Box<dyn StdError + Send + Sync>),
    #[error("stage policy error: {0}")]
    Stage(#[source] Box<dyn StdError + Send + Sync>),
}

struct SignerState {
    stored_nonce: u64,
    next_nonce: u64,
    to_mine_count: usize,
}

pub struct TxGatherer;

impl TxGatherer {
    #[allow(clippy::too_many_arguments)]
    pub fn gather<C, S, SP, P>(
        codec: &C,
        store: &S,
        stage: &SP,
        policy: &P,
        chain_id: ChainId,
        metadata: &BlockMetadata,
        limits: &GatherConfig,
        tx_priority: Option<&dyn TxPriority>,
    ) -> Result<Vec<Transaction>, GatherError>
    where
        C: BlockCodec,
        S: Store,
        SP: StagePolicy,
        P: Policy,
    {
        let staged = stage
            .list_staged(chain_id, tx_priority)
            .map_err(|e| GatherError::Stage(Box::new(e)))?;

        let estimator = SizeEstimator::new(codec);
        let mut encoding = estimator.empty(metadata);
        let mut signers: HashMap<Address, SignerState> = HashMap::new();
        let mut out: Vec<Transaction> = Vec::new();
        let deadline = Instant::now() + limits.gather_budget;

        'gather: for tx in staged {
            if out.len() >= limits.max_transactions {
                log::trace!("gather: reached max_transactions cap, stopping");
                break 'gather;
            }

            if !signers.contains_key(&tx.signer) {
                let stored_nonce = store
                    .get_tx_nonce(chain_id, &tx.signer)
                    .map_err(|e| GatherError::Store(Box::new(e)))?;
                signers.insert(
                    tx.signer,
                    SignerState { stored_nonce, next_nonce: stored_nonce, to_mine_count: 0 },
                );
            }
            let state = signers.get_mut(&tx.signer).unwrap();

            if tx.nonce < state.stored_nonce {
                log::trace!("gather: skip stale tx {:?} (nonce {} < {})", tx.id, tx.nonce, state.stored_nonce);
                if past_deadline(deadline) {
                    break 'gather;
                }
                continue;
            }
            if tx.nonce > state.next_nonce {
                log::trace!("gather: skip gap tx {:?} (nonce {} > {})", tx.id, tx.nonce, state.next_nonce);
                if past_deadline(deadline) {
                    break 'gather;
                }
                continue;
            }
            // tx.nonce == state.next_nonce: candidate.

            if let Err(violation) = policy.validate_next_block_tx(chain_id, &tx) {
                log::warn!("gather: evicting tx {:?}: {violation}", tx.id);
                stage.ignore(chain_id, tx.id).map_err(|e| GatherError::Stage(Box::new(e)))?;
                if past_deadline(deadline) {
                    break 'gather;
                }
                continue;
            }

            let candidate = estimator.append(&encoding, &tx);
            if estimator.length(&candidate) > limits.max_block_bytes {
                log::trace!("gather: skip tx {:?}, would exceed max_block_bytes", tx.id);
                if past_deadline(deadline) {
                    break 'gather;
                }
                continue;
            }

            if state.to_mine_count >= limits.max_transactions_per_signer {
                log::trace!("gather: skip tx {:?}, signer at per-signer cap", tx.id);
                if past_deadline(deadline) {
                    break 'gather;
                }
                continue;
            }

            state.next_nonce += 1;
            state.to_mine_count += 1;
            encoding = candidate;
            out.push(tx);

            if past_deadline(deadline) {
                log::debug!("gather: budget exhausted after admitting {} transactions", out.len());
                break 'gather;
            }
        }

        Ok(out)
    }
}

fn past_deadline(deadline: Instant) -> bool {
    Instant::now() > deadline
}
