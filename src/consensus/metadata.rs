// BlockMetadataBuilder (component A): index/difficulty/total-difficulty/
// previous-hash assembly from the chain tip. Pure given its inputs — no
// side effects beyond the store read for `previous_hash`.
use crate::consensus::policy::Policy;
use crate::node::chain::{ChainId, TipInfo};
use crate::node::store::Store;
use crate::primitives::BlockMetadata;

pub struct BlockMetadataBuilder;

impl BlockMetadataBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn build<P, S>(
        policy: &P,
        store: &S,
        chain_id: ChainId,
        count: u64,
        tip: Option<TipInfo>,
        proposer_public_key: Option<Vec<u8>>,
        timestamp: u64,
    ) -> Result<BlockMetadata, S::Error>
    where
        P: Policy,
        S: Store,
    {
        let index = count;
        let difficulty = policy.next_block_difficulty(chain_id, count, tip.map(|t| t.hash));

        let previous_hash = if count > 0 {
            store.index_block_hash(chain_id, count - 1)?
        } else {
            None
        };

        let total_difficulty = tip.map(|t| t.total_difficulty).unwrap_or(0) + difficulty;

        Ok(BlockMetadata {
            index,
            difficulty,
            total_difficulty,
            public_key: proposer_public_key,
            previous_hash,
            timestamp,
        })
    }
}

#[cfg(all(test, feature = "testutil"))]
mod tests {
    use super::*;
    use crate::testutil::{MemStore, TestPolicy};

    #[test]
    fn genesis_has_no_previous_hash() {
        let policy = TestPolicy::default();
        let store = MemStore::new();
        let meta = BlockMetadataBuilder::build(&policy, &store, 1, 0, None, None, 1_700_000_000).unwrap();
        assert_eq!(meta.index, 0);
        assert_eq!(meta.previous_hash, None);
        assert_eq!(meta.total_difficulty, meta.difficulty);
    }

    #[test]
    fn total_difficulty_accumulates_over_tip() {
        let policy = TestPolicy::default();
        let store = MemStore::new();
        store.set_block_hash(1, 4, [9u8; 32]);
        let tip = TipInfo { hash: [9u8; 32], total_difficulty: 40 };
        let meta = BlockMetadataBuilder::build(&policy, &store, 1, 5, Some(tip), None, 1_700_000_001).unwrap();
        assert_eq!(meta.index, 5);
        assert_eq!(meta.previous_hash, Some([9u8; 32]));
        assert_eq!(meta.total_difficulty, 40 + meta.difficulty);
    }
}
