//! Block proposal core for a proof-of-work chain: transaction gathering
//! and admission, block-metadata assembly, cancellable proof-of-work
//! mining, and hand-off to an external action evaluator with optional
//! atomic append.
//!
//! The core never implements the block/transaction byte format, the
//! persistent store, the staging pool, the consensus policy, or the
//! action evaluator — those are collaborator traits in [`codec`],
//! [`node`], and [`consensus`], supplied by the embedder.

pub mod codec;
pub mod config;
pub mod consensus;
pub mod error;
pub mod gather;
pub mod miner;
pub mod node;
pub mod primitives;
pub mod proposer;

#[cfg(feature = "testutil")]
pub mod testutil;

pub use codec::BlockCodec;
pub use config::{GatherConfig, ProposeOptions, DEFAULT_GATHER_BUDGET};
pub use error::ProposeError;
pub use miner::{CancelReason, CancelState, CancelToken, MineError, MiningDriver};
pub use primitives::{Block, BlockContent, BlockMetadata, Hash, PreEvaluationBlock, Transaction, TxId};
pub use proposer::Proposer;
