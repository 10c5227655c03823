pub mod block;
pub mod transaction;

pub use block::{Block, BlockContent, BlockMetadata, Hash, PreEvaluationBlock};
pub use transaction::{Address, Transaction, TxId};
