// External collaborators that represent the node's world: the persistent
// store, the chain handle (tip/append/tip-change events), and the staging
// pool. These are consumed, never implemented, by the core.
pub mod chain;
pub mod stage;
pub mod store;

pub use chain::{Chain, ChainId, TipChanged, TipInfo, TipWatch};
pub use stage::{StagePolicy, TxPriority};
pub use store::Store;
