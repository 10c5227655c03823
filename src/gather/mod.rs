pub mod size_estimator;
pub mod tx_gatherer;

pub use size_estimator::SizeEstimator;
pub use tx_gatherer::{GatherError, TxGatherer};
