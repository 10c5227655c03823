pub mod driver;

pub use driver::{CancelReason, CancelState, CancelToken, MineError, MiningDriver, TipWatcherGuard};
