// Cancellable, multi-worker proof-of-work search. Each worker owns a
// disjoint slice of the nonce space; the first hash that meets target
// wins and every sibling is stopped via a shared atomic flag.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::codec::BlockCodec;
use crate::node::chain::{TipChanged, TipWatch};
use crate::primitives::{BlockContent, Hash, PreEvaluationBlock};

/// How many nonce attempts a worker makes between cancellation checks.
/// Keeps cancellation latency bounded without paying an atomic load per
/// hash attempt.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    TipChanged,
    Caller,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::TipChanged => write!(f, "tip changed"),
            CancelReason::Caller => write!(f, "caller cancelled"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MineError {
    #[error("mining cancelled: {0}")]
    Cancelled(CancelReason),
    /// The entire nonce space was exhausted with no hash meeting target
    /// and no cancellation observed. Not part of the documented error
    /// taxonomy; added as a defensive backstop for an adversarial or
    /// misconfigured difficulty that no worker could ever satisfy.
    #[error("nonce space exhausted without a solution")]
    NonceSpaceExhausted,
}

/// A caller-supplied, level-triggered cancel signal. Cloning shares the
/// underlying flag; any clone can trip it.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The internally-owned half of the composed cancellation source: tripped
/// by the tip-watcher poller, never by the caller.
#[derive(Clone, Default)]
pub struct CancelState(Arc<AtomicBool>);

impl CancelState {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    fn trip(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_tip_tripped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Subscribes to a chain's tip-change events for the lifetime of this
/// guard and polls them on a background thread, tripping `cancel_state`
/// the moment a `TipChanged` is observed. Dropping the guard stops the
/// poller and drops the `TipWatch` handle (unsubscribing), on every exit
/// path — including cancellation or a panic unwinding through it.
pub struct TipWatcherGuard {
    done: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl TipWatcherGuard {
    pub fn subscribe(mut watch: Box<dyn TipWatch>, cancel_state: CancelState) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let done_for_thread = done.clone();
        let handle = std::thread::spawn(move || {
            while !done_for_thread.load(Ordering::Relaxed) {
                match watch.poll() {
                    Some(TipChanged { .. }) => {
                        cancel_state.trip();
                        break;
                    }
                    None => std::thread::sleep(std::time::Duration::from_millis(5)),
                }
            }
            // `watch` drops here, unsubscribing, on every exit from the loop.
        });
        Self { done, handle: Some(handle) }
    }
}

impl Drop for TipWatcherGuard {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub struct MiningDriver;

impl MiningDriver {
    /// Searches `content`'s nonce space across `num_workers` scoped
    /// threads. Returns the first nonce/hash pair any worker finds that
    /// meets `content.metadata.difficulty`, or a `Cancelled` error
    /// carrying whichever source tripped first (TipChanged takes
    /// precedence when both are observable at the same check).
    pub fn mine<C: BlockCodec>(
        codec: &C,
        content: &BlockContent,
        cancel_state: &CancelState,
        caller_cancel: Option<&CancelToken>,
        num_workers: usize,
    ) -> Result<PreEvaluationBlock, MineError> {
        let num_workers = num_workers.max(1);
        let found: Mutex<Option<(u64, Hash)>> = Mutex::new(None);
        let stop = AtomicBool::new(false);
        let worker_width = u64::MAX / num_workers as u64;

        std::thread::scope(|scope| {
            for worker in 0..num_workers {
                let start = worker as u64 * worker_width;
                let end = if worker + 1 == num_workers { u64::MAX } else { start + worker_width };
                let found = &found;
                let stop = &stop;
                scope.spawn(move || {
                    let mut nonce = start;
                    let mut since_check: u64 = 0;
                    loop {
                        if nonce >= end {
                            return;
                        }
                        if stop.load(Ordering::Relaxed) {
                            return;
                        }
                        since_check += 1;
                        if since_check >= CANCEL_CHECK_INTERVAL {
                            since_check = 0;
                            if cancel_state.is_tip_tripped()
                                || caller_cancel.is_some_and(CancelToken::is_cancelled)
                            {
                                stop.store(true, Ordering::Relaxed);
                                return;
                            }
                        }

                        let hash = codec.pre_evaluation_hash(
                            &content.metadata,
                            &content.transactions,
                            nonce,
                        );
                        if codec.meets_target(&hash, content.metadata.difficulty) {
                            let mut slot = found.lock().unwrap();
                            if slot.is_none() {
                                *slot = Some((nonce, hash));
                            }
                            stop.store(true, Ordering::Relaxed);
                            return;
                        }

                        match nonce.checked_add(1) {
                            Some(next) => nonce = next,
                            None => return,
                        }
                    }
                });
            }
        });

        if let Some((nonce, hash)) = found.into_inner().unwrap() {
            return Ok(PreEvaluationBlock {
                content: content.clone(),
                nonce,
                pre_evaluation_hash: hash,
            });
        }

        // Tip precedence over caller: checked last, so a simultaneous trip
        // of both always resolves to the more informative cause.
        if cancel_state.is_tip_tripped() {
            return Err(MineError::Cancelled(CancelReason::TipChanged));
        }
        if caller_cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(MineError::Cancelled(CancelReason::Caller));
        }
        Err(MineError::NonceSpaceExhausted)
    }
}

#[cfg(all(test, feature = "testutil"))]
mod tests {
    use super::*;
    use crate::testutil::TestCodec;
    use crate::primitives::BlockMetadata;

    fn trivial_content(difficulty: u64) -> BlockContent {
        BlockContent {
            metadata: BlockMetadata {
                index: 0,
                difficulty,
                total_difficulty: difficulty,
                public_key: None,
                previous_hash: None,
                timestamp: 1,
            },
            transactions: vec![],
        }
    }

    #[test]
    fn mines_trivial_difficulty_quickly() {
        let codec = TestCodec::new();
        let content = trivial_content(0);
        let cancel_state = CancelState::new();
        let result = MiningDriver::mine(&codec, &content, &cancel_state, None, 2);
        let pre = result.expect("trivial difficulty must be satisfiable");
        assert!(codec.meets_target(&pre.pre_evaluation_hash, content.metadata.difficulty));
    }

    #[test]
    fn caller_cancel_is_observed() {
        let codec = TestCodec::new();
        // Difficulty so high a real hash essentially never meets it —
        // forces the loop to keep running until it observes the cancel.
        let content = trivial_content(u64::MAX);
        let cancel_state = CancelState::new();
        let caller_cancel = CancelToken::new();
        caller_cancel.cancel();
        let result = MiningDriver::mine(&codec, &content, &cancel_state, Some(&caller_cancel), 2);
        assert!(matches!(result, Err(MineError::Cancelled(CancelReason::Caller))));
    }

    #[test]
    fn tip_cancel_takes_precedence_over_caller() {
        let codec = TestCodec::new();
        let content = trivial_content(u64::MAX);
        let cancel_state = CancelState::new();
        cancel_state.trip();
        let caller_cancel = CancelToken::new();
        caller_cancel.cancel();
        let result = MiningDriver::mine(&codec, &content, &cancel_state, Some(&caller_cancel), 2);
        assert!(matches!(result, Err(MineError::Cancelled(CancelReason::TipChanged))));
    }
}
