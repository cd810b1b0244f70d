//! Controllable clock for deterministic confirmation polling.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chaintask_core::effects::PhysicalTimeEffects;

/// Start of the virtual clock (ms since epoch).
pub const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

/// Virtual clock. `sleep_ms` advances time instead of waiting and yields
/// once so other futures on the same task get polled.
#[derive(Debug)]
pub struct ControllableTime {
    now_ms: AtomicU64,
    sleeps: AtomicUsize,
}

impl ControllableTime {
    /// Clock starting at [`TEST_EPOCH_MS`].
    pub fn new() -> Self {
        Self::starting_at(TEST_EPOCH_MS)
    }

    /// Clock starting at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
            sleeps: AtomicUsize::new(0),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    /// Number of sleeps requested so far.
    pub fn sleep_count(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Default for ControllableTime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhysicalTimeEffects for ControllableTime {
    async fn now_ms(&self) -> u64 {
        self.now()
    }

    async fn sleep_ms(&self, ms: u64) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(ms);
        tokio::task::yield_now().await;
    }
}
