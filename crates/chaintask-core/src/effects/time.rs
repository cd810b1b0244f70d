//! Clock and sleep effects.
//!
//! Confirmation polling is the only place the core waits on time, so the
//! trait is deliberately small. Tests swap in a controllable clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

/// Wall-clock time and cooperative sleeping.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Milliseconds since the Unix epoch.
    async fn now_ms(&self) -> u64;

    /// Suspend the caller for `ms` milliseconds.
    async fn sleep_ms(&self, ms: u64);
}

/// Production time handler backed by the system clock and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeHandler;

impl SystemTimeHandler {
    /// Create a new system time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for SystemTimeHandler {
    async fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
