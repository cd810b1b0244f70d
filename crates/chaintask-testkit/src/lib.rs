//! Chaintask Testing Infrastructure
//!
//! Deterministic handlers for every effect trait, named fixture accounts,
//! a wired [`TestHarness`] and proptest strategies.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! chaintask-testkit = { workspace = true }
//! ```
//!
//! ```rust,no_run
//! use chaintask_testkit::*;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let h = TestHarness::new().connected().await;
//!     h.ctx.create_task("Title", "Body").await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod mocks;
pub mod strategies;
pub mod time;

pub use fixtures::*;
pub use mocks::*;
pub use time::*;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_test_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
