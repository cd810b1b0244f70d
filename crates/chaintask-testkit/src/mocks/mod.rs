//! In-memory handlers for the wallet and contract effect traits.

pub mod contract;
pub mod wallet;

pub use contract::{Gate, InMemoryTaskContract};
pub use wallet::MockWallet;
