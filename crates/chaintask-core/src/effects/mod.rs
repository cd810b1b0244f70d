//! Effect traits for the external boundaries of the sync core.
//!
//! - [`WalletEffects`]: the injected wallet provider
//! - [`TaskContractEffects`]: the deployed task contract
//! - [`PhysicalTimeEffects`]: clock and sleep for confirmation polling
//!
//! Application components hold these as `Arc<dyn _>`; production wiring and
//! the in-memory handlers in `chaintask-testkit` both plug in here.

pub mod contract;
pub mod time;
pub mod wallet;

pub use contract::{ContractError, ContractErrorKind, TaskContractEffects, TxStatus};
pub use time::{PhysicalTimeEffects, SystemTimeHandler};
pub use wallet::{
    ProviderError, RpcRequest, WalletEffects, ETH_ACCOUNTS, ETH_REQUEST_ACCOUNTS,
};
