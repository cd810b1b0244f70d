//! Chaintask-Core: Domain Types and Effect Boundaries
//!
//! Foundation crate for the chaintask synchronization core. It holds the
//! vocabulary shared by every other crate:
//!
//! - **Identifiers**: [`Address`], [`TaskId`], [`TxHash`]
//! - **Records**: [`TaskRecord`] (remote shape) and [`Task`] (rendered shape)
//! - **Session**: [`WalletSession`] and the wallet-issued handles
//! - **Errors**: the [`TaskError`] taxonomy and its [`ErrorKind`] mirror
//! - **Configuration**: [`AppConfig`]
//! - **Effects**: traits for the wallet, contract and clock boundaries
//!
//! This crate performs no I/O of its own apart from [`SystemTimeHandler`].

#![forbid(unsafe_code)]

pub mod config;
pub mod effects;
pub mod errors;
pub mod operation;
pub mod session;
pub mod task;
pub mod types;

pub use config::{
    AppConfig, ConfirmationPolicy, ContractConfig, NotificationConfig, DEFAULT_CONTRACT_ADDRESS,
};
pub use effects::{
    ContractError, ContractErrorKind, PhysicalTimeEffects, ProviderError, RpcRequest,
    SystemTimeHandler, TaskContractEffects, TxStatus, WalletEffects,
};
pub use errors::{ErrorKind, TaskError, TaskResult};
pub use operation::{MutationKind, PendingOperation, TransactionHandle};
pub use session::{ConnectionHandle, SessionStatus, SigningHandle, WalletSession};
pub use task::{visible_tasks, Task, TaskRecord};
pub use types::{Address, ParseIdError, TaskId, TxHash};
