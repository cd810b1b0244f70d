//! Chaintask-App: Wallet and Contract Synchronization Core
//!
//! Keeps a local view of the connected account's tasks consistent with the
//! task contract while the user connects, switches accounts and submits
//! mutations.
//!
//! # Components
//!
//! - [`ProviderGateway`]: typed access to the injected wallet
//! - [`SessionManager`]: the `Disconnected`/`Connecting`/`Connected` state machine
//! - [`ContractClient`]: contract calls and confirmation polling
//! - [`TaskStore`]: read-through cache, replaced wholesale on refresh
//! - [`OperationController`]: one mutation at a time per account
//! - [`Notifier`]: outcome channel for presentation
//! - [`AppContext`]: wires the above and is the presentation surface
//!
//! The crate never spawns tasks; every operation runs on the caller's
//! executor and suspends only at wallet, contract and clock calls.

#![forbid(unsafe_code)]

pub mod context;
pub mod contract;
pub mod controller;
pub mod gateway;
pub mod notifications;
pub mod session;
pub mod store;

pub use context::{AppContext, AppContextBuilder};
pub use contract::{ensure_deletable, ContractClient, NewTask};
pub use controller::OperationController;
pub use gateway::ProviderGateway;
pub use notifications::{Notification, Notifier, OperationKind, Outcome};
pub use session::{SessionListener, SessionManager};
pub use store::TaskStore;
