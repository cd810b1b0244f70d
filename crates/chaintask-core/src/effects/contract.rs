//! Task contract boundary
//!
//! The deployed contract exposes a fixed surface: `addTask(body, title, flag)`,
//! `getMyTask()` and `deleteTask(id)`. Implementations hide ABI encoding and
//! transport; callers pass the configured contract address on every call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::SigningHandle;
use crate::task::TaskRecord;
use crate::types::{Address, TaskId, TxHash};

/// Classification of contract-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractErrorKind {
    /// Execution reverted
    Revert,
    /// Account cannot pay for gas
    InsufficientFunds,
    /// The user declined the signature prompt
    UserRejected,
    /// No contract deployed at the given address
    NoContract,
    /// Transport or node failure
    Rpc,
}

/// Error returned by the contract boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("contract call failed ({kind:?}): {reason}")]
pub struct ContractError {
    /// Failure class
    pub kind: ContractErrorKind,
    /// Reason reported by the node or wallet
    pub reason: String,
}

impl ContractError {
    /// Create a contract error.
    pub fn new(kind: ContractErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// On-chain status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Not yet included
    Pending,
    /// Included and final
    Confirmed,
    /// Included but execution failed
    Reverted {
        /// Revert reason
        reason: String,
    },
}

/// Remote task contract.
#[async_trait]
pub trait TaskContractEffects: Send + Sync {
    /// Submit `addTask(body, title, flag)` signed by `signer`.
    async fn add_task(
        &self,
        contract: &Address,
        signer: &SigningHandle,
        body: &str,
        title: &str,
        flag: bool,
    ) -> Result<TxHash, ContractError>;

    /// Call `getMyTask()` as `caller`. Returns every record, deleted ones included.
    async fn get_my_task(
        &self,
        contract: &Address,
        caller: &Address,
    ) -> Result<Vec<TaskRecord>, ContractError>;

    /// Submit `deleteTask(id)` signed by `signer`.
    async fn delete_task(
        &self,
        contract: &Address,
        signer: &SigningHandle,
        id: TaskId,
    ) -> Result<TxHash, ContractError>;

    /// Look up the status of a submitted transaction.
    async fn transaction_status(
        &self,
        contract: &Address,
        tx: &TxHash,
    ) -> Result<TxStatus, ContractError>;
}
