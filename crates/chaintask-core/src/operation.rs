//! Mutation bookkeeping types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{TaskId, TxHash};

/// The two state-changing operations the contract supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// `addTask`
    Create,
    /// `deleteTask`
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Handle to a submitted, not yet confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    /// Transaction hash
    pub hash: TxHash,
    /// Which mutation it carries
    pub kind: MutationKind,
    /// Target task for deletes
    pub target: Option<TaskId>,
    /// Submission time (ms since epoch)
    pub submitted_at_ms: u64,
}

/// A mutation that has begun submission and has not settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Which mutation
    pub kind: MutationKind,
    /// When submission began (ms since epoch)
    pub submitted_at_ms: u64,
    /// Target task; absent for creates
    pub target_id: Option<TaskId>,
    /// Hash once the wallet has accepted the transaction
    pub tx: Option<TxHash>,
}

impl PendingOperation {
    /// Pending create.
    pub fn create(submitted_at_ms: u64) -> Self {
        Self {
            kind: MutationKind::Create,
            submitted_at_ms,
            target_id: None,
            tx: None,
        }
    }

    /// Pending delete of `id`.
    pub fn delete(id: TaskId, submitted_at_ms: u64) -> Self {
        Self {
            kind: MutationKind::Delete,
            submitted_at_ms,
            target_id: Some(id),
            tx: None,
        }
    }
}
