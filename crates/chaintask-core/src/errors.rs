//! Error taxonomy for the sync core
//!
//! Every user-visible failure is one [`TaskError`] variant. Boundary errors
//! ([`ProviderError`], [`ContractError`]) are folded into it at the
//! component that talks to the boundary, keeping the original reason as the
//! `cause`. Nothing here is fatal to the process: a failure ends one
//! operation and leaves the session and cache as they were.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effects::contract::{ContractError, ContractErrorKind};
use crate::effects::wallet::ProviderError;
use crate::types::{Address, TaskId};

/// Unified error type for sync-core operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TaskError {
    /// No wallet provider is injected in the host environment
    #[error("No wallet detected; install a wallet extension to continue")]
    NoWallet,

    /// The user declined a wallet prompt
    #[error("Request rejected in wallet")]
    UserRejected,

    /// A mutation or read needs a connected session
    #[error("Wallet is not connected")]
    NotConnected,

    /// Local input validation failed before any remote call
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending input
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Delete target is not in the local cache
    #[error("Task {id} is not in the current task list")]
    InvalidTarget {
        /// The rejected id
        id: TaskId,
    },

    /// Another mutation for this account has not settled yet
    #[error("Another operation is still pending for {account}")]
    OperationInProgress {
        /// Account with the in-flight mutation
        account: Address,
    },

    /// Wallet or contract rejected the call
    #[error("Remote call failed: {cause}")]
    RemoteCall {
        /// Underlying reason, kept for display
        cause: String,
    },

    /// Confirmation was not observed within the polling bound
    #[error("Transaction not confirmed after {polls} polls")]
    Timeout {
        /// Number of polls performed
        polls: u32,
    },

    /// A read finished after the session it was issued for was replaced
    #[error("Session changed while the request was in flight")]
    SessionChanged,

    /// Configuration rejected at startup
    #[error("Invalid configuration: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },
}

impl TaskError {
    /// Create a validation error for a named input.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a remote-call error.
    pub fn remote(cause: impl Into<String>) -> Self {
        Self::RemoteCall {
            cause: cause.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The fieldless kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoWallet => ErrorKind::NoWallet,
            Self::UserRejected => ErrorKind::UserRejected,
            Self::NotConnected => ErrorKind::NotConnected,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            Self::OperationInProgress { .. } => ErrorKind::OperationInProgress,
            Self::RemoteCall { .. } => ErrorKind::RemoteCall,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::SessionChanged => ErrorKind::SessionChanged,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Whether the error was raised before any network or signing cost.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::Validation { .. }
                | Self::InvalidTarget { .. }
                | Self::OperationInProgress { .. }
                | Self::Config { .. }
        )
    }
}

impl From<ProviderError> for TaskError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected
        } else if err.is_unauthorized() {
            Self::NotConnected
        } else {
            Self::remote(err.to_string())
        }
    }
}

impl From<ContractError> for TaskError {
    fn from(err: ContractError) -> Self {
        match err.kind {
            ContractErrorKind::UserRejected => Self::UserRejected,
            _ => Self::remote(err.to_string()),
        }
    }
}

/// Standard result type for sync-core operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;

// ============================================================================
// Error kinds
// ============================================================================

/// Fieldless mirror of [`TaskError`] for mechanical matching by presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`TaskError::NoWallet`]
    NoWallet,
    /// See [`TaskError::UserRejected`]
    UserRejected,
    /// See [`TaskError::NotConnected`]
    NotConnected,
    /// See [`TaskError::Validation`]
    Validation,
    /// See [`TaskError::InvalidTarget`]
    InvalidTarget,
    /// See [`TaskError::OperationInProgress`]
    OperationInProgress,
    /// See [`TaskError::RemoteCall`]
    RemoteCall,
    /// See [`TaskError::Timeout`]
    Timeout,
    /// See [`TaskError::SessionChanged`]
    SessionChanged,
    /// See [`TaskError::Config`]
    Config,
}

impl ErrorKind {
    /// Check if the user can fix this by changing input or acting in the wallet.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::NoWallet
                | Self::UserRejected
                | Self::NotConnected
                | Self::Validation
                | Self::InvalidTarget
        )
    }

    /// Short label for this kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoWallet => "No Wallet",
            Self::UserRejected => "Rejected",
            Self::NotConnected => "Not Connected",
            Self::Validation => "Input",
            Self::InvalidTarget => "Unknown Task",
            Self::OperationInProgress => "Busy",
            Self::RemoteCall => "Remote",
            Self::Timeout => "Timeout",
            Self::SessionChanged => "Session",
            Self::Config => "Config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
