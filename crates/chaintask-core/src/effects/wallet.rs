//! Wallet provider boundary
//!
//! Models the injected browser wallet as an EIP-1193 style request channel.
//! The sync core only ever issues the two account requests below; signing
//! happens inside the wallet when the contract boundary submits a call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Silent account probe; never prompts.
pub const ETH_ACCOUNTS: &str = "eth_accounts";

/// Account request; prompts when no prior grant exists.
pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";

/// A JSON-RPC request sent to the wallet provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Method name
    pub method: String,
    /// Positional parameters
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    /// Create a request without parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Value::Array(Vec::new()),
        }
    }

    /// Request for [`ETH_ACCOUNTS`].
    pub fn accounts() -> Self {
        Self::new(ETH_ACCOUNTS)
    }

    /// Request for [`ETH_REQUEST_ACCOUNTS`].
    pub fn request_accounts() -> Self {
        Self::new(ETH_REQUEST_ACCOUNTS)
    }
}

/// Provider-level error with an EIP-1193 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    /// Numeric error code
    pub code: i64,
    /// Provider message
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method has not been authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    /// A permission request is already open in the wallet.
    pub const REQUEST_PENDING: i64 = -32002;

    /// Create a provider error.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error returned when the user declines a prompt.
    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    /// Whether this error means the user declined.
    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    /// Whether the site lacks the wallet's authorization for the request.
    pub fn is_unauthorized(&self) -> bool {
        self.code == Self::UNAUTHORIZED
    }
}

/// Injected wallet provider.
#[async_trait]
pub trait WalletEffects: Send + Sync {
    /// Whether a wallet extension is present in the host environment.
    fn is_installed(&self) -> bool;

    /// Send a request and return the raw JSON result.
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError>;
}
