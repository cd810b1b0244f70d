//! Wallet session state and wallet-issued capabilities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Coarse connection status, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No account available
    Disconnected,
    /// A connect request is in flight
    Connecting,
    /// An account is selected and usable
    Connected,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// The wallet session.
///
/// An account exists only in the `Connected` state, so the session can never
/// report an account while disconnected or vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletSession {
    /// No account available
    #[default]
    Disconnected,
    /// A connect request is in flight
    Connecting,
    /// Connected with the selected account
    Connected {
        /// The active account
        account: Address,
    },
}

impl WalletSession {
    /// Current status.
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Disconnected => SessionStatus::Disconnected,
            Self::Connecting => SessionStatus::Connecting,
            Self::Connected { .. } => SessionStatus::Connected,
        }
    }

    /// The active account, present iff connected.
    pub fn account(&self) -> Option<Address> {
        match self {
            Self::Connected { account } => Some(*account),
            _ => None,
        }
    }

    /// Check if the session is connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Label for display (abbreviated account or status).
    pub fn display_name(&self) -> String {
        match self {
            Self::Connected { account } => account.short(),
            Self::Connecting => "connecting...".to_string(),
            Self::Disconnected => "not connected".to_string(),
        }
    }
}

/// Read-only access to the wallet for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    account: Address,
}

impl ConnectionHandle {
    /// Wrap an account the wallet has exposed.
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    /// The exposed account.
    pub fn account(&self) -> Address {
        self.account
    }
}

/// Capability to authorize state-changing calls for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigningHandle {
    account: Address,
}

impl SigningHandle {
    /// Wrap an account the wallet will sign for.
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    /// The signing account.
    pub fn account(&self) -> Address {
        self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        let session = WalletSession::default();
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert_eq!(session.account(), None);
        assert_eq!(session.display_name(), "not connected");
    }

    #[test]
    fn test_connected_exposes_account() {
        let account = Address::from_bytes([0x12; 20]);
        let session = WalletSession::Connected { account };
        assert!(session.is_connected());
        assert_eq!(session.account(), Some(account));
        assert_eq!(session.display_name(), "0x1212...1212");
    }

    #[test]
    fn test_connecting_has_no_account() {
        let session = WalletSession::Connecting;
        assert_eq!(session.status(), SessionStatus::Connecting);
        assert_eq!(session.account(), None);
    }
}
