//! Application configuration
//!
//! Loaded from TOML by the host or built in code. Every section has
//! defaults, so an empty document yields the default deployment.

use serde::{Deserialize, Serialize};

use crate::errors::{TaskError, TaskResult};
use crate::types::Address;

/// Address of the default task contract deployment.
pub const DEFAULT_CONTRACT_ADDRESS: Address = Address::from_bytes([
    0x11, 0xba, 0xb3, 0x77, 0xc1, 0xa9, 0x40, 0xcc, 0x61, 0xdc, 0xa4, 0xe4, 0xd3, 0x41, 0xc0, 0xac,
    0x70, 0xb6, 0xa1, 0xad,
]);

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Contract deployment
    pub contract: ContractConfig,
    /// Confirmation wait policy
    pub confirmation: ConfirmationPolicy,
    /// Presentation channel settings
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> TaskResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| TaskError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the core cannot operate with.
    pub fn validate(&self) -> TaskResult<()> {
        if self.confirmation.max_polls == 0 {
            return Err(TaskError::config(
                "confirmation.max_polls must be greater than 0",
            ));
        }
        if self.notifications.capacity == 0 {
            return Err(TaskError::config(
                "notifications.capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Where the task contract lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Contract address
    pub address: Address,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTRACT_ADDRESS,
        }
    }
}

/// Bound on how long a submitted transaction is awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationPolicy {
    /// Status polls before reporting a timeout
    pub max_polls: u32,
    /// Delay between polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            max_polls: 60,
            poll_interval_ms: 1_000,
        }
    }
}

/// Notification channel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Broadcast buffer size; slow subscribers lag past this
    pub capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}
