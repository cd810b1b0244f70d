//! Identifier types shared across the sync core.
//!
//! Addresses and transaction hashes travel across the wallet and contract
//! boundaries as `0x`-prefixed hex strings; these newtypes parse and print
//! that form and serialize as strings so JSON payloads round-trip unchanged.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error produced when parsing an [`Address`] or [`TxHash`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    /// The value did not start with `0x`
    #[error("missing 0x prefix")]
    MissingPrefix,
    /// The value decoded to the wrong number of bytes
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Byte length required by the type
        expected: usize,
        /// Byte length actually decoded
        actual: usize,
    },
    /// The value contained non-hex characters or an odd digit count
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn decode_prefixed<const N: usize>(value: &str) -> Result<[u8; N], ParseIdError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(ParseIdError::MissingPrefix)?;
    let bytes = hex::decode(digits).map_err(|e| ParseIdError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseIdError::InvalidLength {
            expected: N,
            actual,
        })
}

// ============================================================================
// Address
// ============================================================================

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Length of an address in bytes.
    pub const LEN: usize = 20;

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Abbreviated form for display, e.g. `0x11ba...b1ad`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_prefixed::<20>(s.trim()).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

// ============================================================================
// Transaction hash
// ============================================================================

/// Hash identifying a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Create a hash from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_prefixed::<32>(s.trim()).map(Self)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

// ============================================================================
// Task id
// ============================================================================

/// Contract-assigned task identifier, unique within one owner's task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Numeric value of the id.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYED: &str = "0x11bAB377c1A940cC61dCa4e4D341c0AC70B6a1AD";

    #[test]
    fn test_address_parses_mixed_case() {
        let addr: Address = DEPLOYED.parse().unwrap();
        assert_eq!(addr.to_string(), DEPLOYED.to_lowercase());
        assert_eq!(addr.short(), "0x11ba...b1ad");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert_eq!(
            "11bAB377c1A940cC61dCa4e4D341c0AC70B6a1AD".parse::<Address>(),
            Err(ParseIdError::MissingPrefix)
        );
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(ParseIdError::InvalidLength {
                expected: 20,
                actual: 2
            })
        );
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(ParseIdError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr: Address = DEPLOYED.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", DEPLOYED.to_lowercase()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_tx_hash_display() {
        let hash = TxHash::from_bytes([0xab; 32]);
        let text = hash.to_string();
        assert_eq!(text.len(), 66);
        assert_eq!(text.parse::<TxHash>().unwrap(), hash);
    }

    #[test]
    fn test_task_id_is_transparent() {
        assert_eq!(serde_json::to_string(&TaskId(3)).unwrap(), "3");
        assert_eq!(TaskId(3).to_string(), "#3");
    }
}
