//! Basic Identifier Types
//!
//! Naming conventions:
//! - `_id` suffix: primary key identifiers
//! - `Key` suffix: table lookup keys

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

// ============================================================
// Asset Kind
// ============================================================

/// Commodity class handled by one engine instance.
///
/// Each kind runs an independent engine; the kind selects the
/// settlement mode and the discount/penalty policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Oil,
    Gas,
    Eth,
    Btc,
}

impl AssetKind {
    /// Wire/event name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Oil => "OIL",
            AssetKind::Gas => "GAS",
            AssetKind::Eth => "ETH",
            AssetKind::Btc => "BTC",
        }
    }

    /// Oil and Gas reconcile self-reports against trusted volumes;
    /// Eth and Btc settle trusted amounts directly.
    pub fn is_reconciled(&self) -> bool {
        matches!(self, AssetKind::Oil | AssetKind::Gas)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================
// Producer Unique ID (32 bytes, opaque)
// ============================================================

/// Opaque identifier for a single production unit (well, mining rig).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId(pub [u8; 32]);

impl UniqueId {
    /// Create from hex string (64 hex chars, optional 0x prefix)
    pub fn from_hex(s: &str) -> EngineResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| EngineError::InvalidState {
            reason: format!("Invalid unique id hex: {}", s),
        })?;
        if bytes.len() != 32 {
            return Err(EngineError::InvalidState {
                reason: format!("Unique id must be 32 bytes, got {}", bytes.len()),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UniqueId({}...)", &self.to_hex()[..16])
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ============================================================
// Account ID
// ============================================================

/// Account reference used for escrow ownership and reward payout.
///
/// Payout accounts may belong to another chain (Eth/Btc miners), so this
/// stays an opaque string rather than a native address type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================
// Date / Month Keys
// ============================================================

/// Calendar date key, "YYMMDD" digits (e.g. "240102").
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateKey(String);

impl DateKey {
    /// Parse and validate a date key
    pub fn parse(s: impl Into<String>) -> EngineResult<Self> {
        let s = s.into();
        let invalid = || EngineError::InvalidDate { date: s.clone() };

        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month: u32 = s[2..4].parse().map_err(|_| invalid())?;
        let day: u32 = s[4..6].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }
        Ok(Self(s))
    }

    /// Derived month key: the first four characters
    pub fn month(&self) -> MonthKey {
        MonthKey(self.0[..4].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar month key, "YYMM" digits (e.g. "2401").
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthKey(String);

impl MonthKey {
    /// Parse and validate a month key
    pub fn parse(s: impl Into<String>) -> EngineResult<Self> {
        let s = s.into();
        let invalid = || EngineError::InvalidMonth { month: s.clone() };

        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month: u32 = s[2..4].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================
// Settlement Key
// ============================================================

/// Settlement period key.
///
/// Reconciled settlement (Oil/Gas) closes per calendar month; direct
/// settlement (Eth/Btc) closes per mined block height.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleKey {
    Month(MonthKey),
    Block(u64),
}

impl SettleKey {
    /// Month key, if this is a monthly settlement
    pub fn as_month(&self) -> Option<&MonthKey> {
        match self {
            SettleKey::Month(m) => Some(m),
            SettleKey::Block(_) => None,
        }
    }

    /// Stable byte encoding for storage composite keys
    pub fn encode(&self) -> Vec<u8> {
        match self {
            SettleKey::Month(m) => {
                let mut out = vec![b'm'];
                out.extend_from_slice(m.as_str().as_bytes());
                out
            }
            SettleKey::Block(height) => {
                let mut out = vec![b'b'];
                out.extend_from_slice(&height.to_be_bytes());
                out
            }
        }
    }
}

impl std::fmt::Display for SettleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettleKey::Month(m) => write!(f, "{}", m),
            SettleKey::Block(height) => write!(f, "block:{}", height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_hex_roundtrip() {
        let hex = "4872484e4579694e575a65745956524879303873690000000000000000000001";
        let id = UniqueId::from_hex(hex).unwrap();
        assert_eq!(id.to_hex(), hex);

        let prefixed = UniqueId::from_hex(&format!("0x{}", hex)).unwrap();
        assert_eq!(id, prefixed);
    }

    #[test]
    fn test_unique_id_wrong_length() {
        assert!(UniqueId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_date_key_parse() {
        let date = DateKey::parse("240102").unwrap();
        assert_eq!(date.as_str(), "240102");
        assert_eq!(date.month().as_str(), "2401");
    }

    #[test]
    fn test_date_key_rejects_garbage() {
        assert!(DateKey::parse("24010").is_err());
        assert!(DateKey::parse("2401023").is_err());
        assert!(DateKey::parse("24a102").is_err());
        assert!(DateKey::parse("241302").is_err()); // month 13
        assert!(DateKey::parse("240100").is_err()); // day 0
        assert!(DateKey::parse("240132").is_err()); // day 32
    }

    #[test]
    fn test_month_key_parse() {
        assert!(MonthKey::parse("2401").is_ok());
        assert!(MonthKey::parse("2413").is_err());
        assert!(MonthKey::parse("240").is_err());
    }

    #[test]
    fn test_settle_key_encoding_distinct() {
        let month = SettleKey::Month(MonthKey::parse("2401").unwrap());
        let block = SettleKey::Block(180);
        assert_ne!(month.encode(), block.encode());
        assert_eq!(month.to_string(), "2401");
        assert_eq!(block.to_string(), "block:180");
    }

    #[test]
    fn test_asset_kind_mode() {
        assert!(AssetKind::Oil.is_reconciled());
        assert!(AssetKind::Gas.is_reconciled());
        assert!(!AssetKind::Eth.is_reconciled());
        assert!(!AssetKind::Btc.is_reconciled());
    }
}
