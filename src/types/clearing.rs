//! Clearing Result Types
//!
//! Settlement results are ephemeral: they are returned to the caller and
//! surfaced through events, with a digest receipt as the durable
//! reference to what was settled.

use super::common::{AccountId, AssetKind, SettleKey, UniqueId};
use serde::{Deserialize, Serialize};

/// Digest receipt over a settled clearing result (32 bytes, blake3).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClearingReceipt(pub [u8; 32]);

impl ClearingReceipt {
    /// BLAKE3 over the canonical JSON of the outcome fields
    pub fn compute(
        kind: AssetKind,
        unique_id: &UniqueId,
        key: &SettleKey,
        corrected_volume: u64,
        corrected_amount: u128,
        deviation: i64,
        penalty: u128,
        minted: u128,
    ) -> Self {
        let canonical = serde_json::json!({
            "kind": kind.as_str(),
            "unique_id": unique_id.to_hex(),
            "key": key.to_string(),
            "corrected_volume": corrected_volume,
            "corrected_amount": corrected_amount.to_string(),
            "deviation": deviation,
            "penalty": penalty.to_string(),
            "minted": minted.to_string(),
        });
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        Self(*blake3::hash(&bytes).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for ClearingReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClearingReceipt({}...)", &self.to_hex()[..16])
    }
}

impl std::fmt::Display for ClearingReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Result of one settled clearing call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingOutcome {
    pub kind: AssetKind,
    pub unique_id: UniqueId,
    pub key: SettleKey,
    /// Verified volume after the over-reporting cap. Zero under direct
    /// settlement, which carries no volume comparison.
    pub corrected_volume: u64,
    /// Reward amount after proportional correction
    pub corrected_amount: u128,
    /// Signed deviation of reported over trusted volume, in hundredths
    /// of a percent (2000 = 20.00%). Zero under direct settlement.
    pub deviation: i64,
    /// Escrow penalty actually debited
    pub penalty: u128,
    /// Reward tokens minted to the payout account
    pub minted: u128,
    /// Account the reward was minted to
    pub payout_account: AccountId,
    /// Digest receipt over the settled fields
    pub receipt: ClearingReceipt,
}
