//! Producer Reference Data
//!
//! Producers are owned by the external registry; the engine treats them
//! as read-only reference data keyed by [`UniqueId`].

use super::common::AccountId;
use serde::{Deserialize, Serialize};

/// Producer lifecycle status, managed by the external registry.
///
/// Only `Active` producers may report production or be cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerStatus {
    Registered,
    Active,
    Suspended,
}

impl ProducerStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ProducerStatus::Active)
    }
}

/// One production unit as known to the external registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    /// Human-readable name
    pub nickname: String,
    /// Owning account (escrow owner, default payout target)
    pub owner: AccountId,
    /// API gravity score, decimal-scaled x100 (3110 = 31.10). Oil only.
    pub api_score: u64,
    /// Sulphur content, decimal-scaled x100 (500 = 5.00). Oil only.
    pub sulphur_score: u64,
    /// External settlement account for reward payout; may use another
    /// chain's address format for Eth/Btc miners. Empty means the owner
    /// account receives the reward.
    pub settlement_account: Option<AccountId>,
    /// Lifecycle status
    pub status: ProducerStatus,
}

impl Producer {
    /// Account that receives minted rewards
    pub fn payout_account(&self) -> &AccountId {
        self.settlement_account.as_ref().unwrap_or(&self.owner)
    }
}
