//! Trusted Production Data Types
//!
//! Ground-truth measurements submitted by the designated oracle role,
//! authoritative over self-reports.

use super::common::{AccountId, SettleKey, UniqueId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Oracle-attested measurement for one (producer, settlement key).
///
/// Under reconciled settlement `amount` is the trusted volume for the
/// month; under direct settlement it is the reward amount to mint
/// verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedRecord {
    pub unique_id: UniqueId,
    pub key: SettleKey,
    /// Trusted volume (reconciled) or mint amount (direct)
    pub amount: u128,
    /// Trusted price, when the oracle supplies one
    pub price: Option<u64>,
    /// External payout address attested for direct settlement
    pub minting_account: Option<AccountId>,
    /// Block reward figure for mined assets
    pub block_reward: Option<u64>,
    pub received_at: DateTime<Utc>,
}

impl TrustedRecord {
    pub fn new(unique_id: UniqueId, key: SettleKey, amount: u128) -> Self {
        Self {
            unique_id,
            key,
            amount,
            price: None,
            minting_account: None,
            block_reward: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_price(mut self, price: u64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_minting_account(mut self, account: AccountId) -> Self {
        self.minting_account = Some(account);
        self
    }

    pub fn with_block_reward(mut self, reward: u64) -> Self {
        self.block_reward = Some(reward);
        self
    }
}

/// Outcome of a trusted data submission.
///
/// A second write for the same key replaces the stored record; whether
/// that is a correction or an error is the caller's policy, so the
/// replacement is surfaced rather than silently absorbed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustedIngest {
    pub unique_id: UniqueId,
    pub key: SettleKey,
    /// True when a previously stored record was replaced
    pub overwrote: bool,
}
