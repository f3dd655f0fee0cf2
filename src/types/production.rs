//! Production Ledger Types
//!
//! Self-reported production records accumulate into monthly aggregates.
//! Aggregates only grow: there is no retraction operation.

use super::common::{AccountId, DateKey, MonthKey, UniqueId};
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One self-reported production entry for a single date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Reported output volume for the date
    pub volume: u64,
    /// Production date; the settlement month derives from it
    pub date: DateKey,
    /// Account that reported the record
    pub reporter: AccountId,
}

impl ProductionRecord {
    pub fn new(volume: u64, date: DateKey, reporter: AccountId) -> Self {
        Self {
            volume,
            date,
            reporter,
        }
    }
}

/// Accumulated self-reported production for one (producer, month).
///
/// `cumulative_amount` is revenue-like: the sum of per-record
/// volume x price x discount contributions in reward-token units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub unique_id: UniqueId,
    pub month: MonthKey,
    /// Accumulated reward-scaled amount
    pub cumulative_amount: u128,
    /// Accumulated reported volume
    pub cumulative_volume: u64,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyAggregate {
    /// Zeroed aggregate for a month with no records yet
    pub fn zeroed(unique_id: UniqueId, month: MonthKey) -> Self {
        Self {
            unique_id,
            month,
            cumulative_amount: 0,
            cumulative_volume: 0,
            updated_at: Utc::now(),
        }
    }

    /// Add one record's contribution. Amounts and volumes only grow.
    pub fn accumulate(&mut self, volume: u64, amount: u128) -> EngineResult<()> {
        self.cumulative_volume = self
            .cumulative_volume
            .checked_add(volume)
            .ok_or(EngineError::AmountOverflow)?;
        self.cumulative_amount = self
            .cumulative_amount
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative_amount == 0 && self.cumulative_volume == 0
    }
}
