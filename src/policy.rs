//! Settlement Policy
//!
//! Everything that distinguishes one asset class from another lives
//! here: how reported value is discounted by quality, how deviation is
//! penalized, and whether settlement reconciles against trusted volume
//! or mints the trusted amount directly. The engine itself is generic
//! over the policy.

use crate::types::AssetKind;
use serde::{Deserialize, Serialize};

/// Basis of discount and deviation percentages (1.00% = 100).
pub const DISCOUNT_BASE: u64 = 10_000;

/// How a settlement key is resolved for an asset class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementMode {
    /// Self-reported monthly aggregates reconciled against trusted
    /// volume, with deviation caps and penalties
    Reconciled,
    /// Trusted amount minted verbatim per block, no self-reporting
    Direct,
}

/// Quality discount applied to each production record's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountSchedule {
    /// Flat factor over [`DISCOUNT_BASE`]
    Fixed(u64),
    /// Crude quality brackets over API gravity and sulphur content
    OilBrackets,
}

impl DiscountSchedule {
    /// Discount factor for a producer's quality scores, over
    /// [`DISCOUNT_BASE`].
    pub fn factor(&self, api_score: u64, sulphur_score: u64) -> u64 {
        match self {
            DiscountSchedule::Fixed(factor) => *factor,
            DiscountSchedule::OilBrackets => {
                // Light (API > 31.10) and sweet (sulphur < 0.5%) crude
                // clears closest to the benchmark price.
                match (api_score > 3110, sulphur_score < 500) {
                    (true, true) => 9_000,
                    (true, false) => 8_500,
                    (false, true) => 8_000,
                    (false, false) => 7_500,
                }
            }
        }
    }
}

/// Tiered penalty on over-reporting, charged against escrow margin.
///
/// Deviation is measured in hundredths of a percent of trusted volume.
/// Below `free_limit` nothing is charged; between the limits the
/// penalty scales linearly with deviation; at `cap_threshold` and above
/// it is capped at `cap_factor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltySchedule {
    pub free_limit: u64,
    pub cap_threshold: u64,
    pub cap_factor: u64,
}

impl Default for PenaltySchedule {
    fn default() -> Self {
        // 10% free band, 30% cap, 1% maximum charge
        Self {
            free_limit: 1_000,
            cap_threshold: 3_000,
            cap_factor: 10_000,
        }
    }
}

impl PenaltySchedule {
    /// Penalty for a corrected amount at the given positive deviation.
    ///
    /// Truncating integer division throughout, matching on-ledger
    /// token arithmetic.
    pub fn penalty(&self, amount: u128, deviation: u64) -> u128 {
        if deviation <= self.free_limit {
            return 0;
        }
        let factor = if deviation >= self.cap_threshold {
            self.cap_factor
        } else {
            deviation
        };
        amount * factor as u128 * 100 / 100_000_000
    }
}

/// Fixed-point scale between oracle value units and reward tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountScale {
    /// Reward token decimals
    pub reward_exp: u32,
    /// Combined decimals of price and discount inputs
    pub value_exp: u32,
}

impl Default for AmountScale {
    fn default() -> Self {
        Self {
            reward_exp: 18,
            value_exp: 12,
        }
    }
}

impl AmountScale {
    /// One record's reward-scaled contribution:
    /// `volume * price * discount * 10^reward_exp / 10^value_exp`.
    pub fn contribution(&self, volume: u64, price: u64, discount: u64) -> Option<u128> {
        let raw = (volume as u128)
            .checked_mul(price as u128)?
            .checked_mul(discount as u128)?;
        let scaled = raw.checked_mul(10u128.checked_pow(self.reward_exp)?)?;
        Some(scaled / 10u128.pow(self.value_exp))
    }
}

/// Complete per-asset settlement behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPolicy {
    pub mode: SettlementMode,
    pub discount: DiscountSchedule,
    pub penalty: PenaltySchedule,
    pub scale: AmountScale,
}

impl SettlementPolicy {
    /// Built-in policy for each supported asset class.
    pub fn for_kind(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Oil => Self {
                mode: SettlementMode::Reconciled,
                discount: DiscountSchedule::OilBrackets,
                penalty: PenaltySchedule::default(),
                scale: AmountScale::default(),
            },
            AssetKind::Gas => Self {
                mode: SettlementMode::Reconciled,
                discount: DiscountSchedule::Fixed(DISCOUNT_BASE),
                penalty: PenaltySchedule::default(),
                scale: AmountScale::default(),
            },
            AssetKind::Eth | AssetKind::Btc => Self {
                mode: SettlementMode::Direct,
                discount: DiscountSchedule::Fixed(DISCOUNT_BASE),
                penalty: PenaltySchedule::default(),
                scale: AmountScale::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oil_discount_brackets() {
        let schedule = DiscountSchedule::OilBrackets;
        assert_eq!(schedule.factor(3111, 499), 9_000);
        assert_eq!(schedule.factor(3111, 500), 8_500);
        assert_eq!(schedule.factor(3110, 499), 8_000);
        assert_eq!(schedule.factor(3110, 500), 7_500);
    }

    #[test]
    fn test_fixed_discount_ignores_scores() {
        let schedule = DiscountSchedule::Fixed(DISCOUNT_BASE);
        assert_eq!(schedule.factor(0, 0), 10_000);
        assert_eq!(schedule.factor(9999, 9999), 10_000);
    }

    #[test]
    fn test_penalty_free_band() {
        let schedule = PenaltySchedule::default();
        assert_eq!(schedule.penalty(1_000_000, 0), 0);
        assert_eq!(schedule.penalty(1_000_000, 999), 0);
        assert_eq!(schedule.penalty(1_000_000, 1_000), 0);
    }

    #[test]
    fn test_penalty_linear_band() {
        let schedule = PenaltySchedule::default();
        // amount * d * 100 / 1e8
        assert_eq!(schedule.penalty(1_000_000, 1_001), 1_001);
        assert_eq!(schedule.penalty(1_000_000, 2_000), 2_000);
        assert_eq!(schedule.penalty(1_000_000, 2_999), 2_999);
    }

    #[test]
    fn test_penalty_capped_at_one_percent() {
        let schedule = PenaltySchedule::default();
        let capped = schedule.penalty(1_000_000, 3_000);
        assert_eq!(capped, 10_000);
        assert_eq!(schedule.penalty(1_000_000, 9_999), capped);
        assert_eq!(capped, 1_000_000 / 100);
    }

    #[test]
    fn test_penalty_monotone_in_deviation() {
        let schedule = PenaltySchedule::default();
        let mut last = 0;
        for d in [0, 500, 1_000, 1_500, 2_500, 3_000, 5_000] {
            let p = schedule.penalty(1_000_000_000, d);
            assert!(p >= last, "penalty regressed at deviation {d}");
            last = p;
        }
    }

    #[test]
    fn test_contribution_reference_values() {
        let scale = AmountScale::default();
        // 1000 units at price 100, flat discount
        assert_eq!(
            scale.contribution(1000, 100, 10_000),
            Some(1_000_000_000_000_000)
        );
        // 2000 units at price 200
        assert_eq!(
            scale.contribution(2000, 200, 10_000),
            Some(4_000_000_000_000_000)
        );
    }

    #[test]
    fn test_contribution_overflow_is_none() {
        let scale = AmountScale::default();
        assert_eq!(scale.contribution(u64::MAX, u64::MAX, u64::MAX), None);
    }

    #[test]
    fn test_policy_modes_per_kind() {
        assert_eq!(
            SettlementPolicy::for_kind(AssetKind::Oil).mode,
            SettlementMode::Reconciled
        );
        assert_eq!(
            SettlementPolicy::for_kind(AssetKind::Gas).mode,
            SettlementMode::Reconciled
        );
        assert_eq!(
            SettlementPolicy::for_kind(AssetKind::Eth).mode,
            SettlementMode::Direct
        );
        assert_eq!(
            SettlementPolicy::for_kind(AssetKind::Btc).mode,
            SettlementMode::Direct
        );
    }
}
