//! Treasure Clearing - Production Verification & Reward Clearing Engine
//!
//! This crate settles verified commodity production into reward tokens.
//! Producers of reconciled assets (oil, gas) self-report daily output,
//! valued at oracle benchmark prices with a quality discount; at the end
//! of each month the report is reconciled against trusted measurement
//! data, over-reporting is capped and penalized from posted escrow
//! margin, and the corrected reward is minted exactly once. Mined assets
//! (eth, btc) skip self-reporting and mint the trusted per-block amount
//! directly.
//!
//! # Architecture
//!
//! One [`ClearingEngine`] instance serves one asset class and composes:
//!
//! - **Asset Value Registry**: oracle request/response pairing for
//!   benchmark prices keyed by date
//! - **Production Ledger**: self-reported records folded into monthly
//!   aggregates of volume and discounted value
//! - **Trusted Data Book**: oracle-attested ground truth per settlement
//!   key (month or block height)
//! - **Escrow Vault**: margin accounts charged for over-reporting
//!   penalties
//! - **Clearing**: exactly-once settlement with proportional correction,
//!   tiered penalties, and reward minting
//!
//! Producer onboarding and the reward token itself stay external,
//! reached through the [`ProducerDirectory`] and [`RewardToken`] traits.
//!
//! # Settlement Arithmetic
//!
//! All value flows use truncating integer arithmetic. A record's
//! contribution is `volume * price * discount * 10^18 / 10^12`; the
//! deviation of a monthly report is `(reported - trusted) * 10000 /
//! trusted` in hundredths of a percent. Deviations up to 10% are free,
//! between 10% and 30% the penalty is proportional, and above 30% it is
//! capped at 1% of the corrected amount.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use treasure_clearing::{
//!     AccountId, AssetKind, ClearingEngine, DateKey, EngineConfig, EventLog,
//!     InMemoryDirectory, MonthKey, ProductionRecord, RecordingToken, SettleKey,
//!     TrustedRecord, UniqueId,
//! };
//!
//! async fn example() {
//!     let engine = ClearingEngine::new(
//!         EngineConfig::development(AssetKind::Gas, "./data/gas"),
//!         Arc::new(InMemoryDirectory::new()),
//!         Arc::new(RecordingToken::new()),
//!         Arc::new(EventLog::new()),
//!     )
//!     .unwrap();
//!
//!     let unique_id = UniqueId([0u8; 32]);
//!     let reporter = AccountId::new("owner-1");
//!
//!     // Oracle price, then a self-report for the same date
//!     let request = engine.register_request().await.unwrap();
//!     let date = DateKey::parse("240102").unwrap();
//!     engine.submit_value(request, date.clone(), 100).await.unwrap();
//!     engine
//!         .record_production(unique_id, ProductionRecord::new(1000, date, reporter))
//!         .await
//!         .unwrap();
//!
//!     // Trusted volume arrives, the month settles
//!     let key = SettleKey::Month(MonthKey::parse("2401").unwrap());
//!     engine
//!         .receive_trusted_data(request, TrustedRecord::new(unique_id, key.clone(), 900))
//!         .await
//!         .unwrap();
//!     let outcome = engine.clear(unique_id, key).await.unwrap();
//!     println!("minted {} to {}", outcome.minted, outcome.payout_account);
//! }
//! ```

pub mod clearing;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod locks;
pub mod oracle;
pub mod policy;
pub mod registry;
pub mod storage;
pub mod trusted;
pub mod types;

pub use clearing::ClearingEngine;
pub use config::{DebitPolicy, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use escrow::EscrowVault;
pub use events::{EngineEvent, EventLog, EventSink, NullSink};
pub use ledger::ProductionLedger;
pub use oracle::AssetValueRegistry;
pub use policy::{
    AmountScale, DiscountSchedule, PenaltySchedule, SettlementMode, SettlementPolicy,
    DISCOUNT_BASE,
};
pub use registry::{InMemoryDirectory, Mint, ProducerDirectory, RecordingToken, RewardToken};
pub use storage::{
    ClearingApplication, EscrowDebit, MemoryStore, SledStore, StateStore, StorageConfig,
    StorageStats,
};
pub use trusted::TrustedDataBook;
pub use types::{
    AccountId, AssetKind, AssetValueRequest, ClearingOutcome, ClearingReceipt, DateKey,
    MonthKey, MonthlyAggregate, Producer, ProducerStatus, ProductionRecord, RequestId,
    RequestState, SettleKey, TrustedIngest, TrustedRecord, UniqueId,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
