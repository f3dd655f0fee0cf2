//! Engine Data Model
//!
//! Core tables are keyed by [`UniqueId`] with date/month/block secondary
//! keys; producers are external reference data.

pub mod clearing;
pub mod common;
pub mod oracle;
pub mod producer;
pub mod production;
pub mod trusted;

pub use clearing::{ClearingOutcome, ClearingReceipt};
pub use common::{AccountId, AssetKind, DateKey, MonthKey, SettleKey, UniqueId};
pub use oracle::{AssetValueRequest, RequestId, RequestState};
pub use producer::{Producer, ProducerStatus};
pub use production::{MonthlyAggregate, ProductionRecord};
pub use trusted::{TrustedIngest, TrustedRecord};
