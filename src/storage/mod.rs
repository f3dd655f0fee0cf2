//! State Persistence
//!
//! All durable engine state goes through the [`StateStore`] trait:
//! oracle prices and requests, monthly aggregates, trusted records,
//! escrow balances, and the cleared-key table that enforces
//! exactly-once settlement. Two backends ship: [`MemoryStore`] for
//! tests and [`SledStore`] for durable single-node deployments.
//!
//! Settlement writes its escrow debit and cleared flag through one
//! [`ClearingApplication`] so a backend can apply them together, and
//! revert them together if the mint that follows fails.

pub mod memory;
pub mod sled;

pub use self::sled::SledStore;
pub use memory::MemoryStore;

use crate::error::EngineResult;
use crate::types::{
    AccountId, AssetValueRequest, ClearingReceipt, DateKey, MonthKey, MonthlyAggregate,
    SettleKey, TrustedRecord, UniqueId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Escrow side of a settlement, captured as a before/after pair so the
/// debit can be reverted exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowDebit {
    pub account: AccountId,
    pub before: u128,
    pub after: u128,
}

/// The state transition of one settlement: mark the key cleared and,
/// when a penalty applies, debit escrow. Backends apply both writes in
/// one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingApplication {
    pub unique_id: UniqueId,
    pub key: SettleKey,
    pub receipt: ClearingReceipt,
    pub escrow: Option<EscrowDebit>,
}

/// Table sizes, for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub prices: usize,
    pub requests: usize,
    pub aggregates: usize,
    pub trusted: usize,
    pub escrow_accounts: usize,
    pub cleared: usize,
}

/// Persistence contract for all engine state.
#[async_trait]
pub trait StateStore: Send + Sync {
    // --- Oracle prices ---

    /// Store a price for a date, returning the previous value if one
    /// was overwritten.
    async fn put_price(&self, date: &DateKey, price: u64) -> EngineResult<Option<u64>>;

    async fn get_price(&self, date: &DateKey) -> EngineResult<Option<u64>>;

    // --- Oracle requests ---

    /// Allocate the next request id (monotonic, starts at 1).
    async fn next_request_id(&self) -> EngineResult<u64>;

    async fn put_request(&self, request: &AssetValueRequest) -> EngineResult<()>;

    async fn get_request(&self, request_id: u64) -> EngineResult<Option<AssetValueRequest>>;

    // --- Production aggregates ---

    async fn get_aggregate(
        &self,
        unique_id: &UniqueId,
        month: &MonthKey,
    ) -> EngineResult<Option<MonthlyAggregate>>;

    async fn put_aggregate(&self, aggregate: &MonthlyAggregate) -> EngineResult<()>;

    // --- Trusted data ---

    async fn get_trusted(
        &self,
        unique_id: &UniqueId,
        key: &SettleKey,
    ) -> EngineResult<Option<TrustedRecord>>;

    /// Store a trusted record, returning true when a previous record
    /// for the same key was replaced.
    async fn put_trusted(&self, record: &TrustedRecord) -> EngineResult<bool>;

    // --- Escrow ---

    /// Balance of an account; absent accounts read as zero.
    async fn escrow_balance(&self, account: &AccountId) -> EngineResult<u128>;

    async fn set_escrow_balance(&self, account: &AccountId, balance: u128) -> EngineResult<()>;

    // --- Clearing ---

    async fn is_cleared(&self, unique_id: &UniqueId, key: &SettleKey) -> EngineResult<bool>;

    /// Mark a key cleared and apply its escrow debit.
    async fn apply_clearing(&self, application: &ClearingApplication) -> EngineResult<()>;

    /// Undo [`apply_clearing`](StateStore::apply_clearing) after a
    /// failed mint: clear the flag and restore the escrow balance.
    async fn revert_clearing(&self, application: &ClearingApplication) -> EngineResult<()>;

    // --- Maintenance ---

    async fn stats(&self) -> EngineResult<StorageStats>;

    /// Flush buffered writes to durable media. No-op for volatile
    /// backends.
    async fn flush(&self) -> EngineResult<()>;
}

/// Composite key for per-(producer, settlement key) tables.
pub(crate) fn settle_composite_key(unique_id: &UniqueId, key: &SettleKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + 9);
    out.extend_from_slice(unique_id.as_bytes());
    out.extend_from_slice(&key.encode());
    out
}

/// Composite key for per-(producer, month) tables.
pub(crate) fn month_composite_key(unique_id: &UniqueId, month: &MonthKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + 4);
    out.extend_from_slice(unique_id.as_bytes());
    out.extend_from_slice(month.as_str().as_bytes());
    out
}

/// Backend selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "backend")]
pub enum StorageConfig {
    /// Volatile in-process store
    Memory,
    /// Durable embedded store rooted at `data_dir`
    Sled { data_dir: PathBuf },
}

impl StorageConfig {
    pub fn memory() -> Self {
        StorageConfig::Memory
    }

    pub fn sled(data_dir: impl Into<PathBuf>) -> Self {
        StorageConfig::Sled {
            data_dir: data_dir.into(),
        }
    }

    /// Open the configured backend.
    pub fn open(&self) -> EngineResult<Arc<dyn StateStore>> {
        match self {
            StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            StorageConfig::Sled { data_dir } => Ok(Arc::new(SledStore::open(data_dir)?)),
        }
    }
}
