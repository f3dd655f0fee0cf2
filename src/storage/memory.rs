//! In-Memory State Store
//!
//! Volatile backend for tests and embedded exploration. Each table is
//! a `HashMap` behind one `RwLock`; the request-id counter is atomic.

use super::{
    month_composite_key, settle_composite_key, ClearingApplication, StateStore, StorageStats,
};
use crate::error::EngineResult;
use crate::types::{
    AccountId, AssetValueRequest, DateKey, MonthKey, MonthlyAggregate, SettleKey, TrustedRecord,
    UniqueId,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    prices: HashMap<String, u64>,
    requests: HashMap<u64, AssetValueRequest>,
    aggregates: HashMap<Vec<u8>, MonthlyAggregate>,
    trusted: HashMap<Vec<u8>, TrustedRecord>,
    escrow: HashMap<AccountId, u128>,
    cleared: HashSet<Vec<u8>>,
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_request_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_request_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn put_price(&self, date: &DateKey, price: u64) -> EngineResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        Ok(tables.prices.insert(date.as_str().to_string(), price))
    }

    async fn get_price(&self, date: &DateKey) -> EngineResult<Option<u64>> {
        let tables = self.tables.read().await;
        Ok(tables.prices.get(date.as_str()).copied())
    }

    async fn next_request_id(&self) -> EngineResult<u64> {
        Ok(self.next_request_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn put_request(&self, request: &AssetValueRequest) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.requests.insert(request.request_id.0, request.clone());
        Ok(())
    }

    async fn get_request(&self, request_id: u64) -> EngineResult<Option<AssetValueRequest>> {
        let tables = self.tables.read().await;
        Ok(tables.requests.get(&request_id).cloned())
    }

    async fn get_aggregate(
        &self,
        unique_id: &UniqueId,
        month: &MonthKey,
    ) -> EngineResult<Option<MonthlyAggregate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .aggregates
            .get(&month_composite_key(unique_id, month))
            .cloned())
    }

    async fn put_aggregate(&self, aggregate: &MonthlyAggregate) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.aggregates.insert(
            month_composite_key(&aggregate.unique_id, &aggregate.month),
            aggregate.clone(),
        );
        Ok(())
    }

    async fn get_trusted(
        &self,
        unique_id: &UniqueId,
        key: &SettleKey,
    ) -> EngineResult<Option<TrustedRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .trusted
            .get(&settle_composite_key(unique_id, key))
            .cloned())
    }

    async fn put_trusted(&self, record: &TrustedRecord) -> EngineResult<bool> {
        let mut tables = self.tables.write().await;
        let replaced = tables
            .trusted
            .insert(
                settle_composite_key(&record.unique_id, &record.key),
                record.clone(),
            )
            .is_some();
        Ok(replaced)
    }

    async fn escrow_balance(&self, account: &AccountId) -> EngineResult<u128> {
        let tables = self.tables.read().await;
        Ok(tables.escrow.get(account).copied().unwrap_or(0))
    }

    async fn set_escrow_balance(&self, account: &AccountId, balance: u128) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.escrow.insert(account.clone(), balance);
        Ok(())
    }

    async fn is_cleared(&self, unique_id: &UniqueId, key: &SettleKey) -> EngineResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.cleared.contains(&settle_composite_key(unique_id, key)))
    }

    async fn apply_clearing(&self, application: &ClearingApplication) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(debit) = &application.escrow {
            tables.escrow.insert(debit.account.clone(), debit.after);
        }
        tables
            .cleared
            .insert(settle_composite_key(&application.unique_id, &application.key));
        Ok(())
    }

    async fn revert_clearing(&self, application: &ClearingApplication) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .cleared
            .remove(&settle_composite_key(&application.unique_id, &application.key));
        if let Some(debit) = &application.escrow {
            tables.escrow.insert(debit.account.clone(), debit.before);
        }
        Ok(())
    }

    async fn stats(&self) -> EngineResult<StorageStats> {
        let tables = self.tables.read().await;
        Ok(StorageStats {
            prices: tables.prices.len(),
            requests: tables.requests.len(),
            aggregates: tables.aggregates.len(),
            trusted: tables.trusted.len(),
            escrow_accounts: tables.escrow.len(),
            cleared: tables.cleared.len(),
        })
    }

    async fn flush(&self) -> EngineResult<()> {
        Ok(())
    }
}
