//! Sled State Store
//!
//! Durable embedded backend. One sled tree per table, values stored as
//! JSON. Settlement writes flush before returning so a crash after a
//! successful call can never forget a cleared key.

use super::{
    month_composite_key, settle_composite_key, ClearingApplication, StateStore, StorageStats,
};
use crate::error::{EngineError, EngineResult};
use crate::types::{
    AccountId, AssetValueRequest, DateKey, MonthKey, MonthlyAggregate, SettleKey, TrustedRecord,
    UniqueId,
};
use async_trait::async_trait;
use std::path::Path;

const TREE_PRICES: &str = "prices";
const TREE_REQUESTS: &str = "requests";
const TREE_AGGREGATES: &str = "aggregates";
const TREE_TRUSTED: &str = "trusted";
const TREE_ESCROW: &str = "escrow";
const TREE_CLEARED: &str = "cleared";
const TREE_META: &str = "meta";

const META_NEXT_REQUEST_ID: &[u8] = b"next_request_id";

pub struct SledStore {
    db: sled::Db,
    prices: sled::Tree,
    requests: sled::Tree,
    aggregates: sled::Tree,
    trusted: sled::Tree,
    escrow: sled::Tree,
    cleared: sled::Tree,
    meta: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            prices: db.open_tree(TREE_PRICES)?,
            requests: db.open_tree(TREE_REQUESTS)?,
            aggregates: db.open_tree(TREE_AGGREGATES)?,
            trusted: db.open_tree(TREE_TRUSTED)?,
            escrow: db.open_tree(TREE_ESCROW)?,
            cleared: db.open_tree(TREE_CLEARED)?,
            meta: db.open_tree(TREE_META)?,
            db,
        })
    }

    fn encode<T: serde::Serialize>(value: &T) -> EngineResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> EngineResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[async_trait]
impl StateStore for SledStore {
    async fn put_price(&self, date: &DateKey, price: u64) -> EngineResult<Option<u64>> {
        let previous = self
            .prices
            .insert(date.as_str().as_bytes(), Self::encode(&price)?)?;
        previous.map(|bytes| Self::decode(&bytes)).transpose()
    }

    async fn get_price(&self, date: &DateKey) -> EngineResult<Option<u64>> {
        self.prices
            .get(date.as_str().as_bytes())?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    async fn next_request_id(&self) -> EngineResult<u64> {
        let allocated = self.meta.update_and_fetch(META_NEXT_REQUEST_ID, |old| {
            let next = match old {
                Some(bytes) => {
                    let mut arr = [0u8; 8];
                    arr.copy_from_slice(bytes);
                    u64::from_be_bytes(arr) + 1
                }
                None => 1,
            };
            Some(next.to_be_bytes().to_vec())
        })?;
        let bytes = allocated.ok_or_else(|| EngineError::Storage(
            "request id counter missing after update".to_string(),
        ))?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes);
        Ok(u64::from_be_bytes(arr))
    }

    async fn put_request(&self, request: &AssetValueRequest) -> EngineResult<()> {
        self.requests.insert(
            request.request_id.0.to_be_bytes(),
            Self::encode(request)?,
        )?;
        Ok(())
    }

    async fn get_request(&self, request_id: u64) -> EngineResult<Option<AssetValueRequest>> {
        self.requests
            .get(request_id.to_be_bytes())?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    async fn get_aggregate(
        &self,
        unique_id: &UniqueId,
        month: &MonthKey,
    ) -> EngineResult<Option<MonthlyAggregate>> {
        self.aggregates
            .get(month_composite_key(unique_id, month))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    async fn put_aggregate(&self, aggregate: &MonthlyAggregate) -> EngineResult<()> {
        self.aggregates.insert(
            month_composite_key(&aggregate.unique_id, &aggregate.month),
            Self::encode(aggregate)?,
        )?;
        Ok(())
    }

    async fn get_trusted(
        &self,
        unique_id: &UniqueId,
        key: &SettleKey,
    ) -> EngineResult<Option<TrustedRecord>> {
        self.trusted
            .get(settle_composite_key(unique_id, key))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    async fn put_trusted(&self, record: &TrustedRecord) -> EngineResult<bool> {
        let previous = self.trusted.insert(
            settle_composite_key(&record.unique_id, &record.key),
            Self::encode(record)?,
        )?;
        Ok(previous.is_some())
    }

    async fn escrow_balance(&self, account: &AccountId) -> EngineResult<u128> {
        Ok(self
            .escrow
            .get(account.as_str().as_bytes())?
            .map(|bytes| Self::decode(&bytes))
            .transpose()?
            .unwrap_or(0))
    }

    async fn set_escrow_balance(&self, account: &AccountId, balance: u128) -> EngineResult<()> {
        self.escrow
            .insert(account.as_str().as_bytes(), Self::encode(&balance)?)?;
        Ok(())
    }

    async fn is_cleared(&self, unique_id: &UniqueId, key: &SettleKey) -> EngineResult<bool> {
        Ok(self
            .cleared
            .contains_key(settle_composite_key(unique_id, key))?)
    }

    async fn apply_clearing(&self, application: &ClearingApplication) -> EngineResult<()> {
        if let Some(debit) = &application.escrow {
            self.escrow
                .insert(debit.account.as_str().as_bytes(), Self::encode(&debit.after)?)?;
        }
        self.cleared.insert(
            settle_composite_key(&application.unique_id, &application.key),
            Self::encode(&application.receipt)?,
        )?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn revert_clearing(&self, application: &ClearingApplication) -> EngineResult<()> {
        self.cleared
            .remove(settle_composite_key(&application.unique_id, &application.key))?;
        if let Some(debit) = &application.escrow {
            self.escrow.insert(
                debit.account.as_str().as_bytes(),
                Self::encode(&debit.before)?,
            )?;
        }
        self.db.flush_async().await?;
        Ok(())
    }

    async fn stats(&self) -> EngineResult<StorageStats> {
        Ok(StorageStats {
            prices: self.prices.len(),
            requests: self.requests.len(),
            aggregates: self.aggregates.len(),
            trusted: self.trusted.len(),
            escrow_accounts: self.escrow.len(),
            cleared: self.cleared.len(),
        })
    }

    async fn flush(&self) -> EngineResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}
