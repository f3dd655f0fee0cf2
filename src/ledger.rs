//! Production Ledger
//!
//! Accepts self-reported production records and folds them into
//! monthly aggregates, valuing each record at the oracle price for its
//! date with the producer's quality discount applied. Reports are
//! taken at face value here; reconciliation against trusted data
//! happens at settlement.

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventSink};
use crate::locks::KeyLocks;
use crate::policy::SettlementPolicy;
use crate::registry::ProducerDirectory;
use crate::storage::StateStore;
use crate::types::{
    AssetKind, MonthKey, MonthlyAggregate, Producer, ProductionRecord, UniqueId,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ProductionLedger {
    kind: AssetKind,
    store: Arc<dyn StateStore>,
    directory: Arc<dyn ProducerDirectory>,
    events: Arc<dyn EventSink>,
    policy: SettlementPolicy,
    month_locks: KeyLocks<(UniqueId, MonthKey)>,
}

impl ProductionLedger {
    pub fn new(
        kind: AssetKind,
        store: Arc<dyn StateStore>,
        directory: Arc<dyn ProducerDirectory>,
        events: Arc<dyn EventSink>,
        policy: SettlementPolicy,
    ) -> Self {
        Self {
            kind,
            store,
            directory,
            events,
            policy,
            month_locks: KeyLocks::new(),
        }
    }

    async fn active_producer(&self, unique_id: &UniqueId) -> EngineResult<Producer> {
        let producer = self
            .directory
            .producer(unique_id)
            .await?
            .ok_or_else(|| EngineError::UnknownProducer {
                unique_id: unique_id.to_hex(),
            })?;
        if !producer.status.is_active() {
            return Err(EngineError::ProducerNotActive {
                unique_id: unique_id.to_hex(),
            });
        }
        Ok(producer)
    }

    /// Record one self-reported production entry and return the
    /// updated monthly aggregate.
    ///
    /// A date with no oracle price contributes zero value but still
    /// counts its volume; duplicate submissions double-count, which
    /// reconciliation later corrects.
    pub async fn record_production(
        &self,
        unique_id: UniqueId,
        record: ProductionRecord,
    ) -> EngineResult<MonthlyAggregate> {
        let producer = self.active_producer(&unique_id).await?;

        let price = match self.store.get_price(&record.date).await? {
            Some(price) => price,
            None => {
                warn!(
                    kind = %self.kind,
                    unique_id = %unique_id,
                    date = %record.date,
                    "No asset value for date, record contributes zero amount"
                );
                0
            }
        };

        let discount = self
            .policy
            .discount
            .factor(producer.api_score, producer.sulphur_score);
        let amount = self
            .policy
            .scale
            .contribution(record.volume, price, discount)
            .ok_or(EngineError::AmountOverflow)?;

        let month = record.date.month();
        // Racing reports for the same month serialize; a read-modify-
        // write without the guard would drop one record's volume.
        let _month_guard = self
            .month_locks
            .acquire((unique_id, month.clone()))
            .await;
        let mut aggregate = self
            .store
            .get_aggregate(&unique_id, &month)
            .await?
            .unwrap_or_else(|| MonthlyAggregate::zeroed(unique_id, month.clone()));
        aggregate.accumulate(record.volume, amount)?;
        self.store.put_aggregate(&aggregate).await?;

        debug!(
            kind = %self.kind,
            unique_id = %unique_id,
            date = %record.date,
            volume = record.volume,
            amount,
            "Production recorded"
        );
        self.events.emit(EngineEvent::ProductionRecorded {
            kind: self.kind,
            unique_id,
            month,
            date: record.date,
            volume: record.volume,
        });
        Ok(aggregate)
    }

    /// Monthly aggregate for a producer; months with no records read
    /// as zeroed.
    pub async fn aggregate(
        &self,
        unique_id: &UniqueId,
        month: &MonthKey,
    ) -> EngineResult<MonthlyAggregate> {
        Ok(self
            .store
            .get_aggregate(unique_id, month)
            .await?
            .unwrap_or_else(|| MonthlyAggregate::zeroed(*unique_id, month.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::registry::InMemoryDirectory;
    use crate::storage::{ClearingApplication, MemoryStore, StorageStats};
    use crate::types::{
        AccountId, AssetValueRequest, DateKey, ProducerStatus, SettleKey, TrustedRecord,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    fn test_id() -> UniqueId {
        UniqueId([0x11; 32])
    }

    fn gas_producer() -> Producer {
        Producer {
            nickname: "rig-1".to_string(),
            owner: AccountId::new("owner-1"),
            api_score: 0,
            sulphur_score: 0,
            settlement_account: None,
            status: ProducerStatus::Active,
        }
    }

    async fn ledger_with(
        producer: Option<Producer>,
    ) -> (ProductionLedger, Arc<MemoryStore>, Arc<InMemoryDirectory>) {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        if let Some(producer) = producer {
            directory.register(test_id(), producer).await;
        }
        let ledger = ProductionLedger::new(
            AssetKind::Gas,
            store.clone(),
            directory.clone(),
            Arc::new(EventLog::new()),
            SettlementPolicy::for_kind(AssetKind::Gas),
        );
        (ledger, store, directory)
    }

    #[tokio::test]
    async fn test_records_accumulate_into_month() {
        let (ledger, store, _) = ledger_with(Some(gas_producer())).await;
        let d1 = DateKey::parse("240101").unwrap();
        let d2 = DateKey::parse("240102").unwrap();
        store.put_price(&d1, 100).await.unwrap();
        store.put_price(&d2, 200).await.unwrap();

        let reporter = AccountId::new("owner-1");
        ledger
            .record_production(test_id(), ProductionRecord::new(1000, d1, reporter.clone()))
            .await
            .unwrap();
        let aggregate = ledger
            .record_production(test_id(), ProductionRecord::new(2000, d2, reporter))
            .await
            .unwrap();

        assert_eq!(aggregate.cumulative_volume, 3000);
        // 1000*100 + 2000*200 at flat discount, scaled to token units
        assert_eq!(aggregate.cumulative_amount, 5_000_000_000_000_000);
    }

    #[tokio::test]
    async fn test_unknown_producer_rejected() {
        let (ledger, _, _) = ledger_with(None).await;
        let record = ProductionRecord::new(
            100,
            DateKey::parse("240101").unwrap(),
            AccountId::new("owner-1"),
        );
        assert!(matches!(
            ledger.record_production(test_id(), record).await,
            Err(EngineError::UnknownProducer { .. })
        ));
    }

    #[tokio::test]
    async fn test_suspended_producer_rejected() {
        let (ledger, _, directory) = ledger_with(Some(gas_producer())).await;
        directory
            .set_status(&test_id(), ProducerStatus::Suspended)
            .await
            .unwrap();

        let record = ProductionRecord::new(
            100,
            DateKey::parse("240101").unwrap(),
            AccountId::new("owner-1"),
        );
        assert!(matches!(
            ledger.record_production(test_id(), record).await,
            Err(EngineError::ProducerNotActive { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_price_counts_volume_only() {
        let (ledger, _, _) = ledger_with(Some(gas_producer())).await;
        let record = ProductionRecord::new(
            500,
            DateKey::parse("240110").unwrap(),
            AccountId::new("owner-1"),
        );
        let aggregate = ledger.record_production(test_id(), record).await.unwrap();
        assert_eq!(aggregate.cumulative_volume, 500);
        assert_eq!(aggregate.cumulative_amount, 0);
    }

    #[tokio::test]
    async fn test_oil_discount_applies_to_amount() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        // Light sweet crude: 90% factor
        directory
            .register(
                test_id(),
                Producer {
                    api_score: 3200,
                    sulphur_score: 400,
                    ..gas_producer()
                },
            )
            .await;
        let ledger = ProductionLedger::new(
            AssetKind::Oil,
            store.clone(),
            directory,
            Arc::new(EventLog::new()),
            SettlementPolicy::for_kind(AssetKind::Oil),
        );

        let date = DateKey::parse("240101").unwrap();
        store.put_price(&date, 100).await.unwrap();
        let aggregate = ledger
            .record_production(
                test_id(),
                ProductionRecord::new(1000, date, AccountId::new("owner-1")),
            )
            .await
            .unwrap();
        // 1000 * 100 * 9000 * 1e18 / 1e12
        assert_eq!(aggregate.cumulative_amount, 900_000_000_000_000);
    }

    /// Store wrapper that widens the read-modify-write window by
    /// stalling aggregate reads.
    struct SlowAggregateStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl StateStore for SlowAggregateStore {
        async fn put_price(&self, date: &DateKey, price: u64) -> EngineResult<Option<u64>> {
            self.inner.put_price(date, price).await
        }
        async fn get_price(&self, date: &DateKey) -> EngineResult<Option<u64>> {
            self.inner.get_price(date).await
        }
        async fn next_request_id(&self) -> EngineResult<u64> {
            self.inner.next_request_id().await
        }
        async fn put_request(&self, request: &AssetValueRequest) -> EngineResult<()> {
            self.inner.put_request(request).await
        }
        async fn get_request(
            &self,
            request_id: u64,
        ) -> EngineResult<Option<AssetValueRequest>> {
            self.inner.get_request(request_id).await
        }
        async fn get_aggregate(
            &self,
            unique_id: &UniqueId,
            month: &MonthKey,
        ) -> EngineResult<Option<MonthlyAggregate>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.inner.get_aggregate(unique_id, month).await
        }
        async fn put_aggregate(&self, aggregate: &MonthlyAggregate) -> EngineResult<()> {
            self.inner.put_aggregate(aggregate).await
        }
        async fn get_trusted(
            &self,
            unique_id: &UniqueId,
            key: &SettleKey,
        ) -> EngineResult<Option<TrustedRecord>> {
            self.inner.get_trusted(unique_id, key).await
        }
        async fn put_trusted(&self, record: &TrustedRecord) -> EngineResult<bool> {
            self.inner.put_trusted(record).await
        }
        async fn escrow_balance(&self, account: &AccountId) -> EngineResult<u128> {
            self.inner.escrow_balance(account).await
        }
        async fn set_escrow_balance(
            &self,
            account: &AccountId,
            balance: u128,
        ) -> EngineResult<()> {
            self.inner.set_escrow_balance(account, balance).await
        }
        async fn is_cleared(&self, unique_id: &UniqueId, key: &SettleKey) -> EngineResult<bool> {
            self.inner.is_cleared(unique_id, key).await
        }
        async fn apply_clearing(&self, application: &ClearingApplication) -> EngineResult<()> {
            self.inner.apply_clearing(application).await
        }
        async fn revert_clearing(&self, application: &ClearingApplication) -> EngineResult<()> {
            self.inner.revert_clearing(application).await
        }
        async fn stats(&self) -> EngineResult<StorageStats> {
            self.inner.stats().await
        }
        async fn flush(&self) -> EngineResult<()> {
            self.inner.flush().await
        }
    }

    #[tokio::test]
    async fn test_concurrent_same_month_records_all_counted() {
        let store: Arc<dyn StateStore> = Arc::new(SlowAggregateStore {
            inner: MemoryStore::new(),
        });
        let directory = Arc::new(InMemoryDirectory::new());
        directory.register(test_id(), gas_producer()).await;
        let ledger = Arc::new(ProductionLedger::new(
            AssetKind::Gas,
            store,
            directory,
            Arc::new(EventLog::new()),
            SettlementPolicy::for_kind(AssetKind::Gas),
        ));

        let mut handles = Vec::new();
        for (volume, date) in [(100u64, "240101"), (200, "240115")] {
            let ledger = ledger.clone();
            let date = DateKey::parse(date).unwrap();
            handles.push(tokio::spawn(async move {
                ledger
                    .record_production(
                        test_id(),
                        ProductionRecord::new(volume, date, AccountId::new("owner-1")),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let aggregate = ledger
            .aggregate(&test_id(), &MonthKey::parse("2401").unwrap())
            .await
            .unwrap();
        assert_eq!(aggregate.cumulative_volume, 300);
    }

    #[tokio::test]
    async fn test_empty_month_reads_zeroed() {
        let (ledger, _, _) = ledger_with(Some(gas_producer())).await;
        let month = MonthKey::parse("2403").unwrap();
        let aggregate = ledger.aggregate(&test_id(), &month).await.unwrap();
        assert!(aggregate.is_empty());
    }
}
