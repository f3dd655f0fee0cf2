//! Clearing Engine
//!
//! One engine instance settles one asset class. The engine composes
//! the asset value registry, production ledger, trusted data book, and
//! escrow vault over a shared state store, and adds the settlement
//! step itself.
//!
//! Settlement is exactly-once per (producer, settlement key): the
//! cleared flag is persisted together with the escrow debit, and the
//! reward mint follows. A failed mint reverts the persisted state, so
//! the key can be retried.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::escrow::EscrowVault;
use crate::events::{EngineEvent, EventSink};
use crate::ledger::ProductionLedger;
use crate::locks::KeyLocks;
use crate::oracle::AssetValueRegistry;
use crate::policy::{SettlementMode, DISCOUNT_BASE};
use crate::registry::{ProducerDirectory, RewardToken};
use crate::storage::{ClearingApplication, EscrowDebit, StateStore, StorageStats};
use crate::trusted::TrustedDataBook;
use crate::types::{
    AccountId, ClearingOutcome, ClearingReceipt, DateKey, MonthKey, MonthlyAggregate, Producer,
    ProductionRecord, RequestId, SettleKey, TrustedIngest, TrustedRecord, UniqueId,
};
use std::sync::Arc;
use tracing::{error, info};

pub struct ClearingEngine {
    config: EngineConfig,
    store: Arc<dyn StateStore>,
    directory: Arc<dyn ProducerDirectory>,
    token: Arc<dyn RewardToken>,
    events: Arc<dyn EventSink>,
    oracle: AssetValueRegistry,
    ledger: ProductionLedger,
    trusted: TrustedDataBook,
    escrow: EscrowVault,
    settle_locks: KeyLocks<(UniqueId, SettleKey)>,
}

impl ClearingEngine {
    /// Open the configured store and wire up all components.
    pub fn new(
        config: EngineConfig,
        directory: Arc<dyn ProducerDirectory>,
        token: Arc<dyn RewardToken>,
        events: Arc<dyn EventSink>,
    ) -> EngineResult<Self> {
        let store = config.storage.open()?;
        Ok(Self::with_store(config, store, directory, token, events))
    }

    /// Wire up components over an already-open store.
    pub fn with_store(
        config: EngineConfig,
        store: Arc<dyn StateStore>,
        directory: Arc<dyn ProducerDirectory>,
        token: Arc<dyn RewardToken>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let oracle = AssetValueRegistry::new(config.kind, store.clone(), events.clone());
        let ledger = ProductionLedger::new(
            config.kind,
            store.clone(),
            directory.clone(),
            events.clone(),
            config.policy,
        );
        let trusted = TrustedDataBook::new(
            config.kind,
            config.policy.mode,
            store.clone(),
            events.clone(),
        );
        let escrow = EscrowVault::new(store.clone());
        Self {
            config,
            store,
            directory,
            token,
            events,
            oracle,
            ledger,
            trusted,
            escrow,
            settle_locks: KeyLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Oracle pass-throughs ---

    pub async fn register_request(&self) -> EngineResult<RequestId> {
        self.oracle.register_request().await
    }

    pub async fn submit_value(
        &self,
        request_id: RequestId,
        date: DateKey,
        price: u64,
    ) -> EngineResult<Option<u64>> {
        self.oracle.submit_value(request_id, date, price).await
    }

    pub async fn get_value(&self, date: &DateKey) -> EngineResult<Option<u64>> {
        self.oracle.get_value(date).await
    }

    // --- Ledger pass-throughs ---

    pub async fn record_production(
        &self,
        unique_id: UniqueId,
        record: ProductionRecord,
    ) -> EngineResult<MonthlyAggregate> {
        self.ledger.record_production(unique_id, record).await
    }

    pub async fn aggregate_of(
        &self,
        unique_id: &UniqueId,
        month: &MonthKey,
    ) -> EngineResult<MonthlyAggregate> {
        self.ledger.aggregate(unique_id, month).await
    }

    // --- Trusted data pass-throughs ---

    pub async fn receive_trusted_data(
        &self,
        request_id: RequestId,
        record: TrustedRecord,
    ) -> EngineResult<TrustedIngest> {
        self.trusted.receive_trusted_data(request_id, record).await
    }

    pub async fn trusted_of(
        &self,
        unique_id: &UniqueId,
        key: &SettleKey,
    ) -> EngineResult<Option<TrustedRecord>> {
        self.trusted.get_trusted(unique_id, key).await
    }

    // --- Escrow pass-throughs ---

    pub async fn deposit_margin(&self, account: &AccountId, amount: u128) -> EngineResult<u128> {
        self.escrow.deposit(account, amount).await
    }

    pub async fn withdraw_margin(&self, account: &AccountId, amount: u128) -> EngineResult<u128> {
        self.escrow.withdraw(account, amount).await
    }

    pub async fn margin_of(&self, account: &AccountId) -> EngineResult<u128> {
        self.escrow.balance_of(account).await
    }

    // --- Maintenance ---

    pub async fn stats(&self) -> EngineResult<StorageStats> {
        self.store.stats().await
    }

    pub async fn flush(&self) -> EngineResult<()> {
        self.store.flush().await
    }

    // --- Settlement ---

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

    /// Settle one (producer, settlement key) and mint the reward.
    ///
    /// Reconciled mode compares the monthly self-report against the
    /// trusted volume: over-reporting is capped proportionally and
    /// penalized from escrow, under-reporting passes through at face
    /// value. Direct mode mints the trusted amount verbatim.
    pub async fn clear(&self, unique_id: UniqueId, key: SettleKey) -> EngineResult<ClearingOutcome> {
        let _settle_guard = self
            .settle_locks
            .acquire((unique_id, key.clone()))
            .await;

        let producer = self.active_producer(&unique_id).await?;

        if self.store.is_cleared(&unique_id, &key).await? {
            return Err(EngineError::AlreadyCleared {
                unique_id: unique_id.to_hex(),
                key: key.to_string(),
            });
        }

        let trusted = self
            .store
            .get_trusted(&unique_id, &key)
            .await?
            .ok_or_else(|| EngineError::NoTrustedData {
                unique_id: unique_id.to_hex(),
                key: key.to_string(),
            })?;

        let outcome = match self.config.policy.mode {
            SettlementMode::Reconciled => {
                self.settle_reconciled(unique_id, key, &producer, &trusted)
                    .await?
            }
            SettlementMode::Direct => self.settle_direct(unique_id, key, &producer, &trusted),
        };

        self.commit(outcome).await
    }

    async fn settle_reconciled(
        &self,
        unique_id: UniqueId,
        key: SettleKey,
        producer: &Producer,
        trusted: &TrustedRecord,
    ) -> EngineResult<PlannedSettlement> {
        let month = key
            .as_month()
            .ok_or_else(|| EngineError::SettleKeyMismatch {
                expected: "monthly".to_string(),
                got: key.to_string(),
            })?
            .clone();

        let trusted_volume =
            u64::try_from(trusted.amount).map_err(|_| EngineError::AmountOverflow)?;
        if trusted_volume == 0 {
            return Err(EngineError::ZeroTrustedVolume {
                unique_id: unique_id.to_hex(),
                key: key.to_string(),
            });
        }

        let aggregate = self
            .store
            .get_aggregate(&unique_id, &month)
            .await?
            .unwrap_or_else(|| MonthlyAggregate::zeroed(unique_id, month));
        let reported_volume = aggregate.cumulative_volume;
        let reported_amount = aggregate.cumulative_amount;

        let deviation = i64::try_from(
            (reported_volume as i128 - trusted_volume as i128) * DISCOUNT_BASE as i128
                / trusted_volume as i128,
        )
        .map_err(|_| EngineError::AmountOverflow)?;

        let (corrected_volume, corrected_amount, penalty) = if reported_volume > trusted_volume {
            // Proportional cap: keep the trusted share of the reported
            // amount. reported_volume > 0 here.
            let corrected_amount =
                reported_amount * trusted_volume as u128 / reported_volume as u128;
            let penalty = self
                .config
                .policy
                .penalty
                .penalty(corrected_amount, deviation as u64);
            (trusted_volume, corrected_amount, penalty)
        } else {
            // Under- or exact reporting passes through at face value
            (reported_volume, reported_amount, 0)
        };

        let escrow = if penalty > 0 {
            let escrow_account = producer.owner.clone();
            let guard = self.escrow.lock_account(&escrow_account).await;
            let debit = self
                .escrow
                .plan_debit(&escrow_account, penalty, self.config.debit_policy)
                .await?;
            Some((guard, debit))
        } else {
            None
        };
        let (escrow_guard, escrow_debit) = match escrow {
            Some((guard, debit)) => (Some(guard), Some(debit)),
            None => (None, None),
        };
        let charged = escrow_debit
            .as_ref()
            .map(|debit| debit.before - debit.after)
            .unwrap_or(0);

        Ok(PlannedSettlement {
            outcome: ClearingOutcome {
                kind: self.config.kind,
                unique_id,
                key,
                corrected_volume,
                corrected_amount,
                deviation,
                penalty: charged,
                minted: corrected_amount,
                payout_account: producer.payout_account().clone(),
                receipt: ClearingReceipt([0u8; 32]),
            },
            escrow_debit,
            _escrow_guard: escrow_guard,
            verified: true,
        })
    }

    fn settle_direct(
        &self,
        unique_id: UniqueId,
        key: SettleKey,
        producer: &Producer,
        trusted: &TrustedRecord,
    ) -> PlannedSettlement {
        // The oracle may attest a foreign payout address per block;
        // otherwise the reward goes to the registered account.
        let payout_account = trusted
            .minting_account
            .clone()
            .unwrap_or_else(|| producer.payout_account().clone());

        PlannedSettlement {
            outcome: ClearingOutcome {
                kind: self.config.kind,
                unique_id,
                key,
                corrected_volume: 0,
                corrected_amount: trusted.amount,
                deviation: 0,
                penalty: 0,
                minted: trusted.amount,
                payout_account,
                receipt: ClearingReceipt([0u8; 32]),
            },
            escrow_debit: None,
            _escrow_guard: None,
            verified: false,
        }
    }

    /// Persist the settlement, mint, and emit events. A failed mint
    /// reverts the persisted state so the key stays retryable.
    async fn commit(&self, planned: PlannedSettlement) -> EngineResult<ClearingOutcome> {
        let PlannedSettlement {
            mut outcome,
            escrow_debit,
            _escrow_guard,
            verified,
        } = planned;

        outcome.receipt = ClearingReceipt::compute(
            outcome.kind,
            &outcome.unique_id,
            &outcome.key,
            outcome.corrected_volume,
            outcome.corrected_amount,
            outcome.deviation,
            outcome.penalty,
            outcome.minted,
        );

        let application = ClearingApplication {
            unique_id: outcome.unique_id,
            key: outcome.key.clone(),
            receipt: outcome.receipt,
            escrow: escrow_debit,
        };
        self.store.apply_clearing(&application).await?;

        if let Err(mint_err) = self.token.mint(&outcome.payout_account, outcome.minted).await {
            if let Err(revert_err) = self.store.revert_clearing(&application).await {
                // Both the mint and the revert failed; the key stays
                // marked cleared and needs operator attention.
                error!(
                    unique_id = %outcome.unique_id,
                    key = %outcome.key,
                    %mint_err,
                    %revert_err,
                    "Failed to revert settlement after mint failure"
                );
            }
            return Err(EngineError::MintFailed {
                reason: mint_err.to_string(),
            });
        }

        if verified {
            self.events.emit(EngineEvent::VerifiedProduction {
                unique_id: outcome.unique_id,
                key: outcome.key.clone(),
                corrected_volume: outcome.corrected_volume,
            });
        }
        self.events.emit(EngineEvent::ClearingReward {
            kind: outcome.kind,
            unique_id: outcome.unique_id,
            key: outcome.key.clone(),
            amount: outcome.minted,
        });

        info!(
            kind = %outcome.kind,
            unique_id = %outcome.unique_id,
            key = %outcome.key,
            minted = %outcome.minted,
            penalty = %outcome.penalty,
            deviation = outcome.deviation,
            receipt = %outcome.receipt,
            "Settlement cleared"
        );
        Ok(outcome)
    }
}

/// A fully validated settlement, ready to persist. Holds the escrow
/// account lock (when a penalty applies) until commit finishes.
struct PlannedSettlement {
    outcome: ClearingOutcome,
    escrow_debit: Option<EscrowDebit>,
    _escrow_guard: Option<tokio::sync::OwnedMutexGuard<()>>,
    verified: bool,
}
