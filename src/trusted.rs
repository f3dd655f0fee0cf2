//! Trusted Data Book
//!
//! Ingests oracle-attested ground-truth measurements, keyed by
//! (producer, settlement key). The settlement key shape must match the
//! engine's mode: months for reconciled assets, block heights for
//! direct ones. Resubmission replaces the stored record and is
//! surfaced to the caller rather than rejected, so oracle corrections
//! before settlement remain possible.

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventSink};
use crate::policy::SettlementMode;
use crate::storage::StateStore;
use crate::types::{AssetKind, RequestId, SettleKey, TrustedIngest, TrustedRecord, UniqueId};
use std::sync::Arc;
use tracing::{info, warn};

pub struct TrustedDataBook {
    kind: AssetKind,
    mode: SettlementMode,
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
}

impl TrustedDataBook {
    pub fn new(
        kind: AssetKind,
        mode: SettlementMode,
        store: Arc<dyn StateStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            kind,
            mode,
            store,
            events,
        }
    }

    fn check_key_shape(&self, key: &SettleKey) -> EngineResult<()> {
        let ok = match self.mode {
            SettlementMode::Reconciled => matches!(key, SettleKey::Month(_)),
            SettlementMode::Direct => matches!(key, SettleKey::Block(_)),
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::SettleKeyMismatch {
                expected: match self.mode {
                    SettlementMode::Reconciled => "monthly".to_string(),
                    SettlementMode::Direct => "per-block".to_string(),
                },
                got: key.to_string(),
            })
        }
    }

    /// Store one trusted measurement, answering an oracle request.
    pub async fn receive_trusted_data(
        &self,
        request_id: RequestId,
        record: TrustedRecord,
    ) -> EngineResult<TrustedIngest> {
        let mut request = self
            .store
            .get_request(request_id.0)
            .await?
            .ok_or(EngineError::UnknownRequest {
                request_id: request_id.0,
            })?;
        self.check_key_shape(&record.key)?;

        if !request.is_fulfilled() {
            request.fulfill();
            self.store.put_request(&request).await?;
        }

        let overwrote = self.store.put_trusted(&record).await?;
        if overwrote {
            warn!(
                kind = %self.kind,
                unique_id = %record.unique_id,
                key = %record.key,
                "Trusted data replaced an existing record"
            );
        }

        info!(
            kind = %self.kind,
            unique_id = %record.unique_id,
            key = %record.key,
            amount = %record.amount,
            "Trusted data received"
        );
        self.events.emit(EngineEvent::TrustedDataReceived {
            kind: self.kind,
            unique_id: record.unique_id,
            key: record.key.clone(),
            amount: record.amount,
        });

        Ok(TrustedIngest {
            unique_id: record.unique_id,
            key: record.key,
            overwrote,
        })
    }

    /// Stored trusted record for a settlement key, if any.
    pub async fn get_trusted(
        &self,
        unique_id: &UniqueId,
        key: &SettleKey,
    ) -> EngineResult<Option<TrustedRecord>> {
        self.store.get_trusted(unique_id, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::storage::MemoryStore;
    use crate::types::{AssetValueRequest, MonthKey, RequestState};

    fn test_id() -> UniqueId {
        UniqueId([0x44; 32])
    }

    async fn book(mode: SettlementMode) -> (TrustedDataBook, RequestId) {
        let kind = match mode {
            SettlementMode::Reconciled => AssetKind::Gas,
            SettlementMode::Direct => AssetKind::Eth,
        };
        let store = Arc::new(MemoryStore::new());
        let request_id = RequestId(store.next_request_id().await.unwrap());
        store
            .put_request(&AssetValueRequest::new(request_id, kind))
            .await
            .unwrap();
        let book = TrustedDataBook::new(kind, mode, store, Arc::new(EventLog::new()));
        (book, request_id)
    }

    #[tokio::test]
    async fn test_monthly_key_accepted_for_reconciled() {
        let (book, request_id) = book(SettlementMode::Reconciled).await;
        let key = SettleKey::Month(MonthKey::parse("2401").unwrap());
        let ingest = book
            .receive_trusted_data(request_id, TrustedRecord::new(test_id(), key.clone(), 2500))
            .await
            .unwrap();
        assert!(!ingest.overwrote);
        assert_eq!(
            book.get_trusted(&test_id(), &key).await.unwrap().unwrap().amount,
            2500
        );
    }

    #[tokio::test]
    async fn test_unknown_request_rejected() {
        let (book, _) = book(SettlementMode::Reconciled).await;
        let key = SettleKey::Month(MonthKey::parse("2401").unwrap());
        assert!(matches!(
            book.receive_trusted_data(RequestId(99), TrustedRecord::new(test_id(), key, 2500))
                .await,
            Err(EngineError::UnknownRequest { request_id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_submission_fulfills_request() {
        let (book, request_id) = book(SettlementMode::Direct).await;
        book.receive_trusted_data(
            request_id,
            TrustedRecord::new(test_id(), SettleKey::Block(180), 1000),
        )
        .await
        .unwrap();
        let request = book.store.get_request(request_id.0).await.unwrap().unwrap();
        assert_eq!(request.state, RequestState::Fulfilled);
    }

    #[tokio::test]
    async fn test_block_key_rejected_for_reconciled() {
        let (book, request_id) = book(SettlementMode::Reconciled).await;
        let result = book
            .receive_trusted_data(
                request_id,
                TrustedRecord::new(test_id(), SettleKey::Block(180), 2500),
            )
            .await;
        assert!(matches!(result, Err(EngineError::SettleKeyMismatch { .. })));
    }

    #[tokio::test]
    async fn test_month_key_rejected_for_direct() {
        let (book, request_id) = book(SettlementMode::Direct).await;
        let key = SettleKey::Month(MonthKey::parse("2401").unwrap());
        let result = book
            .receive_trusted_data(request_id, TrustedRecord::new(test_id(), key, 2500))
            .await;
        assert!(matches!(result, Err(EngineError::SettleKeyMismatch { .. })));
    }

    #[tokio::test]
    async fn test_resubmission_flags_overwrite() {
        let (book, request_id) = book(SettlementMode::Direct).await;
        let key = SettleKey::Block(180);

        let first = book
            .receive_trusted_data(request_id, TrustedRecord::new(test_id(), key.clone(), 1000))
            .await
            .unwrap();
        assert!(!first.overwrote);

        let second = book
            .receive_trusted_data(request_id, TrustedRecord::new(test_id(), key.clone(), 1100))
            .await
            .unwrap();
        assert!(second.overwrote);
        assert_eq!(
            book.get_trusted(&test_id(), &key).await.unwrap().unwrap().amount,
            1100
        );
    }
}
