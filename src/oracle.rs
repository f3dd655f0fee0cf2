//! Asset Value Registry
//!
//! Request/response pairing with the external price oracle. A request
//! reserves an id; the oracle answers it with one or more (date, price)
//! submissions. Prices are keyed by date only, so a later submission
//! for the same date replaces the earlier one.

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventSink};
use crate::storage::StateStore;
use crate::types::{AssetKind, AssetValueRequest, DateKey, RequestId};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AssetValueRegistry {
    kind: AssetKind,
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
}

impl AssetValueRegistry {
    pub fn new(kind: AssetKind, store: Arc<dyn StateStore>, events: Arc<dyn EventSink>) -> Self {
        Self {
            kind,
            store,
            events,
        }
    }

    /// Allocate a new oracle request slot.
    pub async fn register_request(&self) -> EngineResult<RequestId> {
        let request_id = RequestId(self.store.next_request_id().await?);
        let request = AssetValueRequest::new(request_id, self.kind);
        self.store.put_request(&request).await?;

        debug!(kind = %self.kind, %request_id, "Registered asset value request");
        self.events.emit(EngineEvent::RequestRegistered {
            kind: self.kind,
            request_id: request_id.0,
        });
        Ok(request_id)
    }

    /// Record an oracle answer: a benchmark price for one date.
    ///
    /// The request moves to fulfilled on its first submission and keeps
    /// accepting further dates. Returns the previous price when the
    /// date already had one.
    pub async fn submit_value(
        &self,
        request_id: RequestId,
        date: DateKey,
        price: u64,
    ) -> EngineResult<Option<u64>> {
        let mut request = self
            .store
            .get_request(request_id.0)
            .await?
            .ok_or(EngineError::UnknownRequest {
                request_id: request_id.0,
            })?;

        if !request.is_fulfilled() {
            request.fulfill();
            self.store.put_request(&request).await?;
        }

        let previous = self.store.put_price(&date, price).await?;
        if let Some(previous) = previous {
            warn!(
                kind = %self.kind,
                date = %date,
                previous,
                price,
                "Overwriting asset value for date"
            );
        }

        info!(kind = %self.kind, %request_id, date = %date, price, "Asset value received");
        self.events.emit(EngineEvent::AssetValueReceived {
            kind: self.kind,
            date,
            price,
        });
        Ok(previous)
    }

    /// Stored benchmark price for a date, if the oracle supplied one.
    pub async fn get_value(&self, date: &DateKey) -> EngineResult<Option<u64>> {
        self.store.get_price(date).await
    }

    /// Request lookup, mostly for operational inspection.
    pub async fn get_request(&self, request_id: RequestId) -> EngineResult<Option<AssetValueRequest>> {
        self.store.get_request(request_id.0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::storage::MemoryStore;
    use crate::types::RequestState;

    fn registry() -> (AssetValueRegistry, Arc<EventLog>) {
        let events = Arc::new(EventLog::new());
        let registry = AssetValueRegistry::new(
            AssetKind::Gas,
            Arc::new(MemoryStore::new()),
            events.clone(),
        );
        (registry, events)
    }

    #[tokio::test]
    async fn test_register_then_submit() {
        let (registry, events) = registry();
        let request_id = registry.register_request().await.unwrap();
        assert_eq!(request_id.0, 1);

        let date = DateKey::parse("240102").unwrap();
        let previous = registry
            .submit_value(request_id, date.clone(), 100)
            .await
            .unwrap();
        assert_eq!(previous, None);
        assert_eq!(registry.get_value(&date).await.unwrap(), Some(100));

        let request = registry.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.state, RequestState::Fulfilled);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_unknown_request_rejected() {
        let (registry, _) = registry();
        let date = DateKey::parse("240102").unwrap();
        assert_eq!(
            registry.submit_value(RequestId(99), date, 100).await,
            Err(EngineError::UnknownRequest { request_id: 99 })
        );
    }

    #[tokio::test]
    async fn test_resubmission_overwrites_and_reports() {
        let (registry, _) = registry();
        let request_id = registry.register_request().await.unwrap();
        let date = DateKey::parse("240102").unwrap();

        registry
            .submit_value(request_id, date.clone(), 100)
            .await
            .unwrap();
        let previous = registry
            .submit_value(request_id, date.clone(), 150)
            .await
            .unwrap();

        assert_eq!(previous, Some(100));
        assert_eq!(registry.get_value(&date).await.unwrap(), Some(150));
    }

    #[tokio::test]
    async fn test_one_request_many_dates() {
        let (registry, _) = registry();
        let request_id = registry.register_request().await.unwrap();

        for (date, price) in [("240101", 100), ("240102", 200), ("240103", 300)] {
            registry
                .submit_value(request_id, DateKey::parse(date).unwrap(), price)
                .await
                .unwrap();
        }

        let d2 = DateKey::parse("240102").unwrap();
        assert_eq!(registry.get_value(&d2).await.unwrap(), Some(200));
    }
}
