//! External Registries
//!
//! The engine does not own producer onboarding or the reward token;
//! both are reached through traits so deployments can bind them to a
//! real asset registry and token bridge. In-memory implementations
//! back tests and single-process runs.

use crate::error::{EngineError, EngineResult};
use crate::types::{AccountId, Producer, UniqueId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Read-side view of the producer registry.
#[async_trait]
pub trait ProducerDirectory: Send + Sync {
    /// Producer metadata, or `None` when the id was never registered.
    async fn producer(&self, unique_id: &UniqueId) -> EngineResult<Option<Producer>>;
}

/// Mint-side of the reward token.
#[async_trait]
pub trait RewardToken: Send + Sync {
    /// Mint `amount` reward tokens to `account`. Must be atomic: on an
    /// error nothing was minted.
    async fn mint(&self, account: &AccountId, amount: u128) -> EngineResult<()>;
}

/// Simple in-process producer registry.
#[derive(Default)]
pub struct InMemoryDirectory {
    producers: RwLock<HashMap<UniqueId, Producer>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, unique_id: UniqueId, producer: Producer) {
        self.producers.write().await.insert(unique_id, producer);
    }

    pub async fn set_status(
        &self,
        unique_id: &UniqueId,
        status: crate::types::ProducerStatus,
    ) -> EngineResult<()> {
        let mut producers = self.producers.write().await;
        let producer = producers
            .get_mut(unique_id)
            .ok_or_else(|| EngineError::UnknownProducer {
                unique_id: unique_id.to_hex(),
            })?;
        producer.status = status;
        Ok(())
    }
}

#[async_trait]
impl ProducerDirectory for InMemoryDirectory {
    async fn producer(&self, unique_id: &UniqueId) -> EngineResult<Option<Producer>> {
        Ok(self.producers.read().await.get(unique_id).cloned())
    }
}

/// One recorded mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mint {
    pub account: AccountId,
    pub amount: u128,
}

/// Token stub that records every mint and tracks balances.
#[derive(Default)]
pub struct RecordingToken {
    mints: RwLock<Vec<Mint>>,
}

impl RecordingToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mints(&self) -> Vec<Mint> {
        self.mints.read().await.clone()
    }

    pub async fn balance_of(&self, account: &AccountId) -> u128 {
        self.mints
            .read()
            .await
            .iter()
            .filter(|mint| &mint.account == account)
            .map(|mint| mint.amount)
            .sum()
    }
}

#[async_trait]
impl RewardToken for RecordingToken {
    async fn mint(&self, account: &AccountId, amount: u128) -> EngineResult<()> {
        self.mints.write().await.push(Mint {
            account: account.clone(),
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProducerStatus;

    fn test_producer() -> Producer {
        Producer {
            nickname: "well-7".to_string(),
            owner: AccountId::new("owner-1"),
            api_score: 3200,
            sulphur_score: 400,
            settlement_account: None,
            status: ProducerStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_directory_lookup_and_status() {
        let directory = InMemoryDirectory::new();
        let id = UniqueId([0x01; 32]);

        assert!(directory.producer(&id).await.unwrap().is_none());

        directory.register(id, test_producer()).await;
        assert!(directory.producer(&id).await.unwrap().is_some());

        directory
            .set_status(&id, ProducerStatus::Suspended)
            .await
            .unwrap();
        let producer = directory.producer(&id).await.unwrap().unwrap();
        assert_eq!(producer.status, ProducerStatus::Suspended);
    }

    #[tokio::test]
    async fn test_set_status_unknown_producer() {
        let directory = InMemoryDirectory::new();
        let missing = UniqueId([0x02; 32]);
        assert!(matches!(
            directory.set_status(&missing, ProducerStatus::Active).await,
            Err(EngineError::UnknownProducer { .. })
        ));
    }

    #[tokio::test]
    async fn test_recording_token_balances() {
        let token = RecordingToken::new();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");

        token.mint(&alice, 100).await.unwrap();
        token.mint(&alice, 50).await.unwrap();
        token.mint(&bob, 7).await.unwrap();

        assert_eq!(token.balance_of(&alice).await, 150);
        assert_eq!(token.balance_of(&bob).await, 7);
        assert_eq!(token.mints().await.len(), 3);
    }
}
