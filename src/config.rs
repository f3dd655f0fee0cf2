//! Engine Configuration

use crate::policy::SettlementPolicy;
use crate::storage::StorageConfig;
use crate::types::AssetKind;
use serde::{Deserialize, Serialize};

/// What to do when a penalty exceeds the escrow balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitPolicy {
    /// Charge what is available and settle anyway
    #[default]
    Clamp,
    /// Fail the settlement and leave all state untouched
    Strict,
}

/// Configuration for one engine instance (one asset class).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Asset class this engine settles
    pub kind: AssetKind,
    /// Escrow shortfall handling
    pub debit_policy: DebitPolicy,
    /// Discount, penalty, and settlement-mode parameters
    pub policy: SettlementPolicy,
    /// Backing store selection
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Config with the built-in policy for the asset class.
    pub fn new(kind: AssetKind, storage: StorageConfig) -> Self {
        Self {
            kind,
            debit_policy: DebitPolicy::default(),
            policy: SettlementPolicy::for_kind(kind),
            storage,
        }
    }

    /// Durable store rooted at the given directory.
    pub fn development(kind: AssetKind, data_dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(kind, StorageConfig::sled(data_dir))
    }

    /// Volatile store, for tests and exploration.
    pub fn test(kind: AssetKind) -> Self {
        Self::new(kind, StorageConfig::memory())
    }

    pub fn with_debit_policy(mut self, policy: DebitPolicy) -> Self {
        self.debit_policy = policy;
        self
    }
}
