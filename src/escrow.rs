//! Escrow Margin Vault
//!
//! Producers of reconciled assets post margin here; over-reporting
//! penalties are charged against it at settlement. Balances never go
//! negative. All balance mutations serialize per account.

use crate::config::DebitPolicy;
use crate::error::{EngineError, EngineResult};
use crate::locks::KeyLocks;
use crate::storage::{EscrowDebit, StateStore};
use crate::types::AccountId;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

pub struct EscrowVault {
    store: Arc<dyn StateStore>,
    locks: KeyLocks<AccountId>,
}

impl EscrowVault {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
        }
    }

    /// Serialize external operations against one account. Settlement
    /// holds this while planning and applying a penalty debit.
    pub async fn lock_account(&self, account: &AccountId) -> OwnedMutexGuard<()> {
        self.locks.acquire(account.clone()).await
    }

    /// Add margin to an account, returning the new balance.
    pub async fn deposit(&self, account: &AccountId, amount: u128) -> EngineResult<u128> {
        let _guard = self.lock_account(account).await;
        let balance = self.store.escrow_balance(account).await?;
        let updated = balance
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;
        self.store.set_escrow_balance(account, updated).await?;
        debug!(account = %account, amount, balance = updated, "Escrow deposit");
        Ok(updated)
    }

    /// Current margin of an account; unknown accounts read as zero.
    pub async fn balance_of(&self, account: &AccountId) -> EngineResult<u128> {
        self.store.escrow_balance(account).await
    }

    /// Withdraw margin, returning the new balance. The full requested
    /// amount must be available.
    pub async fn withdraw(&self, account: &AccountId, amount: u128) -> EngineResult<u128> {
        let _guard = self.lock_account(account).await;
        let balance = self.store.escrow_balance(account).await?;
        if amount > balance {
            return Err(EngineError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }
        let updated = balance - amount;
        self.store.set_escrow_balance(account, updated).await?;
        debug!(account = %account, amount, balance = updated, "Escrow withdrawal");
        Ok(updated)
    }

    /// Plan a penalty debit without applying it. The caller must hold
    /// the account lock across plan and apply.
    ///
    /// Under [`DebitPolicy::Clamp`] a shortfall charges whatever is
    /// available; under [`DebitPolicy::Strict`] it is an error.
    pub async fn plan_debit(
        &self,
        account: &AccountId,
        amount: u128,
        policy: DebitPolicy,
    ) -> EngineResult<EscrowDebit> {
        let before = self.store.escrow_balance(account).await?;
        let after = match policy {
            DebitPolicy::Clamp => {
                if amount > before {
                    warn!(
                        account = %account,
                        required = %amount,
                        available = %before,
                        "Penalty exceeds margin, clamping to available balance"
                    );
                }
                before.saturating_sub(amount)
            }
            DebitPolicy::Strict => {
                if amount > before {
                    return Err(EngineError::InsufficientMargin {
                        required: amount,
                        available: before,
                    });
                }
                before - amount
            }
        };
        Ok(EscrowDebit {
            account: account.clone(),
            before,
            after,
        })
    }
}
