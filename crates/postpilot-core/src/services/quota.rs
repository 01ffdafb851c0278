//! Quota ledger - the monthly credit allowance consumed by generation and edits.
//!
//! The ledger never deducts up front. Callers run [`QuotaLedger::check`] before
//! calling the generation agent and [`QuotaLedger::charge`] only after it has
//! delivered content, so failed generations are free.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{Clock, UserRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub remaining: i32,
}

pub struct QuotaLedger {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    allowance: i32,
}

impl QuotaLedger {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>, allowance: i32) -> Self {
        Self {
            users,
            clock,
            allowance,
        }
    }

    pub fn allowance(&self) -> i32 {
        self.allowance
    }

    /// Load the user, applying the lazy monthly reset first if the month rolled over.
    pub async fn refresh(&self, user_id: Uuid) -> Result<User, DomainError> {
        let user = self.load(user_id).await?;
        let now = self.clock.now();
        if !user.needs_credit_reset(now) {
            return Ok(user);
        }

        if self
            .users
            .reset_credits_if_stale(user_id, self.allowance, now)
            .await?
        {
            tracing::info!(%user_id, allowance = self.allowance, "Monthly credits reset");
        }
        self.load(user_id).await
    }

    /// Reset-then-check. Fails with `QuotaExceeded` when nothing is left; deducts nothing.
    pub async fn check(&self, user_id: Uuid) -> Result<QuotaStatus, DomainError> {
        let user = self.refresh(user_id).await?;
        if user.credits <= 0 {
            tracing::info!(%user_id, "Quota exhausted");
            return Err(DomainError::QuotaExceeded);
        }
        Ok(QuotaStatus {
            remaining: user.credits,
        })
    }

    /// Take one credit for delivered content. Returns the new balance.
    pub async fn charge(&self, user_id: Uuid) -> Result<i32, DomainError> {
        match self.users.decrement_credit_if_positive(user_id).await? {
            Some(balance) => {
                tracing::debug!(%user_id, balance, "Credit charged");
                Ok(balance)
            }
            // Another request spent the last credit between check and charge.
            None => Err(DomainError::QuotaExceeded),
        }
    }

    /// Give a charged credit back when the content could not be stored.
    pub async fn refund(&self, user_id: Uuid) {
        if let Err(e) = self.users.refund_credit(user_id).await {
            tracing::error!(%user_id, error = %e, "Failed to refund credit");
        }
    }

    async fn load(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }
}
