//! In-memory purchase ledger.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    CheckoutSessionId, CourseId, DomainError, ErrorCode, Money, PurchaseId, Timestamp, UserId,
};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::ports::{PurchaseLedger, PurchaseReader};

/// Purchase records kept in insertion order.
///
/// Insertion order doubles as creation order; readers walk the list
/// backwards for newest-first results.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPurchaseLedger {
    purchases: Arc<RwLock<Vec<Purchase>>>,
}

impl InMemoryPurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.purchases.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.purchases.read().await.is_empty()
    }

    /// Stores a record as-is, bypassing the uniqueness check.
    ///
    /// Lets tests seed degraded records (for example one without an owner).
    pub async fn seed(&self, purchase: Purchase) {
        self.purchases.write().await.push(purchase);
    }

    async fn newest_first<F>(&self, keep: F) -> Vec<Purchase>
    where
        F: Fn(&Purchase) -> bool,
    {
        self.purchases
            .read()
            .await
            .iter()
            .rev()
            .filter(|p| keep(p))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PurchaseLedger for InMemoryPurchaseLedger {
    async fn insert(&self, purchase: &Purchase) -> Result<(), DomainError> {
        let mut purchases = self.purchases.write().await;
        if purchases.iter().any(|p| p.session_id == purchase.session_id) {
            return Err(DomainError::new(
                ErrorCode::DuplicateSession,
                format!("Checkout session already recorded: {}", purchase.session_id),
            ));
        }
        purchases.push(purchase.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .purchases
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn find_by_session_id(
        &self,
        session_id: &CheckoutSessionId,
    ) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .purchases
            .read()
            .await
            .iter()
            .find(|p| &p.session_id == session_id)
            .cloned())
    }

    async fn complete_if_pending(
        &self,
        session_id: &CheckoutSessionId,
        owner: &UserId,
        amount: &Money,
        at: Timestamp,
    ) -> Result<Option<Purchase>, DomainError> {
        let mut purchases = self.purchases.write().await;
        let Some(purchase) = purchases
            .iter_mut()
            .find(|p| &p.session_id == session_id && p.status == PurchaseStatus::Pending)
        else {
            return Ok(None);
        };

        purchase
            .complete(owner.clone(), amount.clone(), at)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        Ok(Some(purchase.clone()))
    }

    async fn fail_if_pending(
        &self,
        session_id: &CheckoutSessionId,
        at: Timestamp,
    ) -> Result<Option<Purchase>, DomainError> {
        let mut purchases = self.purchases.write().await;
        let Some(purchase) = purchases
            .iter_mut()
            .find(|p| &p.session_id == session_id && p.status == PurchaseStatus::Pending)
        else {
            return Ok(None);
        };

        purchase
            .fail(at)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        Ok(Some(purchase.clone()))
    }

    async fn mark_reconciled(&self, id: &PurchaseId, at: Timestamp) -> Result<(), DomainError> {
        let mut purchases = self.purchases.write().await;
        let purchase = purchases
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::PurchaseNotFound, format!("Purchase not found: {}", id))
            })?;

        if purchase.enrollment_reconciled_at.is_none() {
            purchase.enrollment_reconciled_at = Some(at);
            purchase.updated_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl PurchaseReader for InMemoryPurchaseLedger {
    async fn list_by_user(
        &self,
        user_id: &UserId,
        status: Option<PurchaseStatus>,
    ) -> Result<Vec<Purchase>, DomainError> {
        Ok(self
            .newest_first(|p| {
                p.user_id.as_ref() == Some(user_id) && status.map_or(true, |s| p.status == s)
            })
            .await)
    }

    async fn list_by_user_and_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Purchase>, DomainError> {
        Ok(self
            .newest_first(|p| p.user_id.as_ref() == Some(user_id) && &p.course_id == course_id)
            .await)
    }

    async fn list_all(&self) -> Result<Vec<Purchase>, DomainError> {
        Ok(self.newest_first(|_| true).await)
    }

    async fn list_unreconciled(&self, limit: u32) -> Result<Vec<Purchase>, DomainError> {
        Ok(self
            .purchases
            .read()
            .await
            .iter()
            .filter(|p| p.needs_reconciliation())
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
