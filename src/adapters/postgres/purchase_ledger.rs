//! PostgreSQL implementation of PurchaseLedger.
//!
//! Status transitions are a single `UPDATE ... WHERE status = 'pending'
//! RETURNING ...`, so two concurrent deliveries can never both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CheckoutSessionId, CourseId, Currency, DomainError, ErrorCode, Money, PurchaseId, Timestamp,
    UserId,
};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::ports::PurchaseLedger;

use super::database_error;

const SESSION_UNIQUE_CONSTRAINT: &str = "course_purchases_external_session_id_key";

pub(super) const PURCHASE_COLUMNS: &str = "id, course_id, user_id, external_session_id, \
     amount_minor, currency, status, enrollment_reconciled_at, created_at, updated_at";

/// PostgreSQL implementation of the PurchaseLedger port.
pub struct PostgresPurchaseLedger {
    pool: PgPool,
}

impl PostgresPurchaseLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct PurchaseRow {
    id: Uuid,
    course_id: Uuid,
    user_id: Option<String>,
    external_session_id: String,
    amount_minor: i64,
    currency: String,
    status: String,
    enrollment_reconciled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid {} in purchase {}: {}", field, row.id, e),
            )
        };

        let status = row
            .status
            .parse::<PurchaseStatus>()
            .map_err(|e| corrupt("status", &e))?;
        let currency = Currency::new(&row.currency).map_err(|e| corrupt("currency", &e))?;
        let amount = Money::new(row.amount_minor, currency).map_err(|e| corrupt("amount", &e))?;
        let session_id = CheckoutSessionId::new(row.external_session_id.clone())
            .map_err(|e| corrupt("external_session_id", &e))?;
        let user_id = row
            .user_id
            .clone()
            .map(UserId::new)
            .transpose()
            .map_err(|e| corrupt("user_id", &e))?;

        Ok(Purchase {
            id: PurchaseId::from_uuid(row.id),
            course_id: CourseId::from_uuid(row.course_id),
            user_id,
            session_id,
            amount,
            status,
            enrollment_reconciled_at: row.enrollment_reconciled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

pub(super) fn rows_to_purchases(rows: Vec<PurchaseRow>) -> Result<Vec<Purchase>, DomainError> {
    rows.into_iter().map(Purchase::try_from).collect()
}

#[async_trait]
impl PurchaseLedger for PostgresPurchaseLedger {
    async fn insert(&self, purchase: &Purchase) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO course_purchases (
                id, course_id, user_id, external_session_id, amount_minor, currency,
                status, enrollment_reconciled_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(*purchase.id.as_uuid())
        .bind(*purchase.course_id.as_uuid())
        .bind(purchase.user_id.as_ref().map(UserId::as_str))
        .bind(purchase.session_id.as_str())
        .bind(purchase.amount.amount_minor())
        .bind(purchase.amount.currency().as_str())
        .bind(purchase.status.as_str())
        .bind(purchase.enrollment_reconciled_at.as_ref().map(|t| *t.as_datetime()))
        .bind(*purchase.created_at.as_datetime())
        .bind(*purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(SESSION_UNIQUE_CONSTRAINT) {
                    return DomainError::new(
                        ErrorCode::DuplicateSession,
                        format!("Checkout session already recorded: {}", purchase.session_id),
                    );
                }
            }
            database_error("Failed to insert purchase", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM course_purchases WHERE id = $1",
            PURCHASE_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn find_by_session_id(
        &self,
        session_id: &CheckoutSessionId,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM course_purchases WHERE external_session_id = $1",
            PURCHASE_COLUMNS
        ))
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load purchase by session", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn complete_if_pending(
        &self,
        session_id: &CheckoutSessionId,
        owner: &UserId,
        amount: &Money,
        at: Timestamp,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            UPDATE course_purchases SET
                status = 'completed',
                user_id = $2,
                amount_minor = $3,
                currency = $4,
                updated_at = $5
            WHERE external_session_id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(session_id.as_str())
        .bind(owner.as_str())
        .bind(amount.amount_minor())
        .bind(amount.currency().as_str())
        .bind(*at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to complete purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn fail_if_pending(
        &self,
        session_id: &CheckoutSessionId,
        at: Timestamp,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            UPDATE course_purchases SET
                status = 'failed',
                updated_at = $2
            WHERE external_session_id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(session_id.as_str())
        .bind(*at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fail purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn mark_reconciled(&self, id: &PurchaseId, at: Timestamp) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE course_purchases SET
                updated_at = CASE WHEN enrollment_reconciled_at IS NULL THEN $2 ELSE updated_at END,
                enrollment_reconciled_at = COALESCE(enrollment_reconciled_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .bind(*at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to stamp reconciliation", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PurchaseNotFound,
                format!("Purchase not found: {}", id),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PurchaseRow {
        let now = Utc::now();
        PurchaseRow {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            user_id: Some("learner-1".to_string()),
            external_session_id: "cs_test_1".to_string(),
            amount_minor: 500,
            currency: "inr".to_string(),
            status: "completed".to_string(),
            enrollment_reconciled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_purchase() {
        let purchase = Purchase::try_from(row()).unwrap();

        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(purchase.amount.amount_minor(), 500);
        assert_eq!(purchase.session_id.as_str(), "cs_test_1");
        assert!(purchase.needs_reconciliation());
    }

    #[test]
    fn row_without_owner_converts_to_ownerless_purchase() {
        let mut r = row();
        r.user_id = None;
        r.status = "pending".to_string();

        let purchase = Purchase::try_from(r).unwrap();

        assert!(purchase.user_id.is_none());
    }

    #[test]
    fn unknown_status_is_database_error() {
        let mut r = row();
        r.status = "refunded".to_string();

        let err = Purchase::try_from(r).unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("status"));
    }

    #[test]
    fn negative_amount_is_database_error() {
        let mut r = row();
        r.amount_minor = -5;

        assert!(Purchase::try_from(r).is_err());
    }
}
