//! PostgreSQL implementation of PurchaseReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{CourseId, DomainError, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::ports::PurchaseReader;

use super::database_error;
use super::purchase_ledger::{rows_to_purchases, PurchaseRow, PURCHASE_COLUMNS};

/// PostgreSQL implementation of the PurchaseReader port.
pub struct PostgresPurchaseReader {
    pool: PgPool,
}

impl PostgresPurchaseReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseReader for PostgresPurchaseReader {
    async fn list_by_user(
        &self,
        user_id: &UserId,
        status: Option<PurchaseStatus>,
    ) -> Result<Vec<Purchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM course_purchases
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list purchases for user", e))?;

        rows_to_purchases(rows)
    }

    async fn list_by_user_and_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Purchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM course_purchases
            WHERE user_id = $1 AND course_id = $2
            ORDER BY created_at DESC
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(*course_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list purchases for course", e))?;

        rows_to_purchases(rows)
    }

    async fn list_all(&self) -> Result<Vec<Purchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM course_purchases ORDER BY created_at DESC",
            PURCHASE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list purchases", e))?;

        rows_to_purchases(rows)
    }

    async fn list_unreconciled(&self, limit: u32) -> Result<Vec<Purchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM course_purchases
            WHERE status = 'completed' AND enrollment_reconciled_at IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list unreconciled purchases", e))?;

        rows_to_purchases(rows)
    }
}
