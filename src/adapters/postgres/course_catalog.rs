//! PostgreSQL course catalog and lecture visibility.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CourseId, Currency, DomainError, ErrorCode, LectureId, Money};
use crate::ports::{Course, CourseCatalog, LectureVisibility};

use super::database_error;

/// Reads `courses` and `lectures`, and flips lecture preview flags.
pub struct PostgresCourseCatalog {
    pool: PgPool,
}

impl PostgresCourseCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    thumbnail_url: Option<String>,
    price_minor: i64,
    currency: String,
}

fn course_from_row(row: CourseRow, lecture_ids: Vec<Uuid>) -> Result<Course, DomainError> {
    let price = Currency::new(&row.currency)
        .and_then(|currency| Money::new(row.price_minor, currency))
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid price on course {}: {}", row.id, e),
            )
        })?;

    Ok(Course {
        id: CourseId::from_uuid(row.id),
        title: row.title,
        thumbnail_url: row.thumbnail_url,
        price,
        lecture_ids: lecture_ids.into_iter().map(LectureId::from_uuid).collect(),
    })
}

#[async_trait]
impl CourseCatalog for PostgresCourseCatalog {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, DomainError> {
        let row: Option<CourseRow> = sqlx::query_as(
            r#"
            SELECT id, title, thumbnail_url, price_minor, currency
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load course", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lecture_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM lectures WHERE course_id = $1 ORDER BY position, id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load lectures", e))?;

        course_from_row(row, lecture_ids).map(Some)
    }
}

#[async_trait]
impl LectureVisibility for PostgresCourseCatalog {
    async fn mark_free_preview(
        &self,
        course_id: &CourseId,
        lecture_ids: &[LectureId],
    ) -> Result<u64, DomainError> {
        if lecture_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = lecture_ids.iter().map(|id| *id.as_uuid()).collect();
        let result = sqlx::query(
            r#"
            UPDATE lectures SET is_preview_free = TRUE
            WHERE course_id = $1 AND id = ANY($2) AND NOT is_preview_free
            "#,
        )
        .bind(*course_id.as_uuid())
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to mark lecture previews", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(currency: &str, price_minor: i64) -> CourseRow {
        CourseRow {
            id: Uuid::new_v4(),
            title: "Rust for Builders".to_string(),
            thumbnail_url: None,
            price_minor,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn course_row_keeps_lecture_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let course = course_from_row(row("inr", 49900), vec![first, second]).unwrap();

        assert_eq!(course.price.amount_minor(), 49900);
        assert_eq!(
            course.lecture_ids,
            vec![LectureId::from_uuid(first), LectureId::from_uuid(second)]
        );
    }

    #[test]
    fn course_row_with_bad_currency_is_database_error() {
        let err = course_from_row(row("", 100), vec![]).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
