//! PostgreSQL enrollment sets and learner directory.
//!
//! Both enrollment sets are join tables keyed on the pair, so a repeated
//! add is absorbed by `ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{CourseId, DomainError, ErrorCode, UserId};
use crate::ports::{EnrollmentStore, LearnerDirectory, LearnerSummary};

use super::database_error;

pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LearnerRow {
    id: String,
    display_name: String,
    email: String,
}

impl TryFrom<LearnerRow> for LearnerSummary {
    type Error = DomainError;

    fn try_from(row: LearnerRow) -> Result<Self, Self::Error> {
        let id = UserId::new(row.id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid learner id: {}", e))
        })?;
        Ok(LearnerSummary {
            id,
            display_name: row.display_name,
            email: row.email,
        })
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn add_enrolled_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO learner_enrolled_courses (learner_id, course_id, enrolled_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (learner_id, course_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_str())
        .bind(*course_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to add enrolled course", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_enrolled_student(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO course_enrolled_students (course_id, learner_id, enrolled_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (course_id, learner_id) DO NOTHING
            "#,
        )
        .bind(*course_id.as_uuid())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to add enrolled student", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LearnerDirectory for PostgresEnrollmentStore {
    async fn find_learner(&self, id: &UserId) -> Result<Option<LearnerSummary>, DomainError> {
        let row: Option<LearnerRow> =
            sqlx::query_as("SELECT id, display_name, email FROM learners WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("Failed to load learner", e))?;

        row.map(LearnerSummary::try_from).transpose()
    }
}
