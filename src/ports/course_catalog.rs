//! Course catalog port.
//!
//! Courses and lectures are owned by the catalog; this service only reads
//! the fields it needs to price a checkout and to reconcile enrollment.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{CourseId, DomainError, LectureId, Money};

/// The catalog's view of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    /// Current price in minor units.
    pub price: Money,
    pub lecture_ids: Vec<LectureId>,
}

/// Lookup of courses by id.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// Returns `None` when the course does not exist.
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, DomainError>;
}
