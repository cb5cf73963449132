//! Enrollment ports.
//!
//! Every write here is a set-union or a flag set. Re-applying any of them
//! leaves the stored state unchanged, which is what makes enrollment
//! reconciliation safe to retry.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{CourseId, DomainError, LectureId, UserId};

/// Enrolled-course and enrolled-student sets.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Add the course to the learner's enrolled-course set.
    ///
    /// Returns `true` when the course was not already present.
    async fn add_enrolled_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, DomainError>;

    /// Add the learner to the course's enrolled-student set.
    ///
    /// Returns `true` when the learner was not already present.
    async fn add_enrolled_student(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<bool, DomainError>;
}

/// Per-lecture preview flags.
#[async_trait]
pub trait LectureVisibility: Send + Sync {
    /// Flag the given lectures of a course as freely previewable.
    ///
    /// Returns how many lectures were newly flagged. An empty slice is a no-op.
    async fn mark_free_preview(
        &self,
        course_id: &CourseId,
        lecture_ids: &[LectureId],
    ) -> Result<u64, DomainError>;
}

/// Public profile fields shown in administrative listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnerSummary {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

/// Lookup of learner profiles.
#[async_trait]
pub trait LearnerDirectory: Send + Sync {
    async fn find_learner(&self, id: &UserId) -> Result<Option<LearnerSummary>, DomainError>;
}
