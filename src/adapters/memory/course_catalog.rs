//! In-memory course catalog with lecture preview flags.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{CourseId, DomainError, LectureId};
use crate::ports::{Course, CourseCatalog, LectureVisibility};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCourseCatalog {
    courses: Arc<RwLock<HashMap<CourseId, Course>>>,
    free_preview: Arc<RwLock<HashSet<LectureId>>>,
    preview_unavailable: Arc<RwLock<bool>>,
}

impl InMemoryCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_course(&self, course: Course) {
        self.courses.write().await.insert(course.id, course);
    }

    pub async fn remove_course(&self, id: &CourseId) {
        self.courses.write().await.remove(id);
    }

    pub async fn is_free_preview(&self, lecture_id: &LectureId) -> bool {
        self.free_preview.read().await.contains(lecture_id)
    }

    /// Makes `mark_free_preview` fail until switched back.
    pub async fn set_preview_unavailable(&self, unavailable: bool) {
        *self.preview_unavailable.write().await = unavailable;
    }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, DomainError> {
        Ok(self.courses.read().await.get(id).cloned())
    }
}

#[async_trait]
impl LectureVisibility for InMemoryCourseCatalog {
    async fn mark_free_preview(
        &self,
        course_id: &CourseId,
        lecture_ids: &[LectureId],
    ) -> Result<u64, DomainError> {
        if *self.preview_unavailable.read().await {
            return Err(DomainError::database("lecture store unavailable"));
        }

        let courses = self.courses.read().await;
        let owned: HashSet<&LectureId> = courses
            .get(course_id)
            .map(|c| c.lecture_ids.iter().collect())
            .unwrap_or_default();

        let mut flags = self.free_preview.write().await;
        let marked = lecture_ids
            .iter()
            .filter(|id| owned.contains(id))
            .filter(|id| flags.insert(**id))
            .count();
        Ok(marked as u64)
    }
}
