//! In-memory enrollment sets and learner directory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{CourseId, DomainError, UserId};
use crate::domain::purchase::EnrollmentStep;
use crate::ports::{EnrollmentStore, LearnerDirectory, LearnerSummary};

#[derive(Debug, Clone, Default)]
pub struct InMemoryEnrollmentStore {
    learner_courses: Arc<RwLock<HashMap<UserId, HashSet<CourseId>>>>,
    course_students: Arc<RwLock<HashMap<CourseId, HashSet<UserId>>>>,
    learners: Arc<RwLock<HashMap<UserId, LearnerSummary>>>,
    failing: Arc<RwLock<HashSet<EnrollmentStep>>>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_learner(&self, learner: LearnerSummary) {
        self.learners.write().await.insert(learner.id.clone(), learner);
    }

    /// Courses in the learner's enrolled-course set.
    pub async fn enrolled_courses(&self, user_id: &UserId) -> HashSet<CourseId> {
        self.learner_courses
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Learners in the course's enrolled-student set.
    pub async fn enrolled_students(&self, course_id: &CourseId) -> HashSet<UserId> {
        self.course_students
            .read()
            .await
            .get(course_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes the write behind `step` fail until [`Self::restore_step`].
    pub async fn fail_step(&self, step: EnrollmentStep) {
        self.failing.write().await.insert(step);
    }

    pub async fn restore_step(&self, step: EnrollmentStep) {
        self.failing.write().await.remove(&step);
    }

    async fn check(&self, step: EnrollmentStep) -> Result<(), DomainError> {
        if self.failing.read().await.contains(&step) {
            return Err(DomainError::database(format!("{} store unavailable", step)));
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn add_enrolled_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, DomainError> {
        self.check(EnrollmentStep::LearnerCourses).await?;
        Ok(self
            .learner_courses
            .write()
            .await
            .entry(user_id.clone())
            .or_default()
            .insert(*course_id))
    }

    async fn add_enrolled_student(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        self.check(EnrollmentStep::CourseStudents).await?;
        Ok(self
            .course_students
            .write()
            .await
            .entry(*course_id)
            .or_default()
            .insert(user_id.clone()))
    }
}

#[async_trait]
impl LearnerDirectory for InMemoryEnrollmentStore {
    async fn find_learner(&self, id: &UserId) -> Result<Option<LearnerSummary>, DomainError> {
        Ok(self.learners.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enrollment_is_set_union() {
        let store = InMemoryEnrollmentStore::new();
        let user = UserId::new("learner-1").unwrap();
        let course = CourseId::new();

        assert!(store.add_enrolled_course(&user, &course).await.unwrap());
        assert!(!store.add_enrolled_course(&user, &course).await.unwrap());
        assert!(store.add_enrolled_student(&course, &user).await.unwrap());

        assert_eq!(store.enrolled_courses(&user).await.len(), 1);
        assert!(store.enrolled_students(&course).await.contains(&user));
    }

    #[tokio::test]
    async fn failing_step_only_affects_its_write() {
        let store = InMemoryEnrollmentStore::new();
        let user = UserId::new("learner-1").unwrap();
        let course = CourseId::new();
        store.fail_step(EnrollmentStep::CourseStudents).await;

        assert!(store.add_enrolled_course(&user, &course).await.is_ok());
        assert!(store.add_enrolled_student(&course, &user).await.is_err());

        store.restore_step(EnrollmentStep::CourseStudents).await;
        assert!(store.add_enrolled_student(&course, &user).await.is_ok());
    }
}
