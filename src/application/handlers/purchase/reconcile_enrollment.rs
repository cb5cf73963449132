//! ReconcileEnrollmentHandler - Applies the enrollment side effects of a
//! completed purchase.
//!
//! The three steps target disjoint stores and are each a set-union, so they
//! run concurrently and a failed attempt is repaired by running all of them
//! again. Every failure is collected; no step short-circuits another.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{CourseId, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{
    EnrollmentStep, PurchaseError, ReconciliationReport, StepFailure,
};
use crate::ports::{CourseCatalog, EnrollmentStore, LectureVisibility, PurchaseLedger};

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};

/// Command to reconcile enrollment for one completed purchase.
#[derive(Debug, Clone)]
pub struct ReconcileEnrollmentCommand {
    pub purchase_id: PurchaseId,
    pub user_id: UserId,
    pub course_id: CourseId,
}

/// Handler for enrollment reconciliation.
#[derive(Clone)]
pub struct ReconcileEnrollmentHandler {
    catalog: Arc<dyn CourseCatalog>,
    enrollment: Arc<dyn EnrollmentStore>,
    visibility: Arc<dyn LectureVisibility>,
    ledger: Arc<dyn PurchaseLedger>,
    operation_timeout: Duration,
}

impl ReconcileEnrollmentHandler {
    pub fn new(
        catalog: Arc<dyn CourseCatalog>,
        enrollment: Arc<dyn EnrollmentStore>,
        visibility: Arc<dyn LectureVisibility>,
        ledger: Arc<dyn PurchaseLedger>,
    ) -> Self {
        Self {
            catalog,
            enrollment,
            visibility,
            ledger,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: ReconcileEnrollmentCommand,
    ) -> Result<ReconciliationReport, PurchaseError> {
        let (learner_courses, course_students, lecture_preview) = futures::join!(
            self.add_course_to_learner(&cmd),
            self.add_learner_to_course(&cmd),
            self.open_lecture_previews(&cmd),
        );

        let mut report = ReconciliationReport::default();
        let mut failures = Vec::new();

        match learner_courses {
            Ok(added) => report.course_added_to_learner = added,
            Err(e) => failures.push(StepFailure::new(EnrollmentStep::LearnerCourses, e.to_string())),
        }
        match course_students {
            Ok(added) => report.learner_added_to_course = added,
            Err(e) => failures.push(StepFailure::new(EnrollmentStep::CourseStudents, e.to_string())),
        }
        match lecture_preview {
            Ok(marked) => report.lectures_marked = marked,
            Err(e) => failures.push(StepFailure::new(EnrollmentStep::LecturePreview, e.to_string())),
        }

        if !failures.is_empty() {
            for failure in &failures {
                tracing::error!(
                    purchase_id = %cmd.purchase_id,
                    user_id = %cmd.user_id,
                    course_id = %cmd.course_id,
                    step = %failure.step,
                    reason = %failure.reason,
                    "Enrollment step failed"
                );
            }
            return Err(PurchaseError::EnrollmentIncomplete {
                purchase_id: cmd.purchase_id,
                failures,
            });
        }

        bounded(
            self.operation_timeout,
            "reconciliation stamp",
            self.ledger.mark_reconciled(&cmd.purchase_id, Timestamp::now()),
        )
        .await?;

        tracing::info!(
            purchase_id = %cmd.purchase_id,
            user_id = %cmd.user_id,
            course_id = %cmd.course_id,
            lectures_marked = report.lectures_marked,
            noop = report.is_noop(),
            "Enrollment reconciled"
        );
        Ok(report)
    }

    async fn add_course_to_learner(
        &self,
        cmd: &ReconcileEnrollmentCommand,
    ) -> Result<bool, PurchaseError> {
        bounded(
            self.operation_timeout,
            "learner course enrollment",
            self.enrollment.add_enrolled_course(&cmd.user_id, &cmd.course_id),
        )
        .await
    }

    async fn add_learner_to_course(
        &self,
        cmd: &ReconcileEnrollmentCommand,
    ) -> Result<bool, PurchaseError> {
        bounded(
            self.operation_timeout,
            "course student enrollment",
            self.enrollment.add_enrolled_student(&cmd.course_id, &cmd.user_id),
        )
        .await
    }

    /// A course that no longer resolves fails this step; an empty lecture
    /// list succeeds without touching the visibility store.
    async fn open_lecture_previews(
        &self,
        cmd: &ReconcileEnrollmentCommand,
    ) -> Result<u64, PurchaseError> {
        let course = bounded(
            self.operation_timeout,
            "course lookup",
            self.catalog.find_course(&cmd.course_id),
        )
        .await?
        .ok_or(PurchaseError::CourseNotFound(cmd.course_id))?;

        if course.lecture_ids.is_empty() {
            return Ok(0);
        }

        bounded(
            self.operation_timeout,
            "lecture preview update",
            self.visibility.mark_free_preview(&course.id, &course.lecture_ids),
        )
        .await
    }
}
