//! Enrollment reconciliation vocabulary.
//!
//! A completed purchase is fully reconciled once all three set-union steps
//! have succeeded at least once. Each step is idempotent, so a partially
//! reconciled purchase is repaired by running every step again.

use std::fmt;

use serde::Serialize;

/// One side effect of a completed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStep {
    /// Add the course to the learner's enrolled-course set.
    LearnerCourses,
    /// Add the learner to the course's enrolled-student set.
    CourseStudents,
    /// Mark every lecture of the course as freely previewable.
    LecturePreview,
}

impl EnrollmentStep {
    pub const ALL: [EnrollmentStep; 3] = [
        EnrollmentStep::LearnerCourses,
        EnrollmentStep::CourseStudents,
        EnrollmentStep::LecturePreview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStep::LearnerCourses => "learner_courses",
            EnrollmentStep::CourseStudents => "course_students",
            EnrollmentStep::LecturePreview => "lecture_preview",
        }
    }
}

impl fmt::Display for EnrollmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step that did not succeed on this attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: EnrollmentStep,
    pub reason: String,
}

impl StepFailure {
    pub fn new(step: EnrollmentStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.reason)
    }
}

/// Outcome of a successful reconciliation pass.
///
/// All fields describe state that changed on this pass; a replayed pass
/// reports `false`/`0` everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub course_added_to_learner: bool,
    pub learner_added_to_course: bool,
    /// Lectures flagged as previewable on this pass.
    pub lectures_marked: u64,
}

impl ReconciliationReport {
    /// True when the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        !self.course_added_to_learner && !self.learner_added_to_course && self.lectures_marked == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failure_displays_step_and_reason() {
        let failure = StepFailure::new(EnrollmentStep::LearnerCourses, "connection reset");
        assert_eq!(failure.to_string(), "learner_courses: connection reset");
    }

    #[test]
    fn default_report_is_noop() {
        assert!(ReconciliationReport::default().is_noop());
        let report = ReconciliationReport {
            lectures_marked: 2,
            ..Default::default()
        };
        assert!(!report.is_noop());
    }
}
