//! Purchase error taxonomy.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidArgument | 400 |
//! | CourseNotFound / PurchaseNotFound | 404 |
//! | Unauthenticated | 401 |
//! | Forbidden | 403 |
//! | OrphanEvent | 404 |
//! | UnresolvableOwner | 500 |
//! | EnrollmentIncomplete | 500 |
//! | Upstream | 500 |
//!
//! The webhook route overrides a few of these; see the HTTP adapter.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{
    CheckoutSessionId, CourseId, DomainError, ErrorCode, PurchaseId, ValidationError,
};

use super::enrollment::StepFailure;
use super::webhook_errors::WebhookError;

/// Errors surfaced by purchase operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// Malformed input; nothing was read or written.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("Purchase not found: {0}")]
    PurchaseNotFound(PurchaseId),

    /// Caller identity or webhook signature could not be established.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Insufficient permissions")]
    Forbidden,

    /// A verified event names a session this service never created.
    #[error("No purchase for checkout session {session_id}")]
    OrphanEvent { session_id: CheckoutSessionId },

    /// Neither the record nor the event metadata names the buyer.
    #[error("Cannot determine purchasing user for checkout session {session_id}")]
    UnresolvableOwner { session_id: CheckoutSessionId },

    /// The purchase is completed but some enrollment steps failed.
    #[error("Enrollment incomplete for purchase {purchase_id}: {}", join_failures(.failures))]
    EnrollmentIncomplete {
        purchase_id: PurchaseId,
        failures: Vec<StepFailure>,
    },

    /// A collaborator failed or timed out.
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

fn join_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PurchaseError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PurchaseError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            PurchaseError::CourseNotFound(_) => "COURSE_NOT_FOUND",
            PurchaseError::PurchaseNotFound(_) => "PURCHASE_NOT_FOUND",
            PurchaseError::Unauthenticated(_) => "UNAUTHENTICATED",
            PurchaseError::Forbidden => "FORBIDDEN",
            PurchaseError::OrphanEvent { .. } => "ORPHAN_EVENT",
            PurchaseError::UnresolvableOwner { .. } => "UNRESOLVABLE_OWNER",
            PurchaseError::EnrollmentIncomplete { .. } => "ENROLLMENT_INCOMPLETE",
            PurchaseError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }

    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PurchaseError::Upstream(_)
                | PurchaseError::EnrollmentIncomplete { .. }
                | PurchaseError::UnresolvableOwner { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PurchaseError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            PurchaseError::CourseNotFound(_)
            | PurchaseError::PurchaseNotFound(_)
            | PurchaseError::OrphanEvent { .. } => StatusCode::NOT_FOUND,
            PurchaseError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            PurchaseError::Forbidden => StatusCode::FORBIDDEN,
            PurchaseError::UnresolvableOwner { .. }
            | PurchaseError::EnrollmentIncomplete { .. }
            | PurchaseError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for PurchaseError {
    fn from(err: ValidationError) -> Self {
        PurchaseError::InvalidArgument {
            field: err.field().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<DomainError> for PurchaseError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => PurchaseError::InvalidArgument {
                field: err.details.get("field").cloned().unwrap_or_default(),
                reason: err.message,
            },
            _ => PurchaseError::Upstream(err.to_string()),
        }
    }
}

impl From<WebhookError> for PurchaseError {
    fn from(err: WebhookError) -> Self {
        PurchaseError::Unauthenticated(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purchase::EnrollmentStep;

    #[test]
    fn validation_error_becomes_invalid_argument() {
        let err: PurchaseError = ValidationError::invalid_format("course_id", "expected a UUID").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, PurchaseError::InvalidArgument { ref field, .. } if field == "course_id"));
    }

    #[test]
    fn database_error_becomes_retryable_upstream() {
        let err: PurchaseError = DomainError::database("connection reset").into();
        assert!(matches!(err, PurchaseError::Upstream(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn webhook_rejection_becomes_unauthenticated() {
        let err: PurchaseError = WebhookError::InvalidSignature.into();
        assert_eq!(err, PurchaseError::Unauthenticated("Invalid signature".to_string()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn enrollment_incomplete_lists_failed_steps() {
        let err = PurchaseError::EnrollmentIncomplete {
            purchase_id: PurchaseId::new(),
            failures: vec![
                StepFailure::new(EnrollmentStep::CourseStudents, "timed out"),
                StepFailure::new(EnrollmentStep::LecturePreview, "db down"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("course_students: timed out"));
        assert!(text.contains("lecture_preview: db down"));
        assert!(err.is_retryable());
    }

    #[test]
    fn not_found_variants_map_to_404() {
        let orphan = PurchaseError::OrphanEvent {
            session_id: CheckoutSessionId::new("cs_missing").unwrap(),
        };
        assert_eq!(orphan.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PurchaseError::CourseNotFound(CourseId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
