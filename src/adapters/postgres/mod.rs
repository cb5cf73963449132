//! PostgreSQL adapters - Database implementations for ledger and
//! collaborator ports.
//!
//! - `PostgresPurchaseLedger` - Purchase records with single-statement conditional transitions
//! - `PostgresPurchaseReader` - Read-optimized purchase queries
//! - `PostgresCourseCatalog` - Courses, lectures, and lecture preview flags
//! - `PostgresEnrollmentStore` - Enrollment sets and learner profiles

mod course_catalog;
mod enrollment_store;
mod purchase_ledger;
mod purchase_reader;

pub use course_catalog::PostgresCourseCatalog;
pub use enrollment_store::PostgresEnrollmentStore;
pub use purchase_ledger::PostgresPurchaseLedger;
pub use purchase_reader::PostgresPurchaseReader;

use crate::domain::foundation::{DomainError, ErrorCode};

fn database_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}
