//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Ledger Ports
//!
//! - `PurchaseLedger` - Durable purchase records with atomic conditional transitions
//! - `PurchaseReader` - Read-only purchase projections
//!
//! ## Collaborator Ports
//!
//! - `CourseCatalog` - Course lookup (price, title, lectures)
//! - `EnrollmentStore` - Enrolled-course / enrolled-student sets
//! - `LectureVisibility` - Lecture free-preview flags
//! - `LearnerDirectory` - Learner profile summaries for admin listings
//!
//! ## Provider and Auth Ports
//!
//! - `PaymentProvider` - Hosted checkout sessions
//! - `SessionValidator` - Access token validation

mod course_catalog;
mod enrollment_store;
mod payment_provider;
mod purchase_ledger;
mod purchase_reader;
mod session_validator;

pub use course_catalog::{Course, CourseCatalog};
pub use enrollment_store::{EnrollmentStore, LearnerDirectory, LearnerSummary, LectureVisibility};
pub use payment_provider::{
    CheckoutLineItem, CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode,
    PaymentProvider,
};
pub use purchase_ledger::PurchaseLedger;
pub use purchase_reader::PurchaseReader;
pub use session_validator::SessionValidator;
