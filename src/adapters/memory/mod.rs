//! In-memory adapters.
//!
//! Process-local implementations of the ledger and collaborator ports,
//! used by the test suites and for running the service without a database.
//! State lives behind `tokio::sync::RwLock`, so every conditional
//! transition runs under a single write guard.

mod course_catalog;
mod enrollment_store;
mod purchase_ledger;

pub use course_catalog::InMemoryCourseCatalog;
pub use enrollment_store::InMemoryEnrollmentStore;
pub use purchase_ledger::InMemoryPurchaseLedger;
