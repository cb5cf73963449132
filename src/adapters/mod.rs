//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Ledger, catalog, and enrollment tables
//! - `memory` - In-process implementations for tests and local runs
//! - `stripe` - Checkout session creation
//! - `auth` - Learner token validation
//! - `http` - REST API and webhook endpoint

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
