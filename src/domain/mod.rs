//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, money, timestamps, errors, auth)
//! - `purchase` - Purchase lifecycle, payment events and webhook verification

pub mod foundation;
pub mod purchase;
