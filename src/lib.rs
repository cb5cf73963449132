//! Course Purchase - checkout initiation and payment webhook reconciliation
//!
//! Opens provider checkout sessions for course purchases, records them in a
//! purchase ledger, and turns verified payment events into enrollment.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
