//! Shared types and models for the pharmacy sales and inventory backend
//!
//! This crate holds the domain model, the request schemas validated at the
//! API boundary, and the pure stock-ledger and report arithmetic. It performs
//! no I/O; the backend feeds it rows and persists what it returns.

pub mod ledger;
pub mod models;
pub mod reporting;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use reporting::*;
pub use types::*;
pub use validation::*;
