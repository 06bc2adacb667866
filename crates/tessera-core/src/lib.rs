//! # tessera-core
//! Foundation types and traits for the Tessera ledger.

pub mod amount;
pub mod capacity;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
