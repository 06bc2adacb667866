//! # tessera-builder — unsigned transaction assembly.
//!
//! Builds unsigned transactions for the Tessera ledger: collects input cells
//! from prioritized funding sources, balances capacity and token amounts,
//! materializes change, and deducts an estimated fee. The finished
//! [`TransactionSkeleton`] is handed to an external signer.
//!
//! # Modules
//!
//! - [`error`] — `BuildError` enum
//! - [`funding`] — funding-source strategies and priority ordering
//! - [`skeleton`] — the append-only transaction build state
//! - [`selection`] — the coin-selection engine
//! - [`change`] — change-output materialization
//! - [`fee`] — two-pass fee estimation
//! - [`ops`] — issue / transfer / merge / burn operation families

pub mod change;
pub mod error;
pub mod fee;
pub mod funding;
pub mod ops;
pub mod selection;
pub mod skeleton;

// Re-exports for convenient access
pub use change::{ChangeTarget, materialize_change};
pub use error::BuildError;
pub use fee::{DEFAULT_FEE_RATE, FEE_BUDGET, estimate_fee, take_fee};
pub use funding::{FundingSource, Since, TipContext};
pub use ops::{IssueTarget, Receiver, burn, issue, merge_cells, transfer};
pub use selection::{ChangeAccumulator, collect_all, select_and_attach};
pub use skeleton::{FixedField, TransactionSkeleton};
