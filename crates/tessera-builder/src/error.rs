//! Builder error types.

use tessera_core::error::{SourceError, TransactionError};
use thiserror::Error;

/// Errors that can occur while assembling a transaction.
///
/// All are terminal for the current call: no partial skeleton is ever
/// returned, and the engine performs no internal retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Funding sources exhausted, or change cannot meet its minimum capacity.
    #[error("insufficient capacity: {missing} additional units required")]
    InsufficientCapacity {
        /// Additional capacity units required, in smallest units.
        missing: u64,
    },

    /// Token amount need unmet after exhausting all funding sources.
    #[error("insufficient amount: {missing} additional token units required")]
    InsufficientAmount {
        /// Additional token units required.
        missing: u128,
    },

    /// A collector returned no cells at all for a required source.
    #[error("no eligible cells: {0}")]
    NoEligibleCells(String),

    /// Empty funding-source list, or a strategy used outside its contract.
    #[error("invalid funding configuration: {0}")]
    InvalidFundingConfiguration(String),

    /// An amount-bearing operation was requested without a type descriptor.
    #[error("missing type script: {0}")]
    MissingTypeScript(String),

    /// Cell-source failure surfaced from the collector.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Serialization or arithmetic failure from tessera-core.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
