//! Trait interfaces for the Tessera ledger.
//!
//! These traits define the contracts between crates and external
//! collaborators:
//! - [`CellSource`] — live-cell lookup (an indexer or node client implements)
//! - [`Signer`] — witness production for assembled transactions
//! - [`TxBroadcaster`] — submission of signed transactions

use crate::error::{BroadcastError, SignError, SourceError};
use crate::types::{Cell, Hash256, Script, SigningEntry, Transaction};

/// A lazy, finite sequence of candidate cells from a [`CellSource`].
///
/// Backed by paginated queries in production, so iteration may block between
/// yielded cells. Not restartable mid-iteration; a fresh `collect` call
/// restarts from the beginning.
pub type CellIter<'a> = Box<dyn Iterator<Item = Result<Cell, SourceError>> + 'a>;

/// Live-cell lookup by lock script and type filter.
///
/// Implemented by an indexer or node client; consumed by the selection
/// engine. Results are in ledger discovery order, deterministic for a fixed
/// ledger state. The engine consumes the sequence strictly sequentially and
/// never prefetches.
pub trait CellSource {
    /// Collect live cells owned by `lock`.
    ///
    /// With `type_filter = Some(script)` only cells whose type script equals
    /// `script` are yielded; with `None` only plain cells (no type script).
    fn collect(&self, lock: &Script, type_filter: Option<&Script>)
    -> Result<CellIter<'_>, SourceError>;
}

/// Witness production for an assembled transaction.
///
/// One witness per signing entry (distinct input lock-script group).
/// Implemented externally; key management is out of scope for this
/// workspace.
pub trait Signer: Send + Sync {
    /// Produce a signed transaction with witnesses filled per group.
    fn sign(&self, tx: &Transaction, entries: &[SigningEntry])
    -> Result<Transaction, SignError>;
}

/// Submission of a signed transaction to the network.
pub trait TxBroadcaster: Send + Sync {
    /// Broadcast a signed transaction; returns its transaction id.
    fn send(&self, tx: &Transaction) -> Result<Hash256, BroadcastError>;
}
