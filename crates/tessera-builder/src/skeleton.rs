//! The mutable, append-only transaction build state.
//!
//! A [`TransactionSkeleton`] is created empty, populated incrementally by the
//! selection engine and the change materializer, and finally converted into a
//! [`Transaction`] for the fee pass and the external signer. Indices are
//! stable: entries are only appended, never reordered, and the fixed-entry
//! set guards outputs that later passes must not replace.

use std::collections::HashSet;

use tessera_core::types::{
    Cell, CellDep, CellInput, CellOutput, OutPoint, SigningEntry, Transaction,
};

/// Protocol version stamped on assembled transactions.
pub const TX_VERSION: u32 = 1;

/// Field addressed by a fixed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FixedField {
    Inputs,
    Outputs,
    OutputsData,
    Witnesses,
}

/// Accumulating build state for one unsigned transaction.
///
/// Witnesses are index-aligned with inputs, `outputs_data` with outputs.
/// The consumed-outpoint set makes input registration idempotent against
/// collectors that re-yield already-consumed cells.
#[derive(Clone, Debug, Default)]
pub struct TransactionSkeleton {
    /// Inputs consuming previous outputs.
    pub inputs: Vec<CellInput>,
    /// New cells created by this transaction.
    pub outputs: Vec<CellOutput>,
    /// Data payloads, one per output.
    pub outputs_data: Vec<Vec<u8>>,
    /// Dependency cells, deduplicated.
    pub cell_deps: Vec<CellDep>,
    /// Witnesses, one per input. Placeholder-empty until signed.
    pub witnesses: Vec<Vec<u8>>,
    input_cells: Vec<Cell>,
    consumed: HashSet<OutPoint>,
    fixed: HashSet<(FixedField, usize)>,
    signing: Vec<SigningEntry>,
}

impl TransactionSkeleton {
    /// Create an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cell with this outpoint has already been registered as an
    /// input.
    pub fn contains_input(&self, out_point: &OutPoint) -> bool {
        self.consumed.contains(out_point)
    }

    /// Register a consumed cell: appends the input, records its outpoint,
    /// keeps the cell for balance/signing-group computation, and appends an
    /// empty placeholder witness. Returns the input index.
    pub fn add_input(&mut self, cell: Cell, since: u64) -> usize {
        let index = self.inputs.len();
        self.consumed.insert(cell.out_point.clone());
        self.inputs.push(CellInput {
            previous_output: cell.out_point.clone(),
            since,
        });
        self.witnesses.push(Vec::new());
        self.input_cells.push(cell);
        index
    }

    /// Append an output with its data payload. Returns the output index.
    pub fn add_output(&mut self, output: CellOutput, data: Vec<u8>) -> usize {
        let index = self.outputs.len();
        self.outputs.push(output);
        self.outputs_data.push(data);
        index
    }

    /// Append a dependency cell unless already present. Returns whether it
    /// was added.
    pub fn add_cell_dep(&mut self, dep: CellDep) -> bool {
        if self.cell_deps.contains(&dep) {
            return false;
        }
        self.cell_deps.push(dep);
        true
    }

    /// Mark a (field, index) entry as fixed: later passes must not replace
    /// the referenced value.
    pub fn fix(&mut self, field: FixedField, index: usize) {
        self.fixed.insert((field, index));
    }

    /// Whether a (field, index) entry is fixed.
    pub fn is_fixed(&self, field: FixedField, index: usize) -> bool {
        self.fixed.contains(&(field, index))
    }

    /// The consumed cells backing the inputs, index-aligned.
    pub fn input_cells(&self) -> &[Cell] {
        &self.input_cells
    }

    /// Sum of consumed-cell capacities. Returns None on overflow.
    pub fn input_capacity_total(&self) -> Option<u64> {
        self.input_cells
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.output.capacity))
    }

    /// Sum of output capacities. Returns None on overflow.
    pub fn output_capacity_total(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.capacity))
    }

    /// Compute signing entries: one per distinct input lock script, in
    /// first-seen input order. Called once after assembly.
    pub fn compute_signing_entries(&mut self) {
        let mut entries: Vec<SigningEntry> = Vec::new();
        for (i, cell) in self.input_cells.iter().enumerate() {
            let hash = cell.output.lock.hash();
            match entries.iter_mut().find(|e| e.script_hash == hash) {
                Some(entry) => entry.input_indices.push(i),
                None => entries.push(SigningEntry {
                    script_hash: hash,
                    input_indices: vec![i],
                }),
            }
        }
        self.signing = entries;
    }

    /// Signing entries computed by [`compute_signing_entries`](Self::compute_signing_entries).
    pub fn signing_entries(&self) -> &[SigningEntry] {
        &self.signing
    }

    /// Snapshot the current state as a serializable [`Transaction`].
    pub fn build_transaction(&self) -> Transaction {
        Transaction {
            version: TX_VERSION,
            cell_deps: self.cell_deps.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            outputs_data: self.outputs_data.clone(),
            witnesses: self.witnesses.clone(),
        }
    }
}
