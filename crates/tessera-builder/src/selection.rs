//! The coin-selection engine.
//!
//! Accumulates input cells across ordered funding sources until the capacity
//! and token-amount needs are met, tracking leftover change as it goes.
//! Selection is strictly sequential: one source at a time, one collector
//! sequence at a time, one cell at a time, with no speculative prefetch
//! (over-collection directly causes unnecessary dust outputs).

use tessera_core::amount::pack_amount;
use tessera_core::capacity::minimal_capacity;
use tessera_core::constants::AMOUNT_BYTES;
use tessera_core::traits::CellSource;
use tessera_core::types::{Cell, CellOutput, Script};
use tracing::{debug, trace};

use crate::change::ChangeTarget;
use crate::error::BuildError;
use crate::funding::{FundingSource, TipContext, ordered};
use crate::skeleton::{FixedField, TransactionSkeleton};

/// Running totals during selection.
///
/// Invariant at successful loop exit: both needs are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeAccumulator {
    /// Capacity still to be covered by inputs, in smallest units.
    pub capacity_need: u64,
    /// Token amount still to be covered by inputs.
    pub amount_need: u128,
    /// Leftover capacity destined for change.
    pub change_capacity: u64,
    /// Leftover token amount destined for change.
    pub change_amount: u128,
}

impl ChangeAccumulator {
    /// Start accumulating toward the given needs.
    pub fn new(capacity_need: u64, amount_need: u128) -> Self {
        Self { capacity_need, amount_need, change_capacity: 0, change_amount: 0 }
    }

    /// Whether both needs have been fully covered.
    pub fn needs_met(&self) -> bool {
        self.capacity_need == 0 && self.amount_need == 0
    }
}

/// Minimum capacity of the cell the accumulated change will need.
fn change_minimal(change: &ChangeTarget, change_amount: u128) -> u64 {
    if change_amount > 0 {
        minimal_capacity(&change.lock, change.type_script.as_ref(), AMOUNT_BYTES)
    } else {
        minimal_capacity(&change.lock, None, 0)
    }
}

/// Whether the selection loop may stop: needs met, and the change is either
/// empty or large enough to be carried by its own cell.
fn selection_done(acc: &ChangeAccumulator, change: &ChangeTarget) -> bool {
    if !acc.needs_met() {
        return false;
    }
    if acc.change_capacity == 0 && acc.change_amount == 0 {
        return true;
    }
    acc.change_capacity >= change_minimal(change, acc.change_amount)
}

/// Collector expansion passes for one source: token-filtered first, then
/// explicitly plain. Self-paying sources are expanded with the type filter
/// only (merge-on-touch cells must already carry the right type).
fn passes<'a>(
    source: &FundingSource,
    type_filter: Option<&'a Script>,
) -> Vec<Option<&'a Script>> {
    match source {
        FundingSource::SelfPaying { .. } => vec![type_filter],
        _ if type_filter.is_some() => vec![type_filter, None],
        _ => vec![None],
    }
}

/// Consume one cell: register it as an input, deduct from the needs, and
/// route the leftover either to the accumulator or, for a non-destroyable
/// self-paying cell, to an immediate self-change output.
fn consume_cell(
    skeleton: &mut TransactionSkeleton,
    acc: &mut ChangeAccumulator,
    source: &FundingSource,
    cell: Cell,
) {
    let preserving =
        matches!(source, FundingSource::SelfPaying { destroyable: false, .. });
    let input_capacity = cell.output.capacity;
    let input_amount = cell.amount();
    let lock = cell.output.lock.clone();
    let type_script = cell.output.type_script.clone();
    let data_len = cell.data.len();
    trace!(out_point = %cell.out_point, input_capacity, "consuming cell");
    skeleton.add_input(cell, source.since_value());

    // a non-destroyable self-paying cell always retains its own storage cost
    let deductible = if preserving {
        input_capacity.saturating_sub(minimal_capacity(&lock, type_script.as_ref(), data_len))
    } else {
        input_capacity
    };
    let deduct_capacity = deductible.min(acc.capacity_need);
    acc.capacity_need -= deduct_capacity;
    let deduct_amount = input_amount.min(acc.amount_need);
    acc.amount_need -= deduct_amount;

    let leftover_capacity = input_capacity - deduct_capacity;
    let leftover_amount = input_amount - deduct_amount;
    if preserving {
        // surplus returns to the same cell, not to generic change
        let data = if type_script.is_some() {
            pack_amount(leftover_amount).to_vec()
        } else {
            Vec::new()
        };
        let idx = skeleton.add_output(
            CellOutput { capacity: leftover_capacity, lock, type_script },
            data,
        );
        if leftover_amount > 0 {
            skeleton.fix(FixedField::Outputs, idx);
        }
    } else {
        acc.change_capacity = acc.change_capacity.saturating_add(leftover_capacity);
        acc.change_amount = acc.change_amount.saturating_add(leftover_amount);
    }
}

/// Select input cells from the funding sources until the accumulator's needs
/// are met and the change can be carried, attaching inputs (and any
/// self-change outputs) to the skeleton.
///
/// Sources are visited in priority order (time-locked when a tip context is
/// present, then simple, multisig, self-paying), each expanded with a
/// token-filtered collector pass and a plain-capacity pass. Cells the
/// skeleton already consumed are skipped without consuming credit.
pub fn select_and_attach(
    source: &dyn CellSource,
    skeleton: &mut TransactionSkeleton,
    acc: &mut ChangeAccumulator,
    funding: &[FundingSource],
    type_filter: Option<&Script>,
    change: &ChangeTarget,
    tip: Option<&TipContext>,
) -> Result<(), BuildError> {
    if funding.is_empty() {
        return Err(BuildError::InvalidFundingConfiguration(
            "empty funding source list".into(),
        ));
    }
    debug!(
        capacity_need = acc.capacity_need,
        amount_need = %acc.amount_need,
        sources = funding.len(),
        "collecting inputs"
    );

    let eligible = ordered(funding, tip);
    if eligible.is_empty() {
        return Err(if tip.is_none() {
            BuildError::InvalidFundingConfiguration(
                "time-locked funding requires a tip context".into(),
            )
        } else {
            BuildError::NoEligibleCells(
                "no funding source is claimable at the current tip".into(),
            )
        });
    }

    let mut cells_seen = 0usize;
    'sources: for fs in eligible {
        for filter in passes(fs, type_filter) {
            if selection_done(acc, change) {
                break 'sources;
            }
            let iter = source.collect(fs.lock(), filter)?;
            for item in iter {
                let cell = item?;
                cells_seen += 1;
                if skeleton.contains_input(&cell.out_point) {
                    continue;
                }
                consume_cell(skeleton, acc, fs, cell);
                if selection_done(acc, change) {
                    break 'sources;
                }
            }
        }
    }

    if acc.capacity_need > 0 || acc.amount_need > 0 {
        if cells_seen == 0 {
            return Err(BuildError::NoEligibleCells(
                "no funding source yielded any cells".into(),
            ));
        }
        if acc.capacity_need > 0 {
            return Err(BuildError::InsufficientCapacity { missing: acc.capacity_need });
        }
        return Err(BuildError::InsufficientAmount { missing: acc.amount_need });
    }
    // amount-bearing change must be representable as a token cell
    if acc.change_amount > 0 {
        let needed = change_minimal(change, acc.change_amount);
        if acc.change_capacity < needed {
            return Err(BuildError::InsufficientCapacity {
                missing: needed - acc.change_capacity,
            });
        }
    }
    debug!(
        inputs = skeleton.inputs.len(),
        change_capacity = acc.change_capacity,
        change_amount = %acc.change_amount,
        "selection complete"
    );
    Ok(())
}

/// Consume every eligible cell of a single funding source in one pass,
/// accumulating everything as change. Used by the merge and burn operations,
/// which start with zero needs and never stop early.
///
/// Returns the number of cells consumed.
pub fn collect_all(
    source: &dyn CellSource,
    skeleton: &mut TransactionSkeleton,
    acc: &mut ChangeAccumulator,
    funding: &FundingSource,
    type_filter: Option<&Script>,
) -> Result<usize, BuildError> {
    let mut consumed = 0usize;
    let iter = source.collect(funding.lock(), type_filter)?;
    for item in iter {
        let cell = item?;
        if skeleton.contains_input(&cell.out_point) {
            continue;
        }
        consume_cell(skeleton, acc, funding, cell);
        consumed += 1;
    }
    debug!(consumed, "collected all eligible cells");
    Ok(consumed)
}
