//! Change-output materialization.
//!
//! Once the selection loop has satisfied its needs, the leftover capacity and
//! token amount tracked by the [`ChangeAccumulator`] must become zero, one,
//! or two change outputs. Merging into an existing self-paying output is
//! preferred over growing the transaction; splitting a token-bearing change
//! into a token cell plus a plain cell keeps shared address cells small.

use tessera_core::amount::{pack_amount, unpack_amount};
use tessera_core::capacity::minimal_capacity;
use tessera_core::constants::AMOUNT_BYTES;
use tessera_core::error::TransactionError;
use tessera_core::types::{CellOutput, Script};
use tracing::debug;

use crate::error::BuildError;
use crate::selection::ChangeAccumulator;
use crate::skeleton::{FixedField, TransactionSkeleton};

/// Where change goes: the designated change lock, the type script it carries
/// when the change holds a token amount, and whether the lock is a
/// self-paying address (eligible for merge-into-existing-output).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeTarget {
    /// Change lock script.
    pub lock: Script,
    /// Type script for amount-bearing change. Ignored when the change
    /// amount is zero.
    pub type_script: Option<Script>,
    /// Whether the change lock is a self-paying address.
    pub self_paying: bool,
}

impl ChangeTarget {
    /// Plain-capacity change to a non-self-paying lock.
    pub fn plain(lock: Script) -> Self {
        Self { lock, type_script: None, self_paying: false }
    }
}

/// Turn the accumulated change into outputs on the skeleton.
///
/// Returns the index of the change output whose capacity the fee pass may
/// later shrink, or `None` when there was no change to place.
///
/// Cases, in order:
/// - nothing left: no output;
/// - an existing unfixed output shares the change lock and type-presence and
///   the target is self-paying: merge additively (or, with `split_change`,
///   keep its capacity and append a plain cell carrying the change capacity);
/// - otherwise append a fresh change output, optionally split into a minimal
///   token cell plus a plain remainder;
/// - amount-bearing change below the token-cell minimum fails.
pub fn materialize_change(
    skeleton: &mut TransactionSkeleton,
    acc: ChangeAccumulator,
    change: &ChangeTarget,
    split_change: bool,
) -> Result<Option<usize>, BuildError> {
    debug_assert!(acc.capacity_need == 0 && acc.amount_need == 0);
    let ChangeAccumulator { change_capacity, change_amount, .. } = acc;

    // Case D: nothing to place.
    if change_capacity == 0 && change_amount == 0 {
        return Ok(None);
    }

    if change_amount > 0 && change.type_script.is_none() {
        return Err(BuildError::MissingTypeScript(
            "change carries a token amount".into(),
        ));
    }

    let min_plain = minimal_capacity(&change.lock, None, 0);

    // Case A: merge into an existing self-paying output.
    if change.self_paying {
        let target = skeleton
            .outputs
            .iter()
            .enumerate()
            .find(|(i, o)| {
                // capacity-only change merges by lock alone; amount-bearing
                // change additionally needs the exact type script
                o.lock == change.lock
                    && (change_amount == 0 || o.type_script == change.type_script)
                    && !skeleton.is_fixed(FixedField::Outputs, *i)
            })
            .map(|(i, _)| i);
        if let Some(idx) = target {
            let min_token =
                minimal_capacity(&change.lock, change.type_script.as_ref(), AMOUNT_BYTES);
            let merged = skeleton.outputs[idx].capacity.saturating_add(change_capacity);
            if split_change
                && change_amount > 0
                && change_capacity >= min_plain
                && merged >= min_token.saturating_add(min_plain)
            {
                // amount merges into the shared cell; capacity rides a fresh
                // plain cell so the shared cell does not grow
                merge_amount(skeleton, idx, change_amount)?;
                let plain = skeleton.add_output(
                    CellOutput {
                        capacity: change_capacity,
                        lock: change.lock.clone(),
                        type_script: None,
                    },
                    Vec::new(),
                );
                debug!(merged = idx, plain, "change split against self-paying output");
                return Ok(Some(plain));
            }
            skeleton.outputs[idx].capacity = skeleton.outputs[idx]
                .capacity
                .checked_add(change_capacity)
                .ok_or(TransactionError::ValueOverflow)?;
            if change_amount > 0 {
                merge_amount(skeleton, idx, change_amount)?;
            }
            debug!(output = idx, change_capacity, "change merged into self-paying output");
            return Ok(Some(idx));
        }
    }

    // Cases B and C: a fresh change output, or failure.
    let min_needed = if change_amount > 0 {
        minimal_capacity(&change.lock, change.type_script.as_ref(), AMOUNT_BYTES)
    } else {
        min_plain
    };
    if change_capacity < min_needed {
        return Err(BuildError::InsufficientCapacity {
            missing: min_needed - change_capacity,
        });
    }

    if split_change
        && change_amount > 0
        && change_capacity >= min_needed.saturating_add(min_plain)
    {
        let token = skeleton.add_output(
            CellOutput {
                capacity: min_needed,
                lock: change.lock.clone(),
                type_script: change.type_script.clone(),
            },
            pack_amount(change_amount).to_vec(),
        );
        skeleton.fix(FixedField::Outputs, token);
        let plain = skeleton.add_output(
            CellOutput {
                capacity: change_capacity - min_needed,
                lock: change.lock.clone(),
                type_script: None,
            },
            Vec::new(),
        );
        debug!(token, plain, "change split into token and plain outputs");
        return Ok(Some(plain));
    }

    let (type_script, data) = if change_amount > 0 {
        (change.type_script.clone(), pack_amount(change_amount).to_vec())
    } else {
        (None, Vec::new())
    };
    let idx = skeleton.add_output(
        CellOutput { capacity: change_capacity, lock: change.lock.clone(), type_script },
        data,
    );
    if change_amount > 0 {
        // amount-bearing change must not be relocated; only its capacity may
        // shrink in the fee pass
        skeleton.fix(FixedField::Outputs, idx);
    }
    debug!(output = idx, change_capacity, "change output appended");
    Ok(Some(idx))
}

fn merge_amount(
    skeleton: &mut TransactionSkeleton,
    idx: usize,
    amount: u128,
) -> Result<(), BuildError> {
    let current = unpack_amount(&skeleton.outputs_data[idx]);
    let total = current
        .checked_add(amount)
        .ok_or(TransactionError::ValueOverflow)?;
    skeleton.outputs_data[idx] = pack_amount(total).to_vec();
    Ok(())
}
