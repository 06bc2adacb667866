//! Operation families: issue, transfer, merge, burn.
//!
//! Each operation drives the same pipeline: place the fixed destination
//! outputs, run the selection engine with the fee head-room folded into the
//! capacity need, return the head-room to change, materialize the change
//! outputs, and deduct the actual fee. On any error the skeleton is
//! discarded; no partial transaction is ever returned.

use tessera_core::amount::pack_amount;
use tessera_core::capacity::minimal_capacity;
use tessera_core::constants::AMOUNT_BYTES;
use tessera_core::error::TransactionError;
use tessera_core::traits::CellSource;
use tessera_core::types::{CellOutput, Script};
use tracing::debug;

use crate::change::{ChangeTarget, materialize_change};
use crate::error::BuildError;
use crate::fee::{FEE_BUDGET, take_fee};
use crate::funding::{FundingSource, TipContext};
use crate::selection::{ChangeAccumulator, collect_all, select_and_attach};
use crate::skeleton::{FixedField, TransactionSkeleton};

/// Destination of a token issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueTarget {
    /// Lock owning the issued cell.
    pub lock: Script,
    /// Type script identifying the issued token.
    pub type_script: Script,
    /// Initial token amount.
    pub amount: u128,
    /// Capacity of the issued cell; defaults to its minimum.
    pub capacity: Option<u64>,
}

/// One destination of a transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// A fresh output at the receiver's lock.
    Plain {
        /// Receiver lock script.
        lock: Script,
        /// Type script when transferring a token amount.
        type_script: Option<Script>,
        /// Output capacity; defaults to the cell's minimum.
        capacity: Option<u64>,
        /// Token amount to deliver.
        amount: u128,
    },
    /// A self-paying receiver: its live cell is consumed and re-emitted with
    /// the delivered value merged in, so the receiver keeps a single cell.
    SelfPaying {
        /// Receiver lock script.
        lock: Script,
        /// Type script of the receiver's cell when delivering an amount.
        type_script: Option<Script>,
        /// Extra capacity to add on top of the consumed cell's own.
        extra_capacity: u64,
        /// Token amount to deliver.
        amount: u128,
    },
}

impl Receiver {
    fn amount(&self) -> u128 {
        match self {
            Self::Plain { amount, .. } | Self::SelfPaying { amount, .. } => *amount,
        }
    }

    fn type_script(&self) -> Option<&Script> {
        match self {
            Self::Plain { type_script, .. } | Self::SelfPaying { type_script, .. } => {
                type_script.as_ref()
            }
        }
    }
}

/// Change destination derived from a funding source: same lock, plain
/// capacity, merge-eligible when the source is self-paying.
fn change_for(source: &FundingSource) -> ChangeTarget {
    ChangeTarget {
        lock: source.lock().clone(),
        type_script: None,
        self_paying: matches!(source, FundingSource::SelfPaying { .. }),
    }
}

/// Issue a new token cell holding `target.amount`, funded with plain
/// capacity from the funding sources.
pub fn issue(
    source: &dyn CellSource,
    target: &IssueTarget,
    funding: &[FundingSource],
    fee_rate: u64,
    tip: Option<&TipContext>,
) -> Result<TransactionSkeleton, BuildError> {
    if funding.is_empty() {
        return Err(BuildError::InvalidFundingConfiguration(
            "empty funding source list".into(),
        ));
    }
    let floor = minimal_capacity(&target.lock, Some(&target.type_script), AMOUNT_BYTES);
    let capacity = target.capacity.unwrap_or(floor);
    if capacity < floor {
        return Err(BuildError::InsufficientCapacity { missing: floor - capacity });
    }
    debug!(amount = %target.amount, capacity, "issuing token cell");

    let mut skeleton = TransactionSkeleton::new();
    let idx = skeleton.add_output(
        CellOutput {
            capacity,
            lock: target.lock.clone(),
            type_script: Some(target.type_script.clone()),
        },
        pack_amount(target.amount).to_vec(),
    );
    skeleton.fix(FixedField::Outputs, idx);

    let change = change_for(&funding[0]);
    let mut acc = ChangeAccumulator::new(
        capacity
            .checked_add(FEE_BUDGET)
            .ok_or(TransactionError::ValueOverflow)?,
        0,
    );
    select_and_attach(source, &mut skeleton, &mut acc, funding, None, &change, tip)?;
    // return the head-room to change; take_fee reclaims the actual fee
    acc.change_capacity = acc.change_capacity.saturating_add(FEE_BUDGET);
    let change_idx = materialize_change(&mut skeleton, acc, &change, false)?;
    skeleton.compute_signing_entries();
    take_fee(&mut skeleton, fee_rate, change_idx)?;
    Ok(skeleton)
}

/// Move capacity and token amounts from the funding sources to the given
/// receivers.
///
/// Plain receivers become fixed outputs; self-paying receivers get their
/// live cell consumed and re-emitted with the delivered value merged in.
/// When the change carries a token amount its type defaults to the
/// receivers' type script.
pub fn transfer(
    source: &dyn CellSource,
    receivers: &[Receiver],
    funding: &[FundingSource],
    change: &ChangeTarget,
    fee_rate: u64,
    split_change: bool,
    tip: Option<&TipContext>,
) -> Result<TransactionSkeleton, BuildError> {
    if funding.is_empty() {
        return Err(BuildError::InvalidFundingConfiguration(
            "empty funding source list".into(),
        ));
    }
    if receivers.is_empty() {
        return Err(BuildError::InvalidFundingConfiguration("no receivers".into()));
    }

    // all amount-bearing receivers must agree on one token type, since a
    // single selection pass can only back one type with inputs
    let mut type_filter: Option<&Script> = None;
    for receiver in receivers {
        if receiver.amount() > 0 {
            let ty = receiver.type_script().ok_or_else(|| {
                BuildError::MissingTypeScript(format!(
                    "receiver of amount {}",
                    receiver.amount()
                ))
            })?;
            match type_filter {
                None => type_filter = Some(ty),
                Some(established) if established != ty => {
                    return Err(BuildError::InvalidFundingConfiguration(
                        "receivers span multiple token types".into(),
                    ));
                }
                Some(_) => {}
            }
        }
    }

    let mut skeleton = TransactionSkeleton::new();
    let mut capacity_need = FEE_BUDGET;
    let mut amount_need: u128 = 0;

    for receiver in receivers {
        match receiver {
            Receiver::Plain { lock, type_script, capacity, amount } => {
                let data_len = if type_script.is_some() { AMOUNT_BYTES } else { 0 };
                let floor = minimal_capacity(lock, type_script.as_ref(), data_len);
                let capacity = capacity.unwrap_or(floor);
                if capacity < floor {
                    return Err(BuildError::InsufficientCapacity {
                        missing: floor - capacity,
                    });
                }
                let data = match type_script {
                    Some(_) => pack_amount(*amount).to_vec(),
                    None => Vec::new(),
                };
                let idx = skeleton.add_output(
                    CellOutput {
                        capacity,
                        lock: lock.clone(),
                        type_script: type_script.clone(),
                    },
                    data,
                );
                skeleton.fix(FixedField::Outputs, idx);
                capacity_need = capacity_need
                    .checked_add(capacity)
                    .ok_or(TransactionError::ValueOverflow)?;
                amount_need = amount_need
                    .checked_add(*amount)
                    .ok_or(TransactionError::ValueOverflow)?;
            }
            Receiver::SelfPaying { lock, type_script, extra_capacity, amount } => {
                let mut live = None;
                for item in source.collect(lock, type_script.as_ref())? {
                    let cell = item?;
                    if !skeleton.contains_input(&cell.out_point) {
                        live = Some(cell);
                        break;
                    }
                }
                let cell = live.ok_or_else(|| {
                    BuildError::NoEligibleCells(
                        "self-paying receiver has no live cell".into(),
                    )
                })?;
                let merged_capacity = cell
                    .output
                    .capacity
                    .checked_add(*extra_capacity)
                    .ok_or(TransactionError::ValueOverflow)?;
                let merged_amount = cell
                    .amount()
                    .checked_add(*amount)
                    .ok_or(TransactionError::ValueOverflow)?;
                let data = match type_script {
                    Some(_) => pack_amount(merged_amount).to_vec(),
                    None => Vec::new(),
                };
                let out_lock = cell.output.lock.clone();
                let out_type = cell.output.type_script.clone();
                skeleton.add_input(cell, 0);
                let idx = skeleton.add_output(
                    CellOutput {
                        capacity: merged_capacity,
                        lock: out_lock,
                        type_script: out_type,
                    },
                    data,
                );
                skeleton.fix(FixedField::Outputs, idx);
                capacity_need = capacity_need
                    .checked_add(*extra_capacity)
                    .ok_or(TransactionError::ValueOverflow)?;
                amount_need = amount_need
                    .checked_add(*amount)
                    .ok_or(TransactionError::ValueOverflow)?;
            }
        }
    }
    debug!(
        receivers = receivers.len(),
        capacity_need,
        amount_need = %amount_need,
        "transfer outputs placed"
    );

    let change = ChangeTarget {
        lock: change.lock.clone(),
        type_script: change.type_script.clone().or_else(|| type_filter.cloned()),
        self_paying: change.self_paying,
    };
    let mut acc = ChangeAccumulator::new(capacity_need, amount_need);
    select_and_attach(
        source,
        &mut skeleton,
        &mut acc,
        funding,
        type_filter,
        &change,
        tip,
    )?;
    acc.change_capacity = acc.change_capacity.saturating_add(FEE_BUDGET);
    let change_idx = materialize_change(&mut skeleton, acc, &change, split_change)?;
    skeleton.compute_signing_entries();
    take_fee(&mut skeleton, fee_rate, change_idx)?;
    Ok(skeleton)
}

/// Consolidate every eligible cell of one funding source.
///
/// With a type filter, all token cells of that type collapse into one merged
/// output at the funding lock, with the pooled capacity (minus the merged
/// cell's minimum) returned as plain change. Without a filter, all plain
/// cells collapse into a single output at the change lock.
pub fn merge_cells(
    source: &dyn CellSource,
    funding: &FundingSource,
    type_filter: Option<&Script>,
    change_lock: Script,
    fee_rate: u64,
) -> Result<TransactionSkeleton, BuildError> {
    if matches!(funding, FundingSource::TimeLocked { .. }) {
        return Err(BuildError::InvalidFundingConfiguration(
            "time-locked cells cannot be consolidated".into(),
        ));
    }
    let mut skeleton = TransactionSkeleton::new();
    let mut acc = ChangeAccumulator::new(0, 0);
    let consumed = collect_all(source, &mut skeleton, &mut acc, funding, type_filter)?;
    if consumed == 0 {
        return Err(BuildError::NoEligibleCells("nothing to consolidate".into()));
    }
    debug!(consumed, amount = %acc.change_amount, "consolidating cells");

    let change_idx = match type_filter {
        Some(ty) => {
            let min_token = minimal_capacity(funding.lock(), Some(ty), AMOUNT_BYTES);
            if acc.change_capacity < min_token {
                return Err(BuildError::InsufficientCapacity {
                    missing: min_token - acc.change_capacity,
                });
            }
            let min_plain = minimal_capacity(&change_lock, None, 0);
            let remainder = acc.change_capacity - min_token;
            // when the remainder cannot host a change cell, the merged cell
            // absorbs it (and the fee comes off the merged cell)
            let merged_capacity = if remainder >= min_plain {
                min_token
            } else {
                acc.change_capacity
            };
            let merged = skeleton.add_output(
                CellOutput {
                    capacity: merged_capacity,
                    lock: funding.lock().clone(),
                    type_script: Some(ty.clone()),
                },
                pack_amount(acc.change_amount).to_vec(),
            );
            skeleton.fix(FixedField::Outputs, merged);
            if remainder >= min_plain {
                Some(skeleton.add_output(
                    CellOutput {
                        capacity: remainder,
                        lock: change_lock,
                        type_script: None,
                    },
                    Vec::new(),
                ))
            } else {
                Some(merged)
            }
        }
        None => {
            materialize_change(&mut skeleton, acc, &ChangeTarget::plain(change_lock), false)?
        }
    };
    skeleton.compute_signing_entries();
    take_fee(&mut skeleton, fee_rate, change_idx)?;
    Ok(skeleton)
}

/// Destroy `burn_amount` token units of the given type.
///
/// Every eligible token cell of the funding source is consumed; the amount
/// above `burn_amount` is preserved in a token-bearing change output, so the
/// destroyed difference is exact. Capacity is fully returned as change.
pub fn burn(
    source: &dyn CellSource,
    funding: &FundingSource,
    type_script: &Script,
    burn_amount: u128,
    change_lock: Script,
    fee_rate: u64,
) -> Result<TransactionSkeleton, BuildError> {
    if matches!(funding, FundingSource::TimeLocked { .. }) {
        return Err(BuildError::InvalidFundingConfiguration(
            "time-locked cells cannot be burned".into(),
        ));
    }
    let mut skeleton = TransactionSkeleton::new();
    let mut acc = ChangeAccumulator::new(0, 0);
    let consumed =
        collect_all(source, &mut skeleton, &mut acc, funding, Some(type_script))?;
    if consumed == 0 {
        return Err(BuildError::NoEligibleCells("no token cells to burn from".into()));
    }
    if acc.change_amount < burn_amount {
        return Err(BuildError::InsufficientAmount {
            missing: burn_amount - acc.change_amount,
        });
    }
    let excess = acc.change_amount - burn_amount;
    debug!(consumed, burn_amount = %burn_amount, excess = %excess, "burning token amount");
    acc.change_amount = excess;

    let change = ChangeTarget {
        lock: change_lock,
        type_script: if excess > 0 { Some(type_script.clone()) } else { None },
        self_paying: false,
    };
    let change_idx = materialize_change(&mut skeleton, acc, &change, true)?;
    skeleton.compute_signing_entries();
    take_fee(&mut skeleton, fee_rate, change_idx)?;
    Ok(skeleton)
}
