//! Two-pass fee handling.
//!
//! Assembly runs with a fixed capacity head-room ([`FEE_BUDGET`]) folded into
//! the capacity need, then the actual fee is estimated from the serialized
//! size of the assembled transaction and subtracted from the designated
//! change output. The difference between budget and actual fee stays in
//! change, so the transaction always balances exactly.

use tessera_core::capacity::minimal_capacity;
use tessera_core::constants::UNITS_PER_BYTE;
use tessera_core::error::TransactionError;
use tracing::debug;

use crate::error::BuildError;
use crate::skeleton::TransactionSkeleton;

/// Default fee rate: smallest units per 1000 serialized bytes.
pub const DEFAULT_FEE_RATE: u64 = 1_000;

/// Capacity head-room reserved during assembly, reclaimed into change after
/// the fee pass. Comfortably exceeds any realistic fee, and large enough to
/// host a plain change cell on its own when selection leaves no other
/// leftover capacity.
pub const FEE_BUDGET: u64 = 100 * UNITS_PER_BYTE;

/// Size of the placeholder signature witness used when sizing an unsigned
/// transaction.
const PLACEHOLDER_WITNESS_LEN: usize = 96;

/// Estimate the fee for the skeleton's transaction at the given rate.
///
/// The first input of every signing group gets a placeholder witness of
/// signature size, so the estimate covers the signed form. Requires
/// [`compute_signing_entries`](TransactionSkeleton::compute_signing_entries)
/// to have run.
pub fn estimate_fee(
    skeleton: &TransactionSkeleton,
    fee_rate: u64,
) -> Result<u64, BuildError> {
    let mut sized = skeleton.clone();
    for entry in skeleton.signing_entries() {
        if let Some(&first) = entry.input_indices.first() {
            sized.witnesses[first] = vec![0u8; PLACEHOLDER_WITNESS_LEN];
        }
    }
    let tx = sized.build_transaction();
    let bytes = bincode::encode_to_vec(&tx, bincode::config::standard())
        .map_err(|e| TransactionError::Serialization(e.to_string()))?;
    let fee = (bytes.len() as u64)
        .saturating_mul(fee_rate)
        .div_ceil(1_000);
    debug!(size = bytes.len(), fee_rate, fee, "estimated fee");
    Ok(fee)
}

/// Estimate the fee and deduct it from the designated change output.
///
/// The remaining capacity must still cover that output's own minimum;
/// otherwise the head-room reserved during assembly was not enough and the
/// shortfall is reported. Returns the fee taken.
pub fn take_fee(
    skeleton: &mut TransactionSkeleton,
    fee_rate: u64,
    change_index: Option<usize>,
) -> Result<u64, BuildError> {
    let fee = estimate_fee(skeleton, fee_rate)?;
    let Some(index) = change_index else {
        return Err(BuildError::InsufficientCapacity { missing: fee });
    };
    let output = &skeleton.outputs[index];
    let floor = minimal_capacity(
        &output.lock,
        output.type_script.as_ref(),
        skeleton.outputs_data[index].len(),
    );
    let remaining = output.capacity.saturating_sub(fee);
    if remaining < floor {
        return Err(BuildError::InsufficientCapacity {
            missing: floor + fee - output.capacity,
        });
    }
    skeleton.outputs[index].capacity = remaining;
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::constants::UNITS_PER_BYTE;
    use tessera_core::types::{Cell, CellOutput, Hash256, HashType, OutPoint, Script};

    fn lock(tag: u8) -> Script {
        Script {
            code_hash: Hash256([tag; 32]),
            hash_type: HashType::Type,
            args: vec![tag; 20],
        }
    }

    fn cell(tag: u8, lock_tag: u8, capacity: u64) -> Cell {
        Cell {
            out_point: OutPoint { txid: Hash256([tag; 32]), index: 0 },
            output: CellOutput {
                capacity,
                lock: lock(lock_tag),
                type_script: None,
            },
            data: vec![],
        }
    }

    fn skeleton_with_change(change_capacity: u64) -> TransactionSkeleton {
        let mut skel = TransactionSkeleton::new();
        skel.add_input(cell(1, 1, change_capacity + 61 * UNITS_PER_BYTE), 0);
        skel.add_output(
            CellOutput { capacity: change_capacity, lock: lock(1), type_script: None },
            vec![],
        );
        skel.compute_signing_entries();
        skel
    }

    #[test]
    fn estimate_scales_with_rate() {
        let skel = skeleton_with_change(100 * UNITS_PER_BYTE);
        let f1 = estimate_fee(&skel, 1_000).unwrap();
        let f2 = estimate_fee(&skel, 2_000).unwrap();
        assert!(f1 > 0);
        assert_eq!(f2, f1 * 2);
    }

    #[test]
    fn estimate_accounts_for_placeholder_witnesses() {
        let with_sig = skeleton_with_change(100 * UNITS_PER_BYTE);
        // same shape but no signing entries, so no placeholder is inserted
        let mut bare = TransactionSkeleton::new();
        bare.add_input(cell(1, 1, 200 * UNITS_PER_BYTE), 0);
        bare.add_output(
            CellOutput {
                capacity: 100 * UNITS_PER_BYTE,
                lock: lock(1),
                type_script: None,
            },
            vec![],
        );
        let sized = estimate_fee(&with_sig, 1_000).unwrap();
        let bare_fee = estimate_fee(&bare, 1_000).unwrap();
        assert!(sized > bare_fee);
    }

    #[test]
    fn estimate_does_not_mutate_skeleton() {
        let skel = skeleton_with_change(100 * UNITS_PER_BYTE);
        estimate_fee(&skel, 1_000).unwrap();
        assert!(skel.witnesses[0].is_empty());
    }

    #[test]
    fn take_fee_shrinks_change_output() {
        let mut skel = skeleton_with_change(100 * UNITS_PER_BYTE);
        let before = skel.outputs[0].capacity;
        let fee = take_fee(&mut skel, DEFAULT_FEE_RATE, Some(0)).unwrap();
        assert!(fee > 0);
        assert!(fee < FEE_BUDGET);
        assert_eq!(skel.outputs[0].capacity, before - fee);
    }

    #[test]
    fn take_fee_respects_change_minimum() {
        // change sits exactly at its own minimum; any fee breaks it
        let mut skel = skeleton_with_change(61 * UNITS_PER_BYTE);
        let err = take_fee(&mut skel, DEFAULT_FEE_RATE, Some(0)).unwrap_err();
        assert!(matches!(err, BuildError::InsufficientCapacity { .. }));
    }

    #[test]
    fn take_fee_requires_a_change_output() {
        let mut skel = skeleton_with_change(100 * UNITS_PER_BYTE);
        let err = take_fee(&mut skel, DEFAULT_FEE_RATE, None).unwrap_err();
        assert!(matches!(err, BuildError::InsufficientCapacity { .. }));
    }
}
