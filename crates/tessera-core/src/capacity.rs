//! Minimum capacity calculation.
//!
//! Every output must carry at least enough capacity to pay for its own
//! on-ledger storage: the capacity field itself, the lock script, the type
//! script when present, and the data payload.

use crate::constants::{CAPACITY_FIELD_BYTES, UNITS_PER_BYTE};
use crate::types::Script;

/// Minimum required capacity for an output with the given lock, optional
/// type script, and data payload length.
///
/// Pure function; saturates instead of overflowing on absurd data lengths.
pub fn minimal_capacity(lock: &Script, type_script: Option<&Script>, data_len: usize) -> u64 {
    let occupied = CAPACITY_FIELD_BYTES
        .saturating_add(lock.occupied_bytes())
        .saturating_add(type_script.map_or(0, Script::occupied_bytes))
        .saturating_add(data_len);
    (occupied as u64).saturating_mul(UNITS_PER_BYTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AMOUNT_BYTES;
    use crate::types::{Hash256, HashType};

    fn lock() -> Script {
        Script {
            code_hash: Hash256([0x11; 32]),
            hash_type: HashType::Type,
            args: vec![0xAA; 20],
        }
    }

    fn token_type() -> Script {
        Script {
            code_hash: Hash256([0x22; 32]),
            hash_type: HashType::Data,
            args: vec![0xBB; 32],
        }
    }

    #[test]
    fn plain_cell_minimum() {
        // 8 capacity bytes + (33 + 20) lock bytes
        assert_eq!(minimal_capacity(&lock(), None, 0), 61 * UNITS_PER_BYTE);
    }

    #[test]
    fn token_cell_minimum() {
        // plain + (33 + 32) type bytes + 16 amount bytes
        assert_eq!(
            minimal_capacity(&lock(), Some(&token_type()), AMOUNT_BYTES),
            142 * UNITS_PER_BYTE
        );
    }

    #[test]
    fn data_length_adds_per_byte_cost() {
        let base = minimal_capacity(&lock(), None, 0);
        assert_eq!(minimal_capacity(&lock(), None, 10), base + 10 * UNITS_PER_BYTE);
    }

    #[test]
    fn longer_args_cost_more() {
        let mut wide = lock();
        wide.args = vec![0xAA; 32];
        assert!(minimal_capacity(&wide, None, 0) > minimal_capacity(&lock(), None, 0));
    }

    #[test]
    fn saturates_on_huge_data() {
        assert_eq!(minimal_capacity(&lock(), None, usize::MAX), u64::MAX);
    }
}
