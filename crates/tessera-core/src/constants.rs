//! Ledger constants. All capacity values are in the smallest capacity unit
//! (1 on-ledger byte of storage costs 10^8 units).

/// Capacity units charged per byte of on-ledger storage.
pub const UNITS_PER_BYTE: u64 = 100_000_000;

/// On-ledger size of the capacity field itself, in bytes.
pub const CAPACITY_FIELD_BYTES: usize = 8;

/// Fixed on-ledger size of a script excluding its args: 32-byte code hash
/// plus one hash-type byte.
pub const SCRIPT_FIXED_BYTES: usize = 33;

/// Width of a packed token amount in a cell's data payload, in bytes.
pub const AMOUNT_BYTES: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_cost_is_one_full_unit() {
        assert_eq!(UNITS_PER_BYTE, 100_000_000);
    }

    #[test]
    fn script_fixed_size_covers_code_hash_and_hash_type() {
        assert_eq!(SCRIPT_FIXED_BYTES, 32 + 1);
    }
}
