//! Token amount codec.
//!
//! Token cells carry a 128-bit unsigned amount little-endian encoded in the
//! first 16 bytes of their data payload.

use crate::constants::AMOUNT_BYTES;

/// Pack a token amount into its fixed 16-byte little-endian encoding.
pub fn pack_amount(amount: u128) -> [u8; AMOUNT_BYTES] {
    amount.to_le_bytes()
}

/// Unpack a token amount from the first 16 bytes of a cell's data payload.
///
/// Callers must guarantee the cell is token-shaped (carries a type script
/// with amount-encoded data). A payload shorter than 16 bytes reads as
/// zero-extended.
pub fn unpack_amount(data: &[u8]) -> u128 {
    let mut buf = [0u8; AMOUNT_BYTES];
    let len = data.len().min(AMOUNT_BYTES);
    buf[..len].copy_from_slice(&data[..len]);
    u128::from_le_bytes(buf)
}
