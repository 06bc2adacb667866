//! Core ledger types: scripts, cells, outpoints, transactions.
//!
//! All capacity values are in the smallest capacity unit
//! (see [`UNITS_PER_BYTE`](crate::constants::UNITS_PER_BYTE)).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransactionError;

/// A 32-byte hash value.
///
/// Used for script code references, script hashes, and transaction ids
/// (all BLAKE3).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// How a script's code hash is resolved against dependency cells.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub enum HashType {
    /// Code hash matches the data hash of a dependency cell.
    Data,
    /// Code hash matches the type-script hash of a dependency cell.
    Type,
}

impl HashType {
    fn as_byte(&self) -> u8 {
        match self {
            Self::Data => 0,
            Self::Type => 1,
        }
    }
}

/// A lock or type script: code reference, hash type, and args.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct Script {
    /// Reference to the script code.
    pub code_hash: Hash256,
    /// How `code_hash` is resolved.
    pub hash_type: HashType,
    /// Script arguments (owner key hash, token id, ...).
    pub args: Vec<u8>,
}

impl Script {
    /// Compute the script hash (BLAKE3 over a fixed byte layout).
    ///
    /// Layout: code_hash || hash_type byte || args, so the hash is
    /// deterministic without going through a serializer.
    pub fn hash(&self) -> Hash256 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.code_hash.as_bytes());
        hasher.update(&[self.hash_type.as_byte()]);
        hasher.update(&self.args);
        Hash256(hasher.finalize().into())
    }

    /// On-ledger storage footprint of this script in bytes.
    pub fn occupied_bytes(&self) -> usize {
        crate::constants::SCRIPT_FIXED_BYTES + self.args.len()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code_hash, hex::encode(&self.args))
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct OutPoint {
    /// Transaction id containing the referenced output.
    pub txid: Hash256,
    /// Index of the output within the transaction.
    pub index: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// A transaction output: capacity, owner lock, and an optional type script.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct CellOutput {
    /// Capacity in smallest units. Must cover the cell's own storage cost.
    pub capacity: u64,
    /// Owner lock script.
    pub lock: Script,
    /// Optional token/asset type script.
    pub type_script: Option<Script>,
}

/// A live cell: an on-ledger output together with its data payload and origin.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Cell {
    /// Where this cell was created.
    pub out_point: OutPoint,
    /// The output fields.
    pub output: CellOutput,
    /// Opaque data payload. For token cells the first 16 bytes encode the
    /// amount little-endian.
    pub data: Vec<u8>,
}

impl Cell {
    /// Token amount carried by this cell, or 0 for a plain-capacity cell.
    pub fn amount(&self) -> u128 {
        if self.output.type_script.is_some() {
            crate::amount::unpack_amount(&self.data)
        } else {
            0
        }
    }
}

/// A transaction input, consuming a previous output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct CellInput {
    /// The outpoint being consumed.
    pub previous_output: OutPoint,
    /// Time-lock threshold this input asserts. 0 for immediately spendable
    /// inputs; a height or (top-bit-tagged) timestamp for time-locked ones.
    pub since: u64,
}

/// How a dependency cell is consumed by script resolution.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub enum DepKind {
    /// The dependency cell itself carries the code.
    Code,
    /// The dependency cell points at a group of code cells.
    Group,
}

/// A dependency cell reference required by a script.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct CellDep {
    /// Location of the dependency cell.
    pub out_point: OutPoint,
    /// How the dependency is resolved.
    pub dep_kind: DepKind,
}

/// A complete transaction in its serializable form.
///
/// Witnesses are index-aligned with inputs; `outputs_data` is index-aligned
/// with outputs.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    /// Protocol version.
    pub version: u32,
    /// Dependency cells required by the scripts involved.
    pub cell_deps: Vec<CellDep>,
    /// Inputs consuming previous outputs.
    pub inputs: Vec<CellInput>,
    /// New cells created by this transaction.
    pub outputs: Vec<CellOutput>,
    /// Data payloads, one per output.
    pub outputs_data: Vec<Vec<u8>>,
    /// Witnesses, one per input. Empty until signed.
    pub witnesses: Vec<Vec<u8>>,
}

impl Transaction {
    /// Compute the transaction id (BLAKE3 hash of the canonical encoding).
    ///
    /// Uses bincode with standard config for deterministic serialization.
    /// Returns an error if serialization fails.
    pub fn txid(&self) -> Result<Hash256, TransactionError> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(Hash256(blake3::hash(&encoded).into()))
    }

    /// Sum of all output capacities. Returns None on overflow.
    pub fn total_output_capacity(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.capacity))
    }
}

/// One signing entry per distinct input lock-script group.
///
/// Computed once after assembly; an external signer produces one witness
/// per group.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SigningEntry {
    /// Hash of the lock script shared by this group's inputs.
    pub script_hash: Hash256,
    /// Indices of the inputs locked by that script, in input order.
    pub input_indices: Vec<usize>,
}
