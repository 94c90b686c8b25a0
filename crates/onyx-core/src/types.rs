//! Transaction types and consensus serialization.
//!
//! The chain uses the version-4 Sapling transaction format. This core only
//! builds transparent spends, so the shielded sections serialize as empty:
//!
//! ```text
//! header(4, LE)            = version 4 | overwinter flag  -> 04 00 00 80
//! nVersionGroupId(4, LE)   = 0x892F2085                   -> 85 20 2F 89
//! tx_in count (varint)     then per input:
//!     txid(32, internal order) || vout(4, LE) ||
//!     varint(script_sig len) || script_sig || sequence(4, LE)
//! tx_out count (varint)    then per output:
//!     value(8, LE) || varint(script len) || script
//! nLockTime(4, LE)
//! nExpiryHeight(4, LE)
//! valueBalance(8, LE)      = 0
//! nShieldedSpend (varint)  = 0
//! nShieldedOutput (varint) = 0
//! nJoinSplit (varint)      = 0
//! ```
//!
//! The txid is the double SHA-256 of this serialization; its display form
//! is byte-reversed hex, per chain convention.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{OVERWINTER_FLAG, SEQUENCE_FINAL, TX_VERSION, VERSION_GROUP_ID};
use crate::error::TransactionError;
use crate::hash::sha256d;

/// A transaction id: 32 bytes in internal (hashing) byte order.
///
/// `Display` and [`Txid::from_hex`] use the reversed, human-facing hex form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    /// The zero txid. Not produced by any real transaction.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap raw internal-order bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The internal-order bytes, as serialized into outpoints.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero txid.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse the display (reversed-hex) form.
    pub fn from_hex(s: &str) -> Result<Self, TransactionError> {
        let bytes =
            hex::decode(s).map_err(|e| TransactionError::InvalidTxid(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TransactionError::InvalidTxid(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        out.reverse();
        Ok(Self(out))
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Txid {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Txid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction containing the referenced output.
    pub txid: Txid,
    /// Index of the output within that transaction.
    pub vout: u32,
}

impl OutPoint {
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.txid.as_bytes());
        buf.extend_from_slice(&self.vout.to_le_bytes());
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// A transaction input, spending a previous transparent output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// The outpoint being spent.
    pub previous_output: OutPoint,
    /// Unlocking script. Empty until the input is signed.
    pub script_sig: Vec<u8>,
    /// Sequence number; [`SEQUENCE_FINAL`] disables relative locktime.
    pub sequence: u32,
}

impl TxInput {
    /// An unsigned input for the given outpoint.
    pub fn unsigned(previous_output: OutPoint) -> Self {
        Self { previous_output, script_sig: Vec::new(), sequence: SEQUENCE_FINAL }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        self.previous_output.write_to(buf);
        write_varint(buf, self.script_sig.len() as u64);
        buf.extend_from_slice(&self.script_sig);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

/// A transaction output, creating a new transparent UTXO.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script (P2PKH throughout this core).
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        write_varint(buf, self.script_pubkey.len() as u64);
        buf.extend_from_slice(&self.script_pubkey);
    }
}

/// A version-4 transparent transaction.
///
/// The version, overwinter flag, and version group id are fixed properties
/// of the format, not fields; [`Transaction::to_bytes`] emits them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Inputs consuming previous outputs.
    pub inputs: Vec<TxInput>,
    /// New outputs created by this transaction.
    pub outputs: Vec<TxOutput>,
    /// Height or time before which the transaction is invalid.
    pub lock_time: u32,
    /// Height after which an unmined transaction expires. 0 disables expiry.
    pub expiry_height: u32,
}

impl Transaction {
    /// The serialized version field: version 4 with the overwinter bit set.
    pub const fn header() -> u32 {
        TX_VERSION | OVERWINTER_FLAG
    }

    /// Serialize to consensus bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.extend_from_slice(&Self::header().to_le_bytes());
        buf.extend_from_slice(&VERSION_GROUP_ID.to_le_bytes());
        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(&mut buf);
        }
        write_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(&mut buf);
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf.extend_from_slice(&self.expiry_height.to_le_bytes());
        // valueBalance and the three empty shielded/joinsplit sections.
        buf.extend_from_slice(&0i64.to_le_bytes());
        write_varint(&mut buf, 0);
        write_varint(&mut buf, 0);
        write_varint(&mut buf, 0);
        buf
    }

    /// Serialize to broadcast-ready hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Compute the transaction id (double SHA-256 of the serialization).
    pub fn txid(&self) -> Txid {
        Txid(sha256d(&self.to_bytes()))
    }

    /// Sum of all output values. `None` on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }

    /// Exact serialized size in bytes.
    pub fn serialized_size(&self) -> usize {
        let mut size = 4 + 4; // header + version group id
        size += varint_len(self.inputs.len() as u64);
        for input in &self.inputs {
            size += 32 + 4 + varint_len(input.script_sig.len() as u64) + input.script_sig.len() + 4;
        }
        size += varint_len(self.outputs.len() as u64);
        for output in &self.outputs {
            size += 8 + varint_len(output.script_pubkey.len() as u64) + output.script_pubkey.len();
        }
        size + 4 + 4 + 8 + 3 // locktime, expiry, valueBalance, empty sections
    }
}

/// Serialize all outputs back to back, as hashed for the signature digest.
pub fn serialize_outputs(outputs: &[TxOutput]) -> Vec<u8> {
    let mut buf = Vec::new();
    for output in outputs {
        output.write_to(&mut buf);
    }
    buf
}

/// Append `n` in Bitcoin varint encoding.
pub fn write_varint(buf: &mut Vec<u8>, n: u64) {
    if n < 0xFD {
        buf.push(n as u8);
    } else if n <= 0xFFFF {
        buf.push(0xFD);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xFFFF_FFFF {
        buf.push(0xFE);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(0xFF);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

fn varint_len(n: u64) -> usize {
    match n {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}
