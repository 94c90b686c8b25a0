//! Sapling (v4) transparent signature hash.
//!
//! The digest every input signature commits to is BLAKE2b-256 with the
//! personalization `"ZcashSigHash" || consensus_branch_id (LE)` over:
//!
//! ```text
//! header || nVersionGroupId ||
//! hashPrevouts || hashSequence || hashOutputs ||
//! hashJoinSplits(32 zero) || hashShieldedSpends(32 zero) ||
//! hashShieldedOutputs(32 zero) ||
//! nLockTime || nExpiryHeight || valueBalance ||
//! nHashType(u32 LE) ||
//! outpoint || varint(len) || scriptCode || amount(u64 LE) || nSequence
//! ```
//!
//! The trailing `amount` is the value of the output being spent, so a
//! signature binds the exact satoshis it authorizes. The three sub-hashes
//! use their own personalizations and collapse to 32 zero bytes when the
//! corresponding list is empty.

use blake2b_simd::Params;

use crate::constants::CONSENSUS_BRANCH_ID;
use crate::error::CryptoError;
use crate::types::{serialize_outputs, write_varint, Transaction, TxInput};

const PREVOUTS_PERSONALIZATION: &[u8; 16] = b"ZcashPrevoutHash";
const SEQUENCE_PERSONALIZATION: &[u8; 16] = b"ZcashSequencHash";
const OUTPUTS_PERSONALIZATION: &[u8; 16] = b"ZcashOutputsHash";
const SIGHASH_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZcashSigHash";

fn blake2b_256(personalization: &[u8; 16], data: &[u8]) -> [u8; 32] {
    let hash = Params::new()
        .hash_length(32)
        .personal(personalization)
        .hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// BLAKE2b-256 over all input outpoints; zero when there are none.
pub fn hash_prevouts(inputs: &[TxInput]) -> [u8; 32] {
    if inputs.is_empty() {
        return [0u8; 32];
    }
    let mut buf = Vec::with_capacity(inputs.len() * 36);
    for input in inputs {
        buf.extend_from_slice(input.previous_output.txid.as_bytes());
        buf.extend_from_slice(&input.previous_output.vout.to_le_bytes());
    }
    blake2b_256(PREVOUTS_PERSONALIZATION, &buf)
}

/// BLAKE2b-256 over all input sequence numbers; zero when there are none.
pub fn hash_sequence(inputs: &[TxInput]) -> [u8; 32] {
    if inputs.is_empty() {
        return [0u8; 32];
    }
    let mut buf = Vec::with_capacity(inputs.len() * 4);
    for input in inputs {
        buf.extend_from_slice(&input.sequence.to_le_bytes());
    }
    blake2b_256(SEQUENCE_PERSONALIZATION, &buf)
}

/// BLAKE2b-256 over all serialized outputs; zero when there are none.
pub fn hash_outputs(tx: &Transaction) -> [u8; 32] {
    if tx.outputs.is_empty() {
        return [0u8; 32];
    }
    blake2b_256(OUTPUTS_PERSONALIZATION, &serialize_outputs(&tx.outputs))
}

/// Compute the SIGHASH_ALL digest for one transparent input.
///
/// `script_code` is the locking script of the output being spent and
/// `amount` its exact value in satoshis.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: u64,
    hash_type: u32,
) -> Result<[u8; 32], CryptoError> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        })?;

    let mut personalization = [0u8; 16];
    personalization[..12].copy_from_slice(SIGHASH_PERSONALIZATION_PREFIX);
    personalization[12..].copy_from_slice(&CONSENSUS_BRANCH_ID.to_le_bytes());

    let mut buf = Vec::with_capacity(261 + script_code.len());
    buf.extend_from_slice(&Transaction::header().to_le_bytes());
    buf.extend_from_slice(&crate::constants::VERSION_GROUP_ID.to_le_bytes());
    buf.extend_from_slice(&hash_prevouts(&tx.inputs));
    buf.extend_from_slice(&hash_sequence(&tx.inputs));
    buf.extend_from_slice(&hash_outputs(tx));
    // hashJoinSplits, hashShieldedSpends, hashShieldedOutputs: all empty.
    buf.extend_from_slice(&[0u8; 96]);
    buf.extend_from_slice(&tx.lock_time.to_le_bytes());
    buf.extend_from_slice(&tx.expiry_height.to_le_bytes());
    buf.extend_from_slice(&0i64.to_le_bytes()); // valueBalance
    buf.extend_from_slice(&hash_type.to_le_bytes());
    buf.extend_from_slice(input.previous_output.txid.as_bytes());
    buf.extend_from_slice(&input.previous_output.vout.to_le_bytes());
    write_varint(&mut buf, script_code.len() as u64);
    buf.extend_from_slice(script_code);
    buf.extend_from_slice(&amount.to_le_bytes());
    buf.extend_from_slice(&input.sequence.to_le_bytes());

    Ok(blake2b_256(&personalization, &buf))
}
