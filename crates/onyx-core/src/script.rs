//! P2PKH script assembly and inspection.
//!
//! ```text
//! scriptPubKey = OP_DUP OP_HASH160 <20> hash160 OP_EQUALVERIFY OP_CHECKSIG   25 bytes
//! scriptSig    = push(der_sig || sighash_byte) push(compressed_pubkey)
//! ```
//!
//! Only the P2PKH form is produced or recognized; every output this core
//! builds locks to a 20-byte pubkey hash.

use crate::constants::HASH160_LEN;
use crate::error::TransactionError;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xA9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xAC;

/// Serialized length of a P2PKH locking script.
pub const P2PKH_SCRIPT_LEN: usize = 25;

/// Largest payload a single-byte push opcode can carry.
const MAX_PUSH: usize = 75;

/// Locking script paying to the given pubkey hash.
pub fn p2pkh_script_pubkey(hash: &[u8; HASH160_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(P2PKH_SCRIPT_LEN);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(HASH160_LEN as u8);
    script.extend_from_slice(hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Unlocking script for a P2PKH input: pushed signature, pushed pubkey.
///
/// `signature` must already carry its trailing sighash-type byte.
pub fn p2pkh_script_sig(signature: &[u8], pubkey: &[u8; 33]) -> Result<Vec<u8>, TransactionError> {
    if signature.len() > MAX_PUSH {
        return Err(TransactionError::OversizedScript(signature.len()));
    }
    let mut script = Vec::with_capacity(1 + signature.len() + 1 + pubkey.len());
    script.push(signature.len() as u8);
    script.extend_from_slice(signature);
    script.push(pubkey.len() as u8);
    script.extend_from_slice(pubkey);
    Ok(script)
}

/// Extract the pubkey hash from a P2PKH locking script, if it is one.
pub fn script_pubkey_to_hash160(script: &[u8]) -> Option<[u8; HASH160_LEN]> {
    if script.len() != P2PKH_SCRIPT_LEN
        || script[0] != OP_DUP
        || script[1] != OP_HASH160
        || script[2] != HASH160_LEN as u8
        || script[23] != OP_EQUALVERIFY
        || script[24] != OP_CHECKSIG
    {
        return None;
    }
    let mut hash = [0u8; HASH160_LEN];
    hash.copy_from_slice(&script[3..23]);
    Some(hash)
}
