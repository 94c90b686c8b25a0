//! secp256k1 key handling, input signing, and signed messages.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroize;

use crate::address::Address;
use crate::constants::SIGHASH_ALL;
use crate::error::CryptoError;
use crate::hash::sha256d;
use crate::network::NetworkParams;
use crate::sighash::signature_hash;
use crate::types::{write_varint, Transaction};

/// A secp256k1 keypair. The public key is always handled compressed.
///
/// `Debug` prints the public key only; the secret never leaves the struct
/// except through [`KeyPair::secret_bytes`].
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh keypair from OS entropy.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let mut bytes = [0u8; 32];
        loop {
            OsRng.fill_bytes(&mut bytes);
            // All-zero or >= curve order bytes are rejected; retry.
            if let Ok(secret) = SecretKey::from_slice(&bytes) {
                bytes.zeroize();
                let public = PublicKey::from_secret_key(&secp, &secret);
                return Self { secret, public };
            }
        }
    }

    /// Rebuild a keypair from a 32-byte secret scalar.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self { secret, public })
    }

    /// The public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The 33-byte compressed public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }

    /// The 32-byte secret scalar. Callers should zeroize the copy.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// P2PKH address of the compressed public key under `params`.
    pub fn address(&self, params: &NetworkParams) -> Address {
        Address::from_pubkey(&self.public_key_bytes(), params)
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        // SecretKey does not erase itself; overwrite the scalar before the
        // backing memory is released.
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public_key_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Sign one transparent input under SIGHASH_ALL.
///
/// Returns the DER signature with the sighash-type byte appended, ready
/// to be pushed into a scriptSig.
pub fn sign_input(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: u64,
    keypair: &KeyPair,
) -> Result<Vec<u8>, CryptoError> {
    let digest = signature_hash(tx, input_index, script_code, amount, SIGHASH_ALL)?;
    let secp = Secp256k1::new();
    let signature = secp.sign_ecdsa(&Message::from_digest(digest), &keypair.secret);
    let mut bytes = signature.serialize_der().to_vec();
    bytes.push(SIGHASH_ALL as u8);
    Ok(bytes)
}

/// Verify a scriptSig-style signature (DER plus sighash byte) for one input.
pub fn verify_input(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: u64,
    signature: &[u8],
    pubkey: &[u8],
) -> Result<(), CryptoError> {
    let Some((&hash_type, der)) = signature.split_last() else {
        return Err(CryptoError::InvalidSignature);
    };
    if u32::from(hash_type) != SIGHASH_ALL {
        return Err(CryptoError::InvalidSignature);
    }
    let digest = signature_hash(tx, input_index, script_code, amount, SIGHASH_ALL)?;
    let signature = Signature::from_der(der).map_err(|_| CryptoError::InvalidSignature)?;
    let pubkey = PublicKey::from_slice(pubkey).map_err(|_| CryptoError::InvalidPublicKey)?;
    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&Message::from_digest(digest), &signature, &pubkey)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Digest for signed messages: double SHA-256 over the varint-prefixed
/// network message prefix followed by the varint-prefixed message.
fn message_digest(message: &str, params: &NetworkParams) -> [u8; 32] {
    let mut buf = Vec::with_capacity(params.message_prefix.len() + message.len() + 10);
    write_varint(&mut buf, params.message_prefix.len() as u64);
    buf.extend_from_slice(params.message_prefix.as_bytes());
    write_varint(&mut buf, message.len() as u64);
    buf.extend_from_slice(message.as_bytes());
    sha256d(&buf)
}

/// Sign an arbitrary message, producing the 65-byte recoverable signature
/// in base64. The header byte is `27 + recovery_id + 4` (compressed key).
pub fn sign_message(message: &str, keypair: &KeyPair, params: &NetworkParams) -> String {
    let secp = Secp256k1::new();
    let msg = Message::from_digest(message_digest(message, params));
    let signature = secp.sign_ecdsa_recoverable(&msg, &keypair.secret);
    let (rec_id, compact) = signature.serialize_compact();
    let mut bytes = [0u8; 65];
    bytes[0] = 27 + rec_id.to_i32() as u8 + 4;
    bytes[1..].copy_from_slice(&compact);
    BASE64.encode(bytes)
}

/// Verify a base64 message signature against the claimed P2PKH address.
///
/// Recovers the public key from the signature and compares its address;
/// `Ok(false)` means the signature is well-formed but made by another key.
pub fn verify_message(
    message: &str,
    signature: &str,
    address: &Address,
    params: &NetworkParams,
) -> Result<bool, CryptoError> {
    let bytes = BASE64
        .decode(signature.trim())
        .map_err(|_| CryptoError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(CryptoError::InvalidSignature);
    }
    let header = bytes[0];
    if !(27..=34).contains(&header) {
        return Err(CryptoError::InvalidSignature);
    }
    let rec_id = RecoveryId::from_i32(i32::from((header - 27) & 3))
        .map_err(|_| CryptoError::InvalidSignature)?;
    let compressed = header >= 31;
    let signature = RecoverableSignature::from_compact(&bytes[1..], rec_id)
        .map_err(|_| CryptoError::InvalidSignature)?;
    let secp = Secp256k1::new();
    let msg = Message::from_digest(message_digest(message, params));
    let pubkey = secp
        .recover_ecdsa(&msg, &signature)
        .map_err(|_| CryptoError::VerificationFailed)?;
    let recovered = if compressed {
        Address::from_pubkey(&pubkey.serialize(), params)
    } else {
        Address::from_pubkey(&pubkey.serialize_uncompressed(), params)
    };
    Ok(&recovered == address)
}
