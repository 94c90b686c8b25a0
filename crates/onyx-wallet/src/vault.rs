//! Password-based secret vault.
//!
//! # Blob format
//!
//! ```text
//! base64( salt(16) || iv(12) || tag(16) || ciphertext(N) )
//! ```
//!
//! The key is PBKDF2-HMAC-SHA256 over the password with the embedded salt,
//! 100_000 iterations, 32 bytes. Encryption is AES-256-GCM; the tag
//! authenticates every byte, so a wrong password and a flipped ciphertext
//! bit are indistinguishable and both surface as
//! [`WalletError::AuthenticationFailed`]. Iteration count and layout are
//! fixed; changing them is a format break.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// PBKDF2-HMAC-SHA256 round count. Fixed format constant.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Smallest well-formed blob: salt, nonce, and tag with empty ciphertext.
pub const MIN_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

const KEY_LEN: usize = 32;

fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut());
    key
}

/// Encrypt a secret string under a password.
pub fn encrypt(plaintext: &str, password: &str) -> Result<String, WalletError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .and_then(|_| OsRng.try_fill_bytes(&mut nonce))
        .map_err(|e| WalletError::Entropy(e.to_string()))?;

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| WalletError::Invariant("AES-GCM encryption failed".into()))?;

    // aes-gcm appends the tag; the blob stores it before the ciphertext.
    let tag_start = sealed.len() - TAG_LEN;
    let mut blob = Vec::with_capacity(MIN_BLOB_LEN + tag_start);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed[tag_start..]);
    blob.extend_from_slice(&sealed[..tag_start]);
    sealed.zeroize();

    Ok(BASE64.encode(blob))
}

/// Decrypt a vault blob. Returns the plaintext in a zeroizing wrapper.
pub fn decrypt(blob: &str, password: &str) -> Result<Zeroizing<String>, WalletError> {
    let bytes = BASE64
        .decode(blob.trim())
        .map_err(|e| WalletError::CorruptedBlob(format!("not base64: {e}")))?;
    if bytes.len() < MIN_BLOB_LEN {
        return Err(WalletError::CorruptedBlob(format!(
            "blob is {} bytes, minimum is {MIN_BLOB_LEN}",
            bytes.len()
        )));
    }

    let (salt, rest) = bytes.split_at(SALT_LEN);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    // Reassemble into the ciphertext || tag order aes-gcm expects.
    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
        .map_err(|_| WalletError::AuthenticationFailed)?;

    let result = String::from_utf8(plaintext.clone())
        .map(Zeroizing::new)
        .map_err(|_| WalletError::CorruptedBlob("plaintext is not UTF-8".into()));
    plaintext.zeroize();
    result
}
