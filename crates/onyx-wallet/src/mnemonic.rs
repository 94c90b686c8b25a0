//! BIP39 mnemonic generation, validation, and seed stretching.
//!
//! Wallets are always backed by a 24-word English mnemonic (32 bytes of OS
//! entropy). Validation normalizes whitespace and case before checking the
//! wordlist and checksum, so a phrase pasted with stray spaces or capitals
//! still restores the same wallet.

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::hd::Seed;

/// Number of words in every generated mnemonic.
pub const MNEMONIC_WORDS: usize = 24;

/// Generate a fresh 24-word mnemonic from 32 bytes of OS entropy.
pub fn generate_mnemonic() -> Result<String, WalletError> {
    let mut entropy = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| WalletError::Entropy(e.to_string()))?;
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .expect("32 bytes of entropy always forms a valid 24-word mnemonic");
    entropy.zeroize();
    Ok(mnemonic.to_string())
}

/// Collapse runs of whitespace and lowercase the phrase.
pub fn normalize_mnemonic(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check wordlist membership and checksum.
pub fn validate_mnemonic(phrase: &str) -> Result<(), WalletError> {
    parse(phrase).map(|_| ())
}

/// Stretch a mnemonic into the 64-byte BIP39 seed.
///
/// PBKDF2-HMAC-SHA512, 2048 rounds, salt `"mnemonic" + passphrase`. The
/// phrase is validated first; a typo'd word never silently derives a
/// different wallet.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Seed, WalletError> {
    let mnemonic = parse(phrase)?;
    Ok(Seed::from_bytes(mnemonic.to_seed(passphrase)))
}

fn parse(phrase: &str) -> Result<Mnemonic, WalletError> {
    Mnemonic::parse_in(Language::English, &normalize_mnemonic(phrase))
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}
