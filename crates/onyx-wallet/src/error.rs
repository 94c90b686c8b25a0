//! Wallet error taxonomy.
//!
//! Every fallible wallet operation returns one of these variants; nothing
//! degrades silently and nothing retries. Core codec and crypto errors pass
//! through transparently.

use onyx_core::{AddressError, CryptoError, TransactionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    /// A caller-supplied amount is zero, above `MAX_MONEY`, or overflows.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Mnemonic failed wordlist or checksum validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The available UTXOs cannot cover the target plus fee.
    #[error("insufficient funds: have {have} satoshis, need {need}")]
    InsufficientFunds { have: u64, need: u64 },

    /// Wrong password, or ciphertext tampered with. Indistinguishable by
    /// construction.
    #[error("authentication failed: wrong password or corrupted data")]
    AuthenticationFailed,

    /// An encrypted blob that cannot even be parsed into its layout.
    #[error("corrupted blob: {0}")]
    CorruptedBlob(String),

    /// A wallet file that fails magic, version, or structural checks.
    #[error("corrupted wallet file: {0}")]
    CorruptedFile(String),

    /// A spend for this address is already being prepared.
    #[error("spend already in progress for {0}")]
    SpendInProgress(String),

    /// BIP32 derivation failure (bad seed length, invalid tweak, depth
    /// overflow, malformed extended key).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// The OS entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// An internal consistency check failed. Never expected in practice.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("wallet file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("wallet serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
