//! # onyx-wallet
//!
//! Wallet logic for Onyx on top of `onyx-core`:
//!
//! - [`mnemonic`]: BIP39 generation, validation, seed stretching
//! - [`hd`]: BIP32 derivation at the fixed wallet path
//! - [`vault`]: password-based AES-256-GCM secret storage
//! - [`coin_selection`]: largest-first selection with a static fee heuristic
//! - [`builder`]: transaction assembly and signing
//! - [`reservation`]: per-address spend locks
//! - [`wallet`]: the persisted wallet record and spend façade

pub mod builder;
pub mod coin_selection;
pub mod error;
pub mod hd;
pub mod mnemonic;
pub mod reservation;
pub mod vault;
pub mod wallet;

pub use builder::{SignedSpend, TransactionBuilder, UnsignedSpend};
pub use coin_selection::{CoinSelection, CoinSelector, WalletUtxo};
pub use error::WalletError;
pub use hd::{derive_wallet_keys, DerivationPath, ExtendedPrivKey, ExtendedPubKey, Seed, WalletKeys};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, validate_mnemonic};
pub use reservation::{SpendLockRegistry, SpendReservation};
pub use wallet::{Wallet, WalletRecord};
