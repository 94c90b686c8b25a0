//! # onyx-core
//!
//! Chain primitives for the Onyx wallet: network parameters, P2PKH address
//! and WIF codecs, transaction types with consensus serialization, P2PKH
//! script assembly, the Sapling signature hash, and secp256k1 key handling.
//!
//! This crate is deliberately free of wallet policy. Everything here is a
//! pure function of its inputs: no I/O, no global state, and every
//! network-dependent operation takes an explicit
//! [`NetworkParams`](network::NetworkParams) reference.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod network;
pub mod script;
pub mod sighash;
pub mod types;

pub use address::{decode_wif, encode_wif, Address, DecodedWif};
pub use crypto::KeyPair;
pub use error::{AddressError, CoreError, CryptoError, TransactionError};
pub use network::{Network, NetworkParams, MAINNET, TESTNET};
pub use types::{OutPoint, Transaction, TxInput, TxOutput, Txid};
