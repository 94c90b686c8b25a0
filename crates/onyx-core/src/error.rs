//! Error types for the Onyx chain primitives.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid payload length: {0}")] InvalidLength(usize),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid version byte: got {got:#04x}, expected {expected:#04x}")] InvalidVersion { got: u8, expected: u8 },
    #[error("invalid WIF length: {0}")] InvalidWifLength(usize),
    #[error("invalid WIF compression flag: {0:#04x}")] InvalidCompressionFlag(u8),
    #[error("unknown network: {0}")] UnknownNetwork(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid txid: {0}")] InvalidTxid(String),
    #[error("empty inputs or outputs")] EmptyInputsOrOutputs,
    #[error("script too large: {0} bytes")] OversizedScript(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret key bytes")] InvalidSecretKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error(transparent)] Crypto(#[from] CryptoError),
}
