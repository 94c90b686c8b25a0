//! Protocol constants. All monetary values in satoshis (1 ONX = 10^8 satoshis).

pub const COIN: u64 = 100_000_000;

/// Upper bound on any single amount accepted at an input boundary.
///
/// Satoshi arithmetic is done in `u64` with explicit overflow checks; this
/// cap keeps sums of realistic UTXO sets far away from the checked range.
///
/// # Examples
///
/// ```
/// use onyx_core::constants::{COIN, MAX_MONEY};
/// assert_eq!(MAX_MONEY, 200_000_000 * COIN);
/// ```
pub const MAX_MONEY: u64 = 200_000_000 * COIN;

/// Minimum economical output value. Change at or below this threshold is
/// folded into the transaction fee instead of creating an output.
pub const DUST_THRESHOLD: u64 = 546;

/// Transaction format version (Sapling).
pub const TX_VERSION: u32 = 4;

/// High bit of the serialized version field, marking post-Overwinter format.
pub const OVERWINTER_FLAG: u32 = 1 << 31;

/// Version group id for Sapling-format transactions.
///
/// Serialized little-endian directly after the header; the network rejects
/// version-4 transactions without this marker.
///
/// # Examples
///
/// ```
/// use onyx_core::constants::VERSION_GROUP_ID;
/// assert_eq!(VERSION_GROUP_ID.to_le_bytes(), [0x85, 0x20, 0x2F, 0x89]);
/// ```
pub const VERSION_GROUP_ID: u32 = 0x892F_2085;

/// Consensus branch id bound into every signature hash.
pub const CONSENSUS_BRANCH_ID: u32 = 0x76B8_09BB;

/// Signature hash mode committing to all inputs and outputs.
pub const SIGHASH_ALL: u32 = 1;

/// Default input sequence (no relative locktime).
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Hash160 output length: RIPEMD160 over SHA-256.
pub const HASH160_LEN: usize = 20;
