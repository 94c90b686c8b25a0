//! P2PKH address and WIF private-key codecs.
//!
//! # Wire format
//!
//! ```text
//! address = base58check( pubkey_hash_version(1) || hash160(20) )      34 chars
//! wif     = base58check( wif_version(1) || scalar(32) || 0x01? )      52 chars compressed
//! ```
//!
//! base58check appends a 4-byte double-SHA256 checksum before base58
//! encoding; decoding rejects any string whose checksum does not verify, so
//! a corrupted address is never silently accepted.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::HASH160_LEN;
use crate::error::AddressError;
use crate::hash::hash160;
use crate::network::NetworkParams;

/// Decoded address payload length: version byte plus hash160.
pub const ADDRESS_PAYLOAD_LEN: usize = 1 + HASH160_LEN;

/// Every Onyx P2PKH address encodes to exactly this many characters.
pub const ADDRESS_LEN: usize = 34;

/// A P2PKH address: a version byte plus the hash160 of a compressed public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    version: u8,
    hash160: [u8; HASH160_LEN],
}

impl Address {
    /// Build an address from an already-computed pubkey hash.
    pub fn from_pubkey_hash(hash: [u8; HASH160_LEN], params: &NetworkParams) -> Self {
        Self { version: params.pubkey_hash, hash160: hash }
    }

    /// Build an address from a serialized (compressed) public key.
    pub fn from_pubkey(pubkey: &[u8], params: &NetworkParams) -> Self {
        Self::from_pubkey_hash(hash160(pubkey), params)
    }

    /// Decode an address string without pinning it to a network.
    ///
    /// The version byte is preserved; use [`Address::decode`] when the
    /// caller knows which network the address must belong to.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let payload = base58check_decode(s)?;
        if payload.len() != ADDRESS_PAYLOAD_LEN {
            return Err(AddressError::InvalidLength(payload.len()));
        }
        let mut hash = [0u8; HASH160_LEN];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self { version: payload[0], hash160: hash })
    }

    /// Decode an address string, requiring the pubkey-hash version byte of
    /// `params`.
    pub fn decode(s: &str, params: &NetworkParams) -> Result<Self, AddressError> {
        let addr = Self::parse(s)?;
        if addr.version != params.pubkey_hash {
            return Err(AddressError::InvalidVersion {
                got: addr.version,
                expected: params.pubkey_hash,
            });
        }
        Ok(addr)
    }

    /// Encode to the 34-character base58check string.
    pub fn encode(&self) -> String {
        let mut payload = [0u8; ADDRESS_PAYLOAD_LEN];
        payload[0] = self.version;
        payload[1..].copy_from_slice(&self.hash160);
        bs58::encode(payload).with_check().into_string()
    }

    /// The version byte this address was encoded with.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The 20-byte pubkey hash.
    pub fn hash160(&self) -> &[u8; HASH160_LEN] {
        &self.hash160
    }

    /// Whether this address carries the pubkey-hash version of `params`.
    pub fn matches_network(&self, params: &NetworkParams) -> bool {
        self.version == params.pubkey_hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}

/// A private key decoded from WIF. The scalar is wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DecodedWif {
    scalar: [u8; 32],
    compressed: bool,
}

impl DecodedWif {
    /// The 32-byte secret scalar.
    pub fn scalar(&self) -> &[u8; 32] {
        &self.scalar
    }

    /// Whether the WIF carried the 0x01 compressed-pubkey flag.
    pub fn compressed(&self) -> bool {
        self.compressed
    }
}

impl fmt::Debug for DecodedWif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedWif")
            .field("scalar", &"[REDACTED]")
            .field("compressed", &self.compressed)
            .finish()
    }
}

/// Encode a secret scalar as WIF under the given network's version byte.
pub fn encode_wif(scalar: &[u8; 32], params: &NetworkParams, compressed: bool) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(params.wif);
    payload.extend_from_slice(scalar);
    if compressed {
        payload.push(0x01);
    }
    let encoded = bs58::encode(&payload).with_check().into_string();
    payload.zeroize();
    encoded
}

/// Decode a WIF string, requiring the version byte of `params`.
pub fn decode_wif(s: &str, params: &NetworkParams) -> Result<DecodedWif, AddressError> {
    let mut payload = base58check_decode(s.trim())?;
    let result = parse_wif_payload(&payload, params);
    payload.zeroize();
    result
}

fn parse_wif_payload(payload: &[u8], params: &NetworkParams) -> Result<DecodedWif, AddressError> {
    if payload.is_empty() {
        return Err(AddressError::InvalidWifLength(0));
    }
    if payload[0] != params.wif {
        return Err(AddressError::InvalidVersion { got: payload[0], expected: params.wif });
    }
    let compressed = match payload.len() {
        33 => false,
        34 => {
            if payload[33] != 0x01 {
                return Err(AddressError::InvalidCompressionFlag(payload[33]));
            }
            true
        }
        len => return Err(AddressError::InvalidWifLength(len)),
    };
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&payload[1..33]);
    Ok(DecodedWif { scalar, compressed })
}

fn base58check_decode(s: &str) -> Result<Vec<u8>, AddressError> {
    bs58::decode(s).with_check(None).into_vec().map_err(|e| match e {
        bs58::decode::Error::InvalidChecksum { .. } | bs58::decode::Error::NoChecksum => {
            AddressError::InvalidChecksum
        }
        other => AddressError::InvalidBase58(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{MAINNET, TESTNET};

    fn sample_hash() -> [u8; 20] {
        let mut h = [0u8; 20];
        for (i, byte) in h.iter_mut().enumerate() {
            *byte = i as u8;
        }
        h
    }

    // --- Encoding ---

    #[test]
    fn mainnet_addresses_are_34_chars_starting_with_r() {
        for hash in [[0x00; 20], [0xFF; 20], sample_hash()] {
            let addr = Address::from_pubkey_hash(hash, &MAINNET);
            let s = addr.encode();
            assert_eq!(s.len(), ADDRESS_LEN, "address: {s}");
            assert!(s.starts_with('R'), "address: {s}");
        }
    }

    #[test]
    fn testnet_addresses_are_34_chars_starting_with_m_or_n() {
        for hash in [[0x00; 20], [0xFF; 20], sample_hash()] {
            let addr = Address::from_pubkey_hash(hash, &TESTNET);
            let s = addr.encode();
            assert_eq!(s.len(), ADDRESS_LEN, "address: {s}");
            assert!(s.starts_with('m') || s.starts_with('n'), "address: {s}");
        }
    }

    #[test]
    fn from_pubkey_hashes_the_key() {
        let pubkey = [0x02u8; 33];
        let addr = Address::from_pubkey(&pubkey, &MAINNET);
        assert_eq!(addr.hash160(), &hash160(&pubkey));
    }

    // --- Decoding ---

    #[test]
    fn decode_rejects_flipped_character() {
        let addr = Address::from_pubkey_hash(sample_hash(), &MAINNET);
        let s = addr.encode();
        // Swap the final character for a different alphabet member.
        let mut corrupted = s[..s.len() - 1].to_string();
        corrupted.push(if s.ends_with('2') { '3' } else { '2' });
        assert_eq!(
            Address::parse(&corrupted).unwrap_err(),
            AddressError::InvalidChecksum
        );
    }

    #[test]
    fn decode_rejects_invalid_alphabet() {
        // '0', 'O', 'I', 'l' are not base58.
        let err = Address::parse("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl00").unwrap_err();
        assert!(matches!(err, AddressError::InvalidBase58(_)));
    }

    #[test]
    fn decode_rejects_empty_and_short_strings() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("R").is_err());
    }

    #[test]
    fn decode_rejects_wrong_payload_length() {
        // A valid base58check string encoding 5 bytes, not 21.
        let short = bs58::encode([1u8, 2, 3, 4, 5]).with_check().into_string();
        assert_eq!(
            Address::parse(&short).unwrap_err(),
            AddressError::InvalidLength(5)
        );
    }

    #[test]
    fn decode_enforces_network_version() {
        let mainnet_addr = Address::from_pubkey_hash(sample_hash(), &MAINNET).encode();
        let err = Address::decode(&mainnet_addr, &TESTNET).unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidVersion { got: MAINNET.pubkey_hash, expected: TESTNET.pubkey_hash }
        );
        assert!(Address::decode(&mainnet_addr, &MAINNET).is_ok());
    }

    // --- Round-trips ---

    #[test]
    fn encode_decode_roundtrip_preserves_version_and_hash() {
        for params in [&MAINNET, &TESTNET] {
            let addr = Address::from_pubkey_hash(sample_hash(), params);
            let decoded = Address::decode(&addr.encode(), params).unwrap();
            assert_eq!(decoded.version(), params.pubkey_hash);
            assert_eq!(decoded.hash160(), &sample_hash());
            assert_eq!(decoded, addr);
        }
    }

    // --- Accessors ---

    #[test]
    fn matches_network_checks_version() {
        let addr = Address::from_pubkey_hash(sample_hash(), &MAINNET);
        assert!(addr.matches_network(&MAINNET));
        assert!(!addr.matches_network(&TESTNET));
    }

    // --- Display / FromStr ---

    #[test]
    fn display_and_fromstr_roundtrip() {
        let addr = Address::from_pubkey_hash(sample_hash(), &MAINNET);
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    // --- Serde ---

    #[test]
    fn serde_roundtrip_as_string() {
        let addr = Address::from_pubkey_hash(sample_hash(), &MAINNET);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn serde_rejects_corrupted_string() {
        let result: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(result.is_err());
    }

    // --- WIF ---

    #[test]
    fn wif_compressed_is_52_chars_starting_with_u() {
        let scalar = [0x11u8; 32];
        let wif = encode_wif(&scalar, &MAINNET, true);
        assert_eq!(wif.len(), 52, "wif: {wif}");
        assert!(wif.starts_with('U'), "wif: {wif}");
    }

    #[test]
    fn wif_roundtrip_compressed_and_uncompressed() {
        let scalar = [0x42u8; 32];
        for compressed in [true, false] {
            let wif = encode_wif(&scalar, &MAINNET, compressed);
            let decoded = decode_wif(&wif, &MAINNET).unwrap();
            assert_eq!(decoded.scalar(), &scalar);
            assert_eq!(decoded.compressed(), compressed);
        }
    }

    #[test]
    fn wif_rejects_wrong_network() {
        let wif = encode_wif(&[0x42u8; 32], &MAINNET, true);
        let err = decode_wif(&wif, &TESTNET).unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidVersion { got: MAINNET.wif, expected: TESTNET.wif }
        );
    }

    #[test]
    fn wif_rejects_corrupted_checksum() {
        let wif = encode_wif(&[0x42u8; 32], &MAINNET, true);
        let mut corrupted = wif[..wif.len() - 1].to_string();
        corrupted.push(if wif.ends_with('2') { '3' } else { '2' });
        assert_eq!(
            decode_wif(&corrupted, &MAINNET).unwrap_err(),
            AddressError::InvalidChecksum
        );
    }

    #[test]
    fn wif_rejects_bad_compression_flag() {
        // Hand-build a payload with flag 0x02 instead of 0x01.
        let mut payload = vec![MAINNET.wif];
        payload.extend_from_slice(&[0x42u8; 32]);
        payload.push(0x02);
        let wif = bs58::encode(payload).with_check().into_string();
        assert_eq!(
            decode_wif(&wif, &MAINNET).unwrap_err(),
            AddressError::InvalidCompressionFlag(0x02)
        );
    }

    #[test]
    fn wif_rejects_bad_length() {
        let mut payload = vec![MAINNET.wif];
        payload.extend_from_slice(&[0x42u8; 16]);
        let wif = bs58::encode(payload).with_check().into_string();
        assert_eq!(
            decode_wif(&wif, &MAINNET).unwrap_err(),
            AddressError::InvalidWifLength(17)
        );
    }

    #[test]
    fn wif_decode_trims_whitespace() {
        let wif = encode_wif(&[0x42u8; 32], &MAINNET, true);
        let padded = format!("  {wif}\n");
        assert!(decode_wif(&padded, &MAINNET).is_ok());
    }

    #[test]
    fn decoded_wif_debug_redacts_scalar() {
        let wif = encode_wif(&[0x42u8; 32], &MAINNET, true);
        let decoded = decode_wif(&wif, &MAINNET).unwrap();
        let debug = format!("{decoded:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("66")); // 0x42
    }

    // --- Error display ---

    #[test]
    fn error_messages_are_descriptive() {
        let err = AddressError::InvalidVersion { got: 0x3C, expected: 0x6F };
        assert!(err.to_string().contains("0x3c"));
        assert!(AddressError::InvalidChecksum.to_string().contains("checksum"));
    }
}
