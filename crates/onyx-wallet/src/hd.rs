//! BIP32 hierarchical key derivation.
//!
//! A wallet derives exactly one signing key, at the fixed path
//! [`ACCOUNT_PATH`] (`m/44'/141'/0'/0/0`). The full CKDpriv/CKDpub machinery
//! is here because extended keys also serialize to the standard 78-byte
//! Base58Check form under the active network's version bytes, and restores
//! must match other wallets bit for bit.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use onyx_core::address::{encode_wif, Address};
use onyx_core::crypto::KeyPair;
use onyx_core::hash::hash160;
use onyx_core::network::NetworkParams;

use crate::error::WalletError;

type HmacSha512 = Hmac<Sha512>;

/// First hardened child index.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// The single derivation path every Onyx wallet uses.
pub const ACCOUNT_PATH: &str = "m/44'/141'/0'/0/0";

/// Serialized extended-key payload length (without checksum).
const EXTENDED_KEY_LEN: usize = 78;

/// A BIP39 seed: 64 bytes, wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Wrap raw seed bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The seed bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Seed").field(&"[REDACTED]").finish()
    }
}

/// A parsed derivation path such as `m/44'/141'/0'/0/0`.
///
/// Hardened components are stored with [`HARDENED_OFFSET`] already added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    /// The child indices, root first.
    pub fn indices(&self) -> &[u32] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        if parts.next() != Some("m") {
            return Err(WalletError::KeyDerivation(format!(
                "derivation path must start with 'm': {s}"
            )));
        }
        let mut indices = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let index: u32 = digits.parse().map_err(|_| {
                WalletError::KeyDerivation(format!("bad path component: {part}"))
            })?;
            if index >= HARDENED_OFFSET {
                return Err(WalletError::KeyDerivation(format!(
                    "path component out of range: {part}"
                )));
            }
            indices.push(if hardened { index + HARDENED_OFFSET } else { index });
        }
        Ok(Self(indices))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for &index in &self.0 {
            if index >= HARDENED_OFFSET {
                write!(f, "/{}'", index - HARDENED_OFFSET)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

/// A BIP32 extended private key.
#[derive(Clone)]
pub struct ExtendedPrivKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_index: u32,
    pub chain_code: [u8; 32],
    pub private_key: SecretKey,
}

impl ExtendedPrivKey {
    /// Master key from a seed (HMAC-SHA512 keyed `"Bitcoin seed"`).
    ///
    /// Accepts 16..=64 byte seeds, per BIP32.
    pub fn new_master(seed: &[u8]) -> Result<Self, WalletError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(WalletError::KeyDerivation(format!(
                "seed must be 16..=64 bytes, got {}",
                seed.len()
            )));
        }
        let mut mac = HmacSha512::new_from_slice(b"Bitcoin seed")
            .expect("HMAC accepts any key length");
        mac.update(seed);
        let digest = mac.finalize().into_bytes();
        let private_key = SecretKey::from_slice(&digest[..32])
            .map_err(|_| WalletError::KeyDerivation("master key outside curve order".into()))?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);
        Ok(Self {
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
            chain_code,
            private_key,
        })
    }

    /// CKDpriv: derive one child. Indices at or above [`HARDENED_OFFSET`]
    /// are hardened and commit to the parent private key.
    pub fn derive_child(&self, index: u32) -> Result<Self, WalletError> {
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            WalletError::KeyDerivation("derivation depth overflow".into())
        })?;
        let secp = Secp256k1::new();
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .expect("HMAC accepts any key length");
        if index >= HARDENED_OFFSET {
            mac.update(&[0u8]);
            mac.update(&self.private_key.secret_bytes());
        } else {
            mac.update(&PublicKey::from_secret_key(&secp, &self.private_key).serialize());
        }
        mac.update(&index.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        let tweak_bytes: [u8; 32] = digest[..32].try_into().expect("HMAC-SHA512 left half");
        let tweak = Scalar::from_be_bytes(tweak_bytes)
            .map_err(|_| WalletError::KeyDerivation("child tweak outside curve order".into()))?;
        let private_key = self
            .private_key
            .add_tweak(&tweak)
            .map_err(|_| WalletError::KeyDerivation("derived child key is invalid".into()))?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        Ok(Self {
            depth,
            parent_fingerprint: self.fingerprint(),
            child_index: index,
            chain_code,
            private_key,
        })
    }

    /// Derive along a full path.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, WalletError> {
        let mut key = self.clone();
        for &index in path.indices() {
            key = key.derive_child(index)?;
        }
        Ok(key)
    }

    /// The matching extended public key.
    pub fn extended_pub(&self) -> ExtendedPubKey {
        let secp = Secp256k1::new();
        ExtendedPubKey {
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            chain_code: self.chain_code,
            public_key: PublicKey::from_secret_key(&secp, &self.private_key),
        }
    }

    /// First four bytes of hash160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        self.extended_pub().fingerprint()
    }

    /// Serialize to the 78-byte Base58Check form under `params`.
    pub fn to_base58(&self, params: &NetworkParams) -> String {
        let mut payload = Vec::with_capacity(EXTENDED_KEY_LEN);
        payload.extend_from_slice(&params.bip32_private);
        payload.push(self.depth);
        payload.extend_from_slice(&self.parent_fingerprint);
        payload.extend_from_slice(&self.child_index.to_be_bytes());
        payload.extend_from_slice(&self.chain_code);
        payload.push(0x00);
        payload.extend_from_slice(&self.private_key.secret_bytes());
        let encoded = bs58::encode(&payload).with_check().into_string();
        payload.zeroize();
        encoded
    }

    /// Parse a Base58Check extended private key under `params`.
    pub fn from_base58(s: &str, params: &NetworkParams) -> Result<Self, WalletError> {
        let mut payload = decode_extended(s, &params.bip32_private)?;
        let result = (|| {
            if payload[45] != 0x00 {
                return Err(WalletError::KeyDerivation(
                    "extended private key data must start with 0x00".into(),
                ));
            }
            let private_key = SecretKey::from_slice(&payload[46..78]).map_err(|_| {
                WalletError::KeyDerivation("extended private key outside curve order".into())
            })?;
            let (depth, parent_fingerprint, child_index, chain_code) = split_metadata(&payload)?;
            Ok(Self { depth, parent_fingerprint, child_index, chain_code, private_key })
        })();
        payload.zeroize();
        result
    }
}

impl fmt::Debug for ExtendedPrivKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivKey")
            .field("depth", &self.depth)
            .field("child_index", &self.child_index)
            .field("private_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// A BIP32 extended public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPubKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_index: u32,
    pub chain_code: [u8; 32],
    pub public_key: PublicKey,
}

impl ExtendedPubKey {
    /// CKDpub: derive one non-hardened child.
    pub fn derive_child(&self, index: u32) -> Result<Self, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::KeyDerivation(
                "cannot derive a hardened child from a public key".into(),
            ));
        }
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            WalletError::KeyDerivation("derivation depth overflow".into())
        })?;
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .expect("HMAC accepts any key length");
        mac.update(&self.public_key.serialize());
        mac.update(&index.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        let tweak_bytes: [u8; 32] = digest[..32].try_into().expect("HMAC-SHA512 left half");
        let tweak = Scalar::from_be_bytes(tweak_bytes)
            .map_err(|_| WalletError::KeyDerivation("child tweak outside curve order".into()))?;
        let secp = Secp256k1::new();
        let public_key = self
            .public_key
            .add_exp_tweak(&secp, &tweak)
            .map_err(|_| WalletError::KeyDerivation("derived child key is invalid".into()))?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        Ok(Self {
            depth,
            parent_fingerprint: self.fingerprint(),
            child_index: index,
            chain_code,
            public_key,
        })
    }

    /// First four bytes of hash160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.public_key.serialize());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Serialize to the 78-byte Base58Check form under `params`.
    pub fn to_base58(&self, params: &NetworkParams) -> String {
        let mut payload = Vec::with_capacity(EXTENDED_KEY_LEN);
        payload.extend_from_slice(&params.bip32_public);
        payload.push(self.depth);
        payload.extend_from_slice(&self.parent_fingerprint);
        payload.extend_from_slice(&self.child_index.to_be_bytes());
        payload.extend_from_slice(&self.chain_code);
        payload.extend_from_slice(&self.public_key.serialize());
        bs58::encode(payload).with_check().into_string()
    }

    /// Parse a Base58Check extended public key under `params`.
    pub fn from_base58(s: &str, params: &NetworkParams) -> Result<Self, WalletError> {
        let payload = decode_extended(s, &params.bip32_public)?;
        let public_key = PublicKey::from_slice(&payload[45..78])
            .map_err(|_| WalletError::KeyDerivation("invalid extended public key data".into()))?;
        let (depth, parent_fingerprint, child_index, chain_code) = split_metadata(&payload)?;
        Ok(Self { depth, parent_fingerprint, child_index, chain_code, public_key })
    }
}

fn decode_extended(s: &str, version: &[u8; 4]) -> Result<Vec<u8>, WalletError> {
    let payload = bs58::decode(s.trim())
        .with_check(None)
        .into_vec()
        .map_err(|e| WalletError::KeyDerivation(format!("invalid extended key encoding: {e}")))?;
    if payload.len() != EXTENDED_KEY_LEN {
        return Err(WalletError::KeyDerivation(format!(
            "extended key must decode to {EXTENDED_KEY_LEN} bytes, got {}",
            payload.len()
        )));
    }
    if &payload[..4] != version {
        return Err(WalletError::KeyDerivation(
            "extended key version bytes do not match the network".into(),
        ));
    }
    Ok(payload)
}

fn split_metadata(payload: &[u8]) -> Result<(u8, [u8; 4], u32, [u8; 32]), WalletError> {
    let depth = payload[4];
    let mut parent_fingerprint = [0u8; 4];
    parent_fingerprint.copy_from_slice(&payload[5..9]);
    let child_index = u32::from_be_bytes(payload[9..13].try_into().expect("4 bytes"));
    if depth == 0 && (parent_fingerprint != [0u8; 4] || child_index != 0) {
        return Err(WalletError::KeyDerivation(
            "depth-0 extended key with nonzero parent or index".into(),
        ));
    }
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&payload[13..45]);
    Ok((depth, parent_fingerprint, child_index, chain_code))
}

/// Everything a wallet needs from one derivation: the signing keypair, its
/// address, and the WIF export form.
pub struct WalletKeys {
    pub keypair: KeyPair,
    pub address: Address,
    pub wif: String,
}

impl fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeys")
            .field("address", &self.address)
            .field("wif", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Derive the wallet key at [`ACCOUNT_PATH`] and package it for use.
///
/// The derived address is re-decoded as a consistency check; a mismatch
/// means key material corruption and is fatal.
pub fn derive_wallet_keys(seed: &Seed, params: &NetworkParams) -> Result<WalletKeys, WalletError> {
    let path: DerivationPath = ACCOUNT_PATH.parse()?;
    let master = ExtendedPrivKey::new_master(seed.as_bytes())?;
    let key = master.derive_path(&path)?;

    let mut secret = key.private_key.secret_bytes();
    let keypair = KeyPair::from_secret_bytes(&secret)?;
    let wif = encode_wif(&secret, params, true);
    secret.zeroize();

    let address = keypair.address(params);
    let encoded = address.encode();
    if encoded.len() != 34 {
        return Err(WalletError::Invariant(format!(
            "derived address has length {}, expected 34",
            encoded.len()
        )));
    }
    let decoded = Address::decode(&encoded, params)
        .map_err(|e| WalletError::Invariant(format!("derived address failed to decode: {e}")))?;
    if decoded.hash160() != address.hash160() {
        return Err(WalletError::Invariant(
            "derived address did not round-trip".into(),
        ));
    }

    Ok(WalletKeys { keypair, address, wif })
}
