//! Digest helpers used across the codec and transaction layers.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Double SHA-256, the chain's transaction and checksum digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// Hash160: RIPEMD160 over SHA-256, used for P2PKH addresses.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    ripe.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256d_empty_matches_known_vector() {
        // d(SHA256("")) is a fixed, well-known value.
        let digest = sha256d(b"");
        assert_eq!(
            hex::encode(digest),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn sha256d_differs_from_single_sha256() {
        let single: [u8; 32] = Sha256::digest(b"onyx").into();
        assert_ne!(sha256d(b"onyx"), single);
    }

    #[test]
    fn hash160_length_and_determinism() {
        let a = hash160(b"pubkey bytes");
        let b = hash160(b"pubkey bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn hash160_empty_matches_known_vector() {
        let digest = hash160(b"");
        assert_eq!(
            hex::encode(digest),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
