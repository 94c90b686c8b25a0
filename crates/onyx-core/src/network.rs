//! Network selection and chain parameters.
//!
//! Every chain-specific version byte travels through an explicit
//! [`NetworkParams`] value. There is no process-wide network configuration:
//! functions that need version bytes take a `&NetworkParams` argument.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// Network selector: mainnet or testnet.
///
/// # Examples
///
/// ```
/// use onyx_core::network::Network;
/// let net = Network::default();
/// assert_eq!(net, Network::Mainnet);
/// assert_eq!(net.params().pubkey_hash, 0x3C);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
}

impl Network {
    /// Chain parameters for this network.
    pub fn params(&self) -> &'static NetworkParams {
        match self {
            Self::Mainnet => &MAINNET,
            Self::Testnet => &TESTNET,
        }
    }

    /// Canonical lowercase name, matching the serde representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use onyx_core::network::Network;
    /// assert_eq!(Network::Testnet.name(), "testnet");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(AddressError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Version bytes and prefixes for one chain network.
///
/// Held as `const` sets ([`MAINNET`], [`TESTNET`]) and passed by reference
/// into every encode/decode/signing function that needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    /// Which network these parameters describe.
    pub network: Network,
    /// Version byte for P2PKH addresses.
    pub pubkey_hash: u8,
    /// Version byte for P2SH addresses.
    pub script_hash: u8,
    /// Version byte for WIF-encoded private keys.
    pub wif: u8,
    /// Four-byte version prefix for extended public keys.
    pub bip32_public: [u8; 4],
    /// Four-byte version prefix for extended private keys.
    pub bip32_private: [u8; 4],
    /// Prefix mixed into signed-message digests.
    pub message_prefix: &'static str,
}

/// Mainnet parameters. P2PKH addresses start with `R`, WIF keys with `U`.
pub const MAINNET: NetworkParams = NetworkParams {
    network: Network::Mainnet,
    pubkey_hash: 0x3C,
    script_hash: 0x55,
    wif: 0xBC,
    bip32_public: [0x04, 0x88, 0xB2, 0x1E],
    bip32_private: [0x04, 0x88, 0xAD, 0xE4],
    message_prefix: "Onyx Signed Message:\n",
};

/// Testnet parameters. P2PKH addresses start with `m` or `n`.
pub const TESTNET: NetworkParams = NetworkParams {
    network: Network::Testnet,
    pubkey_hash: 0x6F,
    script_hash: 0xC4,
    wif: 0xEF,
    bip32_public: [0x04, 0x35, 0x87, 0xCF],
    bip32_private: [0x04, 0x35, 0x83, 0x94],
    message_prefix: "Onyx Signed Message:\n",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_version_bytes_distinct_across_networks() {
        assert_ne!(MAINNET.pubkey_hash, TESTNET.pubkey_hash);
        assert_ne!(MAINNET.script_hash, TESTNET.script_hash);
        assert_ne!(MAINNET.wif, TESTNET.wif);
        assert_ne!(MAINNET.bip32_public, TESTNET.bip32_public);
        assert_ne!(MAINNET.bip32_private, TESTNET.bip32_private);
    }

    #[test]
    fn params_roundtrip_through_network() {
        assert_eq!(Network::Mainnet.params(), &MAINNET);
        assert_eq!(Network::Testnet.params(), &TESTNET);
        assert_eq!(MAINNET.network, Network::Mainnet);
        assert_eq!(TESTNET.network, Network::Testnet);
    }

    #[test]
    fn network_parses_case_insensitive() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert!("regtest".parse::<Network>().is_err());
    }

    #[test]
    fn network_display_matches_name() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!(Network::Testnet.to_string(), "testnet");
    }

    #[test]
    fn network_serde_is_lowercase() {
        let json = serde_json::to_string(&Network::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
        let back: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Network::Testnet);
    }

    #[test]
    fn bip32_versions_are_standard() {
        assert_eq!(MAINNET.bip32_private, [0x04, 0x88, 0xAD, 0xE4]);
        assert_eq!(MAINNET.bip32_public, [0x04, 0x88, 0xB2, 0x1E]);
    }
}
