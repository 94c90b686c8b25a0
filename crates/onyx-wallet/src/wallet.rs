//! Wallet record, encrypted persistence, and the spend façade.
//!
//! # File format
//!
//! ```text
//! header_len (u32 LE) || header JSON { magic: "ONYX", version: 1, network }
//!                     || record JSON
//! ```
//!
//! The record stores the address and network in the clear; the WIF and
//! mnemonic are vault blobs, so the file needs no second encryption layer.
//! Reading the address never requires a password, spending always does.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use onyx_core::address::{decode_wif, Address};
use onyx_core::crypto::KeyPair;
use onyx_core::network::Network;

use crate::builder::{SignedSpend, TransactionBuilder};
use crate::coin_selection::{CoinSelector, WalletUtxo};
use crate::error::WalletError;
use crate::hd::derive_wallet_keys;
use crate::mnemonic::{generate_mnemonic, mnemonic_to_seed, normalize_mnemonic};
use crate::reservation::{SpendLockRegistry, SpendReservation};
use crate::vault;

/// Magic string identifying a wallet file.
pub const WALLET_MAGIC: &str = "ONYX";
/// Current wallet file format version.
pub const WALLET_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct FileHeader {
    magic: String,
    version: u32,
    network: Network,
}

/// The persisted wallet: public address plus encrypted secrets.
#[derive(Serialize, Deserialize, Clone)]
pub struct WalletRecord {
    pub address: Address,
    pub wif: String,
    pub mnemonic: String,
    pub network: Network,
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("address", &self.address)
            .field("wif", &"[ENCRYPTED]")
            .field("mnemonic", &"[ENCRYPTED]")
            .field("network", &self.network)
            .finish()
    }
}

/// A loaded wallet. Secrets stay encrypted until a password unlocks them.
#[derive(Debug, Clone)]
pub struct Wallet {
    record: WalletRecord,
}

impl Wallet {
    /// Create a wallet around a fresh 24-word mnemonic.
    pub fn create(password: &str, network: Network) -> Result<Self, WalletError> {
        let mnemonic = Zeroizing::new(generate_mnemonic()?);
        let wallet = Self::from_mnemonic(&mnemonic, password, network)?;
        info!(address = %wallet.record.address, %network, "created wallet");
        Ok(wallet)
    }

    /// Restore a wallet from an existing mnemonic.
    pub fn restore(mnemonic: &str, password: &str, network: Network) -> Result<Self, WalletError> {
        let wallet = Self::from_mnemonic(mnemonic, password, network)?;
        info!(address = %wallet.record.address, %network, "restored wallet");
        Ok(wallet)
    }

    fn from_mnemonic(
        mnemonic: &str,
        password: &str,
        network: Network,
    ) -> Result<Self, WalletError> {
        let normalized = Zeroizing::new(normalize_mnemonic(mnemonic));
        let seed = mnemonic_to_seed(&normalized, "")?;
        let keys = derive_wallet_keys(&seed, network.params())?;
        let record = WalletRecord {
            address: keys.address,
            wif: vault::encrypt(&keys.wif, password)?,
            mnemonic: vault::encrypt(&normalized, password)?,
            network,
        };
        Ok(Self { record })
    }

    /// The wallet's receive address.
    pub fn address(&self) -> &Address {
        &self.record.address
    }

    /// The network this wallet was created for.
    pub fn network(&self) -> Network {
        self.record.network
    }

    /// Decrypt the WIF and rebuild the signing keypair.
    pub fn unlock_keypair(&self, password: &str) -> Result<KeyPair, WalletError> {
        let wif = vault::decrypt(&self.record.wif, password)?;
        let decoded = decode_wif(&wif, self.record.network.params())?;
        Ok(KeyPair::from_secret_bytes(decoded.scalar())?)
    }

    /// Decrypt and return the backup mnemonic.
    pub fn reveal_mnemonic(&self, password: &str) -> Result<Zeroizing<String>, WalletError> {
        vault::decrypt(&self.record.mnemonic, password)
    }

    /// Prepare a spend end to end: reserve the address, select coins,
    /// build, and sign. Change returns to this wallet's address.
    ///
    /// The returned reservation must be held until the transaction is
    /// broadcast (or abandoned); dropping it releases the address.
    pub fn prepare_send(
        &self,
        utxos: &[WalletUtxo],
        recipient: &str,
        amount: u64,
        fee_per_byte: u64,
        password: &str,
        registry: &SpendLockRegistry,
    ) -> Result<(SignedSpend, SpendReservation), WalletError> {
        let mut reservation = registry.reserve(&self.record.address)?;
        let keypair = self.unlock_keypair(password)?;
        let selection = CoinSelector::select(utxos, amount, fee_per_byte)?;
        reservation.set_outpoints(
            selection
                .inputs
                .iter()
                .map(|u| onyx_core::OutPoint { txid: u.txid, vout: u.vout })
                .collect(),
        );
        let signed = TransactionBuilder::new(self.record.network.params()).build_and_sign(
            selection,
            recipient,
            &keypair,
            &self.record.address.encode(),
        )?;
        info!(txid = %signed.txid, fee = signed.fee, "prepared spend");
        Ok((signed, reservation))
    }

    /// Write the wallet file.
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let header = FileHeader {
            magic: WALLET_MAGIC.to_string(),
            version: WALLET_VERSION,
            network: self.record.network,
        };
        let header_json = serde_json::to_vec(&header)?;
        let record_json = serde_json::to_vec(&self.record)?;

        let mut bytes = Vec::with_capacity(4 + header_json.len() + record_json.len());
        bytes.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&header_json);
        bytes.extend_from_slice(&record_json);
        fs::write(path, bytes)?;
        info!(path = %path.display(), "saved wallet");
        Ok(())
    }

    /// Read and validate a wallet file.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let bytes = fs::read(path)?;
        if bytes.len() < 4 {
            return Err(WalletError::CorruptedFile("file too short for header".into()));
        }
        let header_len = u32::from_le_bytes(bytes[..4].try_into().expect("4 bytes")) as usize;
        let rest = &bytes[4..];
        if header_len > rest.len() {
            return Err(WalletError::CorruptedFile(format!(
                "header length {header_len} exceeds file size"
            )));
        }
        let header: FileHeader = serde_json::from_slice(&rest[..header_len])
            .map_err(|e| WalletError::CorruptedFile(format!("unreadable header: {e}")))?;
        if header.magic != WALLET_MAGIC {
            return Err(WalletError::CorruptedFile(format!(
                "bad magic {:?}",
                header.magic
            )));
        }
        if header.version != WALLET_VERSION {
            return Err(WalletError::CorruptedFile(format!(
                "unsupported version {}",
                header.version
            )));
        }
        let record: WalletRecord = serde_json::from_slice(&rest[header_len..])
            .map_err(|e| WalletError::CorruptedFile(format!("unreadable record: {e}")))?;
        if record.network != header.network {
            return Err(WalletError::CorruptedFile(
                "header and record disagree on network".into(),
            ));
        }
        info!(address = %record.address, network = %record.network, "loaded wallet");
        Ok(Self { record })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_core::Txid;
    use tempfile::tempdir;

    const PASSWORD: &str = "correct horse battery staple";

    fn sample_wallet() -> Wallet {
        Wallet::create(PASSWORD, Network::Mainnet).unwrap()
    }

    fn funded_utxos(wallet: &Wallet) -> Vec<WalletUtxo> {
        vec![
            WalletUtxo {
                txid: Txid([0x11; 32]),
                vout: 0,
                satoshis: 1_000_000,
                address: wallet.address().clone(),
            },
            WalletUtxo {
                txid: Txid([0x22; 32]),
                vout: 1,
                satoshis: 2_000_000,
                address: wallet.address().clone(),
            },
        ]
    }

    // --- Create / restore ---

    #[test]
    fn create_yields_valid_mainnet_address() {
        let wallet = sample_wallet();
        let encoded = wallet.address().encode();
        assert_eq!(encoded.len(), 34);
        assert!(encoded.starts_with('R'));
    }

    #[test]
    fn restore_reproduces_the_same_wallet() {
        let wallet = sample_wallet();
        let mnemonic = wallet.reveal_mnemonic(PASSWORD).unwrap();
        let restored = Wallet::restore(&mnemonic, "other password", Network::Mainnet).unwrap();
        assert_eq!(restored.address(), wallet.address());
    }

    #[test]
    fn restore_rejects_bad_mnemonic() {
        assert!(matches!(
            Wallet::restore("definitely not words", PASSWORD, Network::Mainnet).unwrap_err(),
            WalletError::InvalidMnemonic(_)
        ));
    }

    #[test]
    fn unlock_requires_correct_password() {
        let wallet = sample_wallet();
        assert!(wallet.unlock_keypair(PASSWORD).is_ok());
        assert!(matches!(
            wallet.unlock_keypair("wrong").unwrap_err(),
            WalletError::AuthenticationFailed
        ));
    }

    #[test]
    fn unlocked_keypair_controls_the_address() {
        let wallet = sample_wallet();
        let keypair = wallet.unlock_keypair(PASSWORD).unwrap();
        assert_eq!(&keypair.address(Network::Mainnet.params()), wallet.address());
    }

    #[test]
    fn record_debug_hides_secrets() {
        let wallet = sample_wallet();
        let debug = format!("{:?}", wallet.record);
        assert!(debug.contains("ENCRYPTED"));
        assert!(!debug.contains(&wallet.record.wif));
    }

    // --- Persistence ---

    #[test]
    fn save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");
        let wallet = sample_wallet();
        wallet.save(&path).unwrap();

        let loaded = Wallet::load(&path).unwrap();
        assert_eq!(loaded.address(), wallet.address());
        assert_eq!(loaded.network(), Network::Mainnet);
        // Secrets survive the round-trip.
        let mnemonic = loaded.reveal_mnemonic(PASSWORD).unwrap();
        assert_eq!(
            *mnemonic,
            *wallet.reveal_mnemonic(PASSWORD).unwrap()
        );
    }

    #[test]
    fn load_rejects_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");
        let wallet = sample_wallet();
        wallet.save(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..10]).unwrap();
        assert!(matches!(
            Wallet::load(&path).unwrap_err(),
            WalletError::CorruptedFile(_)
        ));
    }

    #[test]
    fn load_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");
        let header = br#"{"magic":"EVIL","version":1,"network":"mainnet"}"#;
        let mut bytes = (header.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        bytes.extend_from_slice(b"{}");
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            Wallet::load(&path).unwrap_err(),
            WalletError::CorruptedFile(_)
        ));
    }

    #[test]
    fn load_rejects_unsupported_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");
        let header = br#"{"magic":"ONYX","version":99,"network":"mainnet"}"#;
        let mut bytes = (header.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        bytes.extend_from_slice(b"{}");
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            Wallet::load(&path).unwrap_err(),
            WalletError::CorruptedFile(_)
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        assert!(matches!(
            Wallet::load(Path::new("/nonexistent/wallet.dat")).unwrap_err(),
            WalletError::Io(_)
        ));
    }

    // --- Spending ---

    #[test]
    fn prepare_send_signs_and_reserves() {
        let wallet = sample_wallet();
        let registry = SpendLockRegistry::new();
        let recipient = Address::from_pubkey_hash([0xAB; 20], Network::Mainnet.params()).encode();

        let (signed, reservation) = wallet
            .prepare_send(
                &funded_utxos(&wallet),
                &recipient,
                1_500_000,
                1,
                PASSWORD,
                &registry,
            )
            .unwrap();

        assert!(signed.hex.starts_with("0400008085202f89"));
        assert_eq!(reservation.address(), wallet.address().encode());
        assert_eq!(reservation.outpoints().len(), 1);
        assert!(registry.is_reserved(wallet.address()));

        drop(reservation);
        assert!(!registry.is_reserved(wallet.address()));
    }

    #[test]
    fn prepare_send_blocks_concurrent_spend() {
        let wallet = sample_wallet();
        let registry = SpendLockRegistry::new();
        let recipient = Address::from_pubkey_hash([0xAB; 20], Network::Mainnet.params()).encode();
        let utxos = funded_utxos(&wallet);

        let (_signed, _guard) = wallet
            .prepare_send(&utxos, &recipient, 1_500_000, 1, PASSWORD, &registry)
            .unwrap();
        assert!(matches!(
            wallet
                .prepare_send(&utxos, &recipient, 100_000, 1, PASSWORD, &registry)
                .unwrap_err(),
            WalletError::SpendInProgress(_)
        ));
    }

    #[test]
    fn failed_send_releases_the_reservation() {
        let wallet = sample_wallet();
        let registry = SpendLockRegistry::new();
        let recipient = Address::from_pubkey_hash([0xAB; 20], Network::Mainnet.params()).encode();

        // Insufficient funds: the reservation guard drops inside.
        assert!(wallet
            .prepare_send(&funded_utxos(&wallet), &recipient, u64::MAX / 2, 1, PASSWORD, &registry)
            .is_err());
        assert!(!registry.is_reserved(wallet.address()));
    }

    #[test]
    fn prepare_send_rejects_wrong_password_before_selecting() {
        let wallet = sample_wallet();
        let registry = SpendLockRegistry::new();
        let recipient = Address::from_pubkey_hash([0xAB; 20], Network::Mainnet.params()).encode();
        assert!(matches!(
            wallet
                .prepare_send(&funded_utxos(&wallet), &recipient, 1_000, 1, "nope", &registry)
                .unwrap_err(),
            WalletError::AuthenticationFailed
        ));
        assert!(!registry.is_reserved(wallet.address()));
    }
}
