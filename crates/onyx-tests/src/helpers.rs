//! Shared fixtures for the integration and adversarial suites.

use onyx_core::network::{Network, NetworkParams};
use onyx_core::{Address, KeyPair, Txid};
use onyx_wallet::{Wallet, WalletUtxo};

/// Password used by every test wallet.
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// A deterministic keypair from a seed byte.
pub fn sample_keypair(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed; 32]).expect("nonzero seed byte gives a valid scalar")
}

/// A throwaway recipient address on the given network.
pub fn sample_recipient(params: &NetworkParams) -> String {
    Address::from_pubkey_hash([0xAB; 20], params).encode()
}

/// A UTXO paying `satoshis` to `address`, with a txid derived from `seed`.
pub fn sample_utxo(seed: u8, satoshis: u64, address: &Address) -> WalletUtxo {
    WalletUtxo {
        txid: Txid([seed; 32]),
        vout: u32::from(seed),
        satoshis,
        address: address.clone(),
    }
}

/// A fresh mainnet wallet plus three UTXOs it controls (3.5 ONX total).
pub fn funded_wallet() -> (Wallet, Vec<WalletUtxo>) {
    let wallet = Wallet::create(TEST_PASSWORD, Network::Mainnet).expect("wallet creation");
    let address = wallet.address().clone();
    let utxos = vec![
        sample_utxo(1, 50_000_000, &address),
        sample_utxo(2, 100_000_000, &address),
        sample_utxo(3, 200_000_000, &address),
    ];
    (wallet, utxos)
}
