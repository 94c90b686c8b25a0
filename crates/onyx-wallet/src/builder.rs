//! Transaction assembly and signing.
//!
//! [`TransactionBuilder::build`] turns a [`CoinSelection`] into an unsigned
//! version-4 transaction; [`TransactionBuilder::sign`] produces the final
//! scriptSigs and broadcast hex. Ownership is not verified here: signing
//! with a keypair that does not control the selected UTXOs yields a
//! syntactically valid transaction the chain will reject.

use onyx_core::address::Address;
use onyx_core::crypto::{sign_input, KeyPair};
use onyx_core::error::TransactionError;
use onyx_core::network::NetworkParams;
use onyx_core::script::{p2pkh_script_pubkey, p2pkh_script_sig};
use onyx_core::types::{OutPoint, Transaction, TxInput, TxOutput, Txid};

use crate::coin_selection::CoinSelection;
use crate::error::WalletError;

/// A built but unsigned spend. Keeps the selection so signing knows each
/// input's amount and owning address.
#[derive(Clone, Debug)]
pub struct UnsignedSpend {
    pub transaction: Transaction,
    pub selection: CoinSelection,
}

/// A fully signed spend, ready to broadcast.
#[derive(Clone, Debug)]
pub struct SignedSpend {
    pub transaction: Transaction,
    pub txid: Txid,
    pub hex: String,
    pub fee: u64,
    pub change: u64,
}

/// Assembles version-4 transparent transactions for one network.
pub struct TransactionBuilder {
    params: &'static NetworkParams,
    lock_time: u32,
    expiry_height: u32,
}

impl TransactionBuilder {
    pub fn new(params: &'static NetworkParams) -> Self {
        Self { params, lock_time: 0, expiry_height: 0 }
    }

    /// Set nLockTime (default 0).
    pub fn lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    /// Set nExpiryHeight (default 0, no expiry).
    pub fn expiry_height(&mut self, expiry_height: u32) -> &mut Self {
        self.expiry_height = expiry_height;
        self
    }

    /// Build the unsigned transaction: one input per selected UTXO, a
    /// recipient output of the selection target, and a change output iff
    /// the selection kept change.
    ///
    /// Both addresses must decode under this builder's network.
    pub fn build(
        &self,
        selection: CoinSelection,
        recipient: &str,
        change_address: &str,
    ) -> Result<UnsignedSpend, WalletError> {
        if selection.inputs.is_empty() {
            return Err(TransactionError::EmptyInputsOrOutputs.into());
        }
        let recipient = Address::decode(recipient, self.params)?;
        let change_address = Address::decode(change_address, self.params)?;

        let inputs = selection
            .inputs
            .iter()
            .map(|utxo| {
                TxInput::unsigned(OutPoint { txid: utxo.txid, vout: utxo.vout })
            })
            .collect();

        let mut outputs = vec![TxOutput {
            value: selection.target,
            script_pubkey: p2pkh_script_pubkey(recipient.hash160()),
        }];
        if selection.change > 0 {
            outputs.push(TxOutput {
                value: selection.change,
                script_pubkey: p2pkh_script_pubkey(change_address.hash160()),
            });
        }

        let transaction = Transaction {
            inputs,
            outputs,
            lock_time: self.lock_time,
            expiry_height: self.expiry_height,
        };
        Ok(UnsignedSpend { transaction, selection })
    }

    /// Sign every input of an unsigned spend with one keypair.
    ///
    /// Each signature commits to the script of the UTXO's owning address
    /// and to its exact value.
    pub fn sign(unsigned: &UnsignedSpend, keypair: &KeyPair) -> Result<SignedSpend, WalletError> {
        let mut transaction = unsigned.transaction.clone();
        let pubkey = keypair.public_key_bytes();
        for (index, utxo) in unsigned.selection.inputs.iter().enumerate() {
            let script_code = p2pkh_script_pubkey(utxo.address.hash160());
            let signature =
                sign_input(&transaction, index, &script_code, utxo.satoshis, keypair)?;
            transaction.inputs[index].script_sig = p2pkh_script_sig(&signature, &pubkey)?;
        }
        let txid = transaction.txid();
        let hex = transaction.to_hex();
        Ok(SignedSpend {
            transaction,
            txid,
            hex,
            fee: unsigned.selection.fee,
            change: unsigned.selection.change,
        })
    }

    /// Build and sign in one step, returning change to `source_address`.
    pub fn build_and_sign(
        &self,
        selection: CoinSelection,
        recipient: &str,
        keypair: &KeyPair,
        source_address: &str,
    ) -> Result<SignedSpend, WalletError> {
        let unsigned = self.build(selection, recipient, source_address)?;
        Self::sign(&unsigned, keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_core::network::{MAINNET, TESTNET};
    use onyx_core::script::script_pubkey_to_hash160;

    use crate::coin_selection::{CoinSelector, WalletUtxo};

    fn funded_keypair() -> (KeyPair, Address) {
        let keypair = KeyPair::from_secret_bytes(&[0x42u8; 32]).unwrap();
        let address = keypair.address(&MAINNET);
        (keypair, address)
    }

    fn sample_selection(address: &Address) -> CoinSelection {
        let utxos = vec![
            WalletUtxo { txid: Txid([0x11; 32]), vout: 0, satoshis: 1_000_000, address: address.clone() },
            WalletUtxo { txid: Txid([0x22; 32]), vout: 1, satoshis: 2_000_000, address: address.clone() },
        ];
        CoinSelector::select(&utxos, 1_500_000, 1).unwrap()
    }

    fn recipient() -> String {
        Address::from_pubkey_hash([0xAB; 20], &MAINNET).encode()
    }

    // --- Build ---

    #[test]
    fn build_creates_recipient_and_change_outputs() {
        let (_, address) = funded_keypair();
        let selection = sample_selection(&address);
        let change = selection.change;
        let unsigned = TransactionBuilder::new(&MAINNET)
            .build(selection, &recipient(), &address.encode())
            .unwrap();

        let tx = &unsigned.transaction;
        assert_eq!(tx.inputs.len(), 1);
        assert!(tx.inputs.iter().all(|i| i.script_sig.is_empty()));
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].value, 1_500_000);
        assert_eq!(
            script_pubkey_to_hash160(&tx.outputs[0].script_pubkey),
            Some([0xAB; 20])
        );
        assert_eq!(tx.outputs[1].value, change);
        assert_eq!(
            script_pubkey_to_hash160(&tx.outputs[1].script_pubkey),
            Some(*address.hash160())
        );
    }

    #[test]
    fn build_omits_change_output_when_change_is_zero() {
        let (_, address) = funded_keypair();
        let utxos = vec![WalletUtxo {
            txid: Txid([0x11; 32]),
            vout: 0,
            satoshis: 100_258,
            address: address.clone(),
        }];
        let selection = CoinSelector::select(&utxos, 100_000, 1).unwrap();
        assert_eq!(selection.change, 0);
        let unsigned = TransactionBuilder::new(&MAINNET)
            .build(selection, &recipient(), &address.encode())
            .unwrap();
        assert_eq!(unsigned.transaction.outputs.len(), 1);
    }

    #[test]
    fn two_input_spend_without_change_signs_every_input() {
        let (keypair, address) = funded_keypair();
        let utxos = vec![
            WalletUtxo { txid: Txid([0x11; 32]), vout: 0, satoshis: 300_000, address: address.clone() },
            WalletUtxo { txid: Txid([0x22; 32]), vout: 1, satoshis: 200_000, address: address.clone() },
        ];
        // 499_562 + fee(2 inputs, 2 outputs) = 500_000 exactly, so no change.
        let selection = CoinSelector::select(&utxos, 499_562, 1).unwrap();
        assert_eq!(selection.fee, 438);
        assert_eq!(selection.change, 0);

        let signed = TransactionBuilder::new(&MAINNET)
            .build_and_sign(selection, &recipient(), &keypair, &address.encode())
            .unwrap();
        let tx = &signed.transaction;
        assert_eq!(tx.inputs.len(), 2);
        assert!(tx.inputs.iter().all(|i| !i.script_sig.is_empty()));
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 499_562);
    }

    #[test]
    fn build_rejects_wrong_network_recipient() {
        let (_, address) = funded_keypair();
        let selection = sample_selection(&address);
        let testnet_recipient = Address::from_pubkey_hash([0xAB; 20], &TESTNET).encode();
        let err = TransactionBuilder::new(&MAINNET)
            .build(selection, &testnet_recipient, &address.encode())
            .unwrap_err();
        assert!(matches!(err, WalletError::Address(_)));
    }

    #[test]
    fn build_rejects_empty_selection() {
        let (_, address) = funded_keypair();
        let selection = CoinSelection { inputs: vec![], target: 1, fee: 0, change: 0 };
        let err = TransactionBuilder::new(&MAINNET)
            .build(selection, &recipient(), &address.encode())
            .unwrap_err();
        assert!(matches!(err, WalletError::Transaction(_)));
    }

    #[test]
    fn lock_time_and_expiry_setters_apply() {
        let (_, address) = funded_keypair();
        let selection = sample_selection(&address);
        let unsigned = TransactionBuilder::new(&MAINNET)
            .lock_time(7)
            .expiry_height(120)
            .build(selection, &recipient(), &address.encode())
            .unwrap();
        assert_eq!(unsigned.transaction.lock_time, 7);
        assert_eq!(unsigned.transaction.expiry_height, 120);
    }

    // --- Sign ---

    #[test]
    fn sign_fills_every_script_sig() {
        let (keypair, address) = funded_keypair();
        let selection = sample_selection(&address);
        let signed = TransactionBuilder::new(&MAINNET)
            .build_and_sign(selection, &recipient(), &keypair, &address.encode())
            .unwrap();

        assert!(signed
            .transaction
            .inputs
            .iter()
            .all(|i| !i.script_sig.is_empty()));
        assert!(signed.hex.starts_with("0400008085202f89"));
        assert_eq!(signed.txid, signed.transaction.txid());
        assert_eq!(signed.fee, 258);
    }

    #[test]
    fn script_sig_embeds_sighash_byte_and_pubkey() {
        let (keypair, address) = funded_keypair();
        let selection = sample_selection(&address);
        let signed = TransactionBuilder::new(&MAINNET)
            .build_and_sign(selection, &recipient(), &keypair, &address.encode())
            .unwrap();

        let script = &signed.transaction.inputs[0].script_sig;
        let sig_len = script[0] as usize;
        // DER signature ends with the SIGHASH_ALL byte.
        assert_eq!(script[sig_len], 0x01);
        assert_eq!(script[1 + sig_len] as usize, 33);
        assert_eq!(&script[2 + sig_len..], &keypair.public_key_bytes());
    }

    #[test]
    fn signing_is_deterministic() {
        // RFC 6979 nonces: same key and message, same signature.
        let (keypair, address) = funded_keypair();
        let a = TransactionBuilder::new(&MAINNET)
            .build_and_sign(sample_selection(&address), &recipient(), &keypair, &address.encode())
            .unwrap();
        let b = TransactionBuilder::new(&MAINNET)
            .build_and_sign(sample_selection(&address), &recipient(), &keypair, &address.encode())
            .unwrap();
        assert_eq!(a.hex, b.hex);
        assert_eq!(a.txid, b.txid);
    }

    #[test]
    fn mismatched_keypair_still_produces_valid_encoding() {
        // Ownership is the caller's problem; the transaction still encodes.
        let (_, address) = funded_keypair();
        let stranger = KeyPair::from_secret_bytes(&[0x33u8; 32]).unwrap();
        let signed = TransactionBuilder::new(&MAINNET)
            .build_and_sign(sample_selection(&address), &recipient(), &stranger, &address.encode())
            .unwrap();
        assert!(signed.hex.starts_with("0400008085202f89"));
    }
}
