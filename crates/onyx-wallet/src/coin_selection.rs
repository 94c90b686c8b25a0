//! Largest-first coin selection with a static size heuristic.
//!
//! Size estimate: `inputs * 180 + outputs * 34 + 10` bytes, fee = size *
//! fee rate. Selection always budgets for two outputs (recipient plus
//! change); change at or below the dust threshold is folded into the fee
//! rather than creating an uneconomical output. The selection invariant
//! `sum(inputs) == target + fee + change` holds exactly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use onyx_core::constants::{DUST_THRESHOLD, MAX_MONEY};
use onyx_core::{Address, Txid};

use crate::error::WalletError;

/// Estimated serialized size of one signed P2PKH input.
pub const INPUT_SIZE: u64 = 180;
/// Estimated serialized size of one P2PKH output.
pub const OUTPUT_SIZE: u64 = 34;
/// Fixed transaction framing overhead.
pub const TX_OVERHEAD: u64 = 10;

/// Outputs budgeted during selection: recipient and change.
const SELECTION_OUTPUTS: u64 = 2;

/// A spendable output known to the wallet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WalletUtxo {
    pub txid: Txid,
    pub vout: u32,
    pub satoshis: u64,
    pub address: Address,
}

/// Result of a selection run. `inputs` are in selection order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinSelection {
    pub inputs: Vec<WalletUtxo>,
    pub target: u64,
    pub fee: u64,
    pub change: u64,
}

impl CoinSelection {
    /// Total value of the selected inputs.
    pub fn total_input_value(&self) -> u64 {
        // Selection already proved this sum fits in u64.
        self.inputs.iter().map(|u| u.satoshis).sum()
    }
}

/// Estimated transaction size for the given input and output counts.
pub fn estimate_size(inputs: u64, outputs: u64) -> Result<u64, WalletError> {
    inputs
        .checked_mul(INPUT_SIZE)
        .and_then(|i| outputs.checked_mul(OUTPUT_SIZE).map(|o| (i, o)))
        .and_then(|(i, o)| i.checked_add(o))
        .and_then(|s| s.checked_add(TX_OVERHEAD))
        .ok_or_else(|| WalletError::InvalidAmount("size estimate overflow".into()))
}

/// Estimated fee for the given shape at `fee_per_byte`.
pub fn estimate_fee(inputs: u64, outputs: u64, fee_per_byte: u64) -> Result<u64, WalletError> {
    estimate_size(inputs, outputs)?
        .checked_mul(fee_per_byte)
        .ok_or_else(|| WalletError::InvalidAmount("fee estimate overflow".into()))
}

pub struct CoinSelector;

impl CoinSelector {
    /// Select UTXOs to fund `target` satoshis at `fee_per_byte`.
    ///
    /// Sorts descending by value (stable, so equal values keep their input
    /// order), takes the largest UTXO alone when it covers target plus the
    /// single-input fee, and otherwise accumulates largest-first with the
    /// fee recomputed for each added input.
    pub fn select(
        utxos: &[WalletUtxo],
        target: u64,
        fee_per_byte: u64,
    ) -> Result<CoinSelection, WalletError> {
        if target == 0 {
            return Err(WalletError::InvalidAmount("target must be positive".into()));
        }
        if target > MAX_MONEY {
            return Err(WalletError::InvalidAmount(format!(
                "target {target} exceeds maximum money"
            )));
        }
        if utxos.is_empty() {
            return Err(WalletError::InsufficientFunds { have: 0, need: target });
        }
        for utxo in utxos {
            if utxo.satoshis > MAX_MONEY {
                return Err(WalletError::InvalidAmount(format!(
                    "utxo {}:{} exceeds maximum money",
                    utxo.txid, utxo.vout
                )));
            }
        }

        let mut sorted = utxos.to_vec();
        sorted.sort_by(|a, b| b.satoshis.cmp(&a.satoshis));

        // Single-input fast path: the largest UTXO covers everything.
        let single_fee = estimate_fee(1, SELECTION_OUTPUTS, fee_per_byte)?;
        let single_need = checked_need(target, single_fee)?;
        if sorted[0].satoshis >= single_need {
            debug!(
                value = sorted[0].satoshis,
                fee = single_fee,
                "single-input selection"
            );
            return Ok(finish(vec![sorted[0].clone()], target, single_fee));
        }

        let mut inputs: Vec<WalletUtxo> = Vec::new();
        let mut accumulated: u64 = 0;
        for utxo in sorted {
            accumulated = accumulated.checked_add(utxo.satoshis).ok_or_else(|| {
                WalletError::InvalidAmount("input value overflow".into())
            })?;
            inputs.push(utxo);
            let fee = estimate_fee(inputs.len() as u64, SELECTION_OUTPUTS, fee_per_byte)?;
            let need = checked_need(target, fee)?;
            if accumulated >= need {
                debug!(inputs = inputs.len(), fee, "multi-input selection");
                return Ok(finish(inputs, target, fee));
            }
        }

        let fee = estimate_fee(inputs.len() as u64, SELECTION_OUTPUTS, fee_per_byte)?;
        Err(WalletError::InsufficientFunds {
            have: accumulated,
            need: checked_need(target, fee)?,
        })
    }
}

fn checked_need(target: u64, fee: u64) -> Result<u64, WalletError> {
    target
        .checked_add(fee)
        .ok_or_else(|| WalletError::InvalidAmount("target plus fee overflows".into()))
}

fn finish(inputs: Vec<WalletUtxo>, target: u64, fee: u64) -> CoinSelection {
    let total: u64 = inputs.iter().map(|u| u.satoshis).sum();
    let mut fee = fee;
    let mut change = total - target - fee;
    if change > 0 && change <= DUST_THRESHOLD {
        debug!(change, "folding dust change into fee");
        fee += change;
        change = 0;
    }
    CoinSelection { inputs, target, fee, change }
}
