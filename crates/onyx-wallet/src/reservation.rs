//! Spend reservations.
//!
//! Preparing a spend reserves the source address for the duration of the
//! attempt, so two concurrent sends cannot select the same UTXOs. The
//! reservation is an RAII guard: success and failure paths alike release it
//! on drop, and the caller holds it through broadcast.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use onyx_core::types::OutPoint;
use onyx_core::Address;

use crate::error::WalletError;

/// Tracks which addresses currently have a spend in flight.
///
/// Cheap to clone; all clones share one lock table.
#[derive(Clone, Default)]
pub struct SpendLockRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl SpendLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an address for spending.
    ///
    /// Fails immediately with [`WalletError::SpendInProgress`] if a live
    /// reservation already holds the address; there is no queueing.
    pub fn reserve(&self, address: &Address) -> Result<SpendReservation, WalletError> {
        let key = address.encode();
        let mut locked = self.inner.lock();
        if !locked.insert(key.clone()) {
            warn!(address = %key, "spend already in progress");
            return Err(WalletError::SpendInProgress(key));
        }
        Ok(SpendReservation {
            registry: Arc::clone(&self.inner),
            address: key,
            outpoints: Vec::new(),
        })
    }

    /// Whether the address is currently reserved.
    pub fn is_reserved(&self, address: &Address) -> bool {
        self.inner.lock().contains(&address.encode())
    }
}

impl fmt::Debug for SpendLockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpendLockRegistry")
            .field("reserved", &self.inner.lock().len())
            .finish()
    }
}

/// A live reservation. Dropping it releases the address.
#[derive(Debug)]
pub struct SpendReservation {
    registry: Arc<Mutex<HashSet<String>>>,
    address: String,
    outpoints: Vec<OutPoint>,
}

impl SpendReservation {
    /// The reserved address string.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Outpoints the spend attempt selected, once selection ran.
    pub fn outpoints(&self) -> &[OutPoint] {
        &self.outpoints
    }

    /// Record the outpoints chosen for this spend.
    pub fn set_outpoints(&mut self, outpoints: Vec<OutPoint>) {
        self.outpoints = outpoints;
    }
}

impl Drop for SpendReservation {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.address);
    }
}
