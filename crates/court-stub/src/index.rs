//! In-memory [`ReadIndex`].

use std::collections::HashMap;

use async_trait::async_trait;
use court_client::{IndexError, ReadIndex};
use court_core::{Address, DisputeId, RoundId};
use parking_lot::Mutex;

use crate::ledger::RoundKey;

// -- Read index ---------------------------------------------------------------

/// Drafted jurors keyed by round, plus an on/off switch for outages.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    drafted: Mutex<HashMap<RoundKey, Vec<Address>>>,
    unavailable: Mutex<bool>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the drafted jurors of a round.
    pub fn set_drafted(&self, dispute: DisputeId, round: RoundId, jurors: Vec<Address>) {
        self.drafted.lock().insert((dispute, round), jurors);
    }

    /// Make every query fail with [`IndexError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }
}

#[async_trait]
impl ReadIndex for MemoryIndex {
    async fn drafted_jurors(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Vec<Address>, IndexError> {
        if *self.unavailable.lock() {
            return Err(IndexError::Unavailable("memory index switched off".into()));
        }
        Ok(self
            .drafted
            .lock()
            .get(&(dispute, round))
            .cloned()
            .unwrap_or_default())
    }
}
