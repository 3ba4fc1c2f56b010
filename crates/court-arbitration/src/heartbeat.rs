//! # Term Advancement
//!
//! The ledger's clock only moves when someone submits a heartbeat. Each
//! heartbeat processes a bounded number of owed term transitions, so a
//! ledger left alone for a while needs several calls to catch up.
//!
//! [`TermAdvancer::heartbeat`] makes one `needed_transitions` query and at
//! most one submission. It never retries; repeating a failed heartbeat is
//! the job of `court_worker::RetryDaemon`.

use court_client::{Ledger, LedgerGateway};

use crate::error::ArbitrationError;

/// Advances the ledger's term.
pub struct TermAdvancer<L: ?Sized> {
    gateway: LedgerGateway<L>,
}

impl<L: ?Sized> Clone for TermAdvancer<L> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for TermAdvancer<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermAdvancer").finish_non_exhaustive()
    }
}

impl<L: Ledger + ?Sized> TermAdvancer<L> {
    pub fn new(gateway: LedgerGateway<L>) -> Self {
        Self { gateway }
    }

    /// Process up to `max` owed transitions, or all of them when `max` is
    /// `None` or `Some(0)`. Returns the number of transitions advanced; 0
    /// means nothing was owed and nothing was submitted.
    pub async fn heartbeat(&self, max: Option<u64>) -> Result<u64, ArbitrationError> {
        let cap = max.filter(|&max| max > 0).unwrap_or(u64::MAX);
        let advanced = self.gateway.advance_terms(cap).await?;
        if advanced == 0 {
            tracing::info!("court terms are up to date");
        }
        Ok(advanced)
    }

    /// Bring the ledger's term fully up to date.
    pub async fn ensure_current(&self) -> Result<u64, ArbitrationError> {
        self.heartbeat(None).await
    }
}
