//! Errors raised while driving a dispute through its lifecycle.

use court_client::{IndexError, LedgerError};

/// Errors from the term advancer and the dispute orchestrator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArbitrationError {
    /// A ledger read or submission failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A read-index query failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The ledger still refuses the operation after terms were advanced.
    #[error("{operation} precondition unmet after advancing terms: {reason}")]
    Precondition { operation: String, reason: String },
}

impl ArbitrationError {
    /// Whether the underlying ledger or index was unreachable.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_unavailable(),
            Self::Index(e) => matches!(e, IndexError::Unavailable(_)),
            Self::Precondition { .. } => false,
        }
    }
}
