//! Ledger and read-index error types.
//!
//! Ledger rejections carry a structured [`RejectionReason`] decoded from the
//! reason code the ledger attaches to a refused request. Callers that need to
//! tolerate a specific, race-safe rejection (an appeal deposit someone else
//! already settled) compare enum values; nothing matches on message text.

use std::fmt;

use court_core::AmountError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::ConfigError;

/// Reason code attached to a ledger rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// The round's appeal deposits were already settled.
    AppealAlreadySettled,
    /// The round's penalties were already settled.
    PenaltiesAlreadySettled,
    /// The juror's reward for the round was already settled.
    JurorAlreadyRewarded,
    /// The revealed outcome and salt do not hash to the stored commitment.
    InvalidCommitmentSalt,
    /// The juror already committed a vote.
    VoteAlreadyCommitted,
    /// The juror already revealed a vote.
    VoteAlreadyRevealed,
    /// The ledger has pending term transitions that must be processed first.
    TermOutdated,
    /// The round's draft term has not started yet.
    DraftTermNotReached,
    /// The round is not in the state the request requires.
    InvalidAdjudicationState,
    /// The spender's allowance does not cover the transfer.
    InsufficientAllowance,
    /// Any code this client does not interpret.
    Other(String),
}

impl RejectionReason {
    /// Decode a ledger reason code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "DM_APPEAL_ALREADY_SETTLED" => Self::AppealAlreadySettled,
            "DM_ROUND_PENALTIES_ALREADY_SETTLED" => Self::PenaltiesAlreadySettled,
            "DM_JUROR_ALREADY_REWARDED" => Self::JurorAlreadyRewarded,
            "CRV_INVALID_COMMITMENT_SALT" => Self::InvalidCommitmentSalt,
            "CRV_VOTE_ALREADY_COMMITTED" => Self::VoteAlreadyCommitted,
            "CRV_VOTE_ALREADY_REVEALED" => Self::VoteAlreadyRevealed,
            "CLK_TERM_OUTDATED" => Self::TermOutdated,
            "DM_DRAFT_TERM_NOT_REACHED" => Self::DraftTermNotReached,
            "DM_INVALID_ADJUDICATION_STATE" => Self::InvalidAdjudicationState,
            "TOKEN_INSUFFICIENT_ALLOWANCE" => Self::InsufficientAllowance,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire code of this reason.
    pub fn code(&self) -> &str {
        match self {
            Self::AppealAlreadySettled => "DM_APPEAL_ALREADY_SETTLED",
            Self::PenaltiesAlreadySettled => "DM_ROUND_PENALTIES_ALREADY_SETTLED",
            Self::JurorAlreadyRewarded => "DM_JUROR_ALREADY_REWARDED",
            Self::InvalidCommitmentSalt => "CRV_INVALID_COMMITMENT_SALT",
            Self::VoteAlreadyCommitted => "CRV_VOTE_ALREADY_COMMITTED",
            Self::VoteAlreadyRevealed => "CRV_VOTE_ALREADY_REVEALED",
            Self::TermOutdated => "CLK_TERM_OUTDATED",
            Self::DraftTermNotReached => "DM_DRAFT_TERM_NOT_REACHED",
            Self::InvalidAdjudicationState => "DM_INVALID_ADJUDICATION_STATE",
            Self::InsufficientAllowance => "TOKEN_INSUFFICIENT_ALLOWANCE",
            Self::Other(code) => code,
        }
    }

    /// Whether the rejection means the settlement already happened, so a
    /// repeated settlement attempt changed nothing.
    pub fn is_already_settled(&self) -> bool {
        matches!(
            self,
            Self::AppealAlreadySettled | Self::PenaltiesAlreadySettled | Self::JurorAlreadyRewarded
        )
    }

    /// Whether the rejection means the ledger's term is behind what the
    /// request needs.
    pub fn is_term_precondition(&self) -> bool {
        matches!(self, Self::TermOutdated | Self::DraftTermNotReached)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for RejectionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for RejectionReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

/// Errors from ledger reads and submissions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// The ledger could not be reached or failed to answer.
    #[error("ledger unavailable during {operation}: {reason}")]
    Unavailable { operation: String, reason: String },

    /// The ledger refused the request.
    #[error("ledger rejected {operation}: {reason} ({message})")]
    Rejected {
        operation: String,
        reason: RejectionReason,
        message: String,
    },

    /// A submission was accepted but its receipt lacks the event the caller
    /// needs to extract its result.
    #[error("{operation} was accepted but emitted no {event} event")]
    MissingEvent {
        operation: String,
        event: &'static str,
    },

    /// The ledger answered with something that does not decode.
    #[error("malformed ledger response for {operation}: {reason}")]
    Malformed { operation: String, reason: String },

    /// A human-scale amount could not be converted to base units.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LedgerError {
    /// Shorthand for a rejection whose message is its code.
    pub fn rejected(operation: impl Into<String>, reason: RejectionReason) -> Self {
        let message = reason.code().to_string();
        Self::Rejected {
            operation: operation.into(),
            reason,
            message,
        }
    }

    /// The rejection reason, if the ledger refused the request.
    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Whether the ledger was unreachable (eligible for a daemon-level retry).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Errors from read-index queries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndexError {
    /// The index could not be reached.
    #[error("read index unavailable: {0}")]
    Unavailable(String),

    /// The index answered with query errors.
    #[error("read index query failed: {0}")]
    Query(String),

    /// The index answered with something that does not decode.
    #[error("malformed read index response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        for reason in [
            RejectionReason::AppealAlreadySettled,
            RejectionReason::PenaltiesAlreadySettled,
            RejectionReason::JurorAlreadyRewarded,
            RejectionReason::InvalidCommitmentSalt,
            RejectionReason::VoteAlreadyCommitted,
            RejectionReason::VoteAlreadyRevealed,
            RejectionReason::TermOutdated,
            RejectionReason::DraftTermNotReached,
            RejectionReason::InvalidAdjudicationState,
            RejectionReason::InsufficientAllowance,
        ] {
            assert_eq!(RejectionReason::from_code(reason.code()), reason);
        }
    }

    #[test]
    fn unknown_code_is_preserved() {
        let reason = RejectionReason::from_code("DM_SOMETHING_NEW");
        assert_eq!(reason, RejectionReason::Other("DM_SOMETHING_NEW".into()));
        assert_eq!(reason.code(), "DM_SOMETHING_NEW");
    }

    #[test]
    fn similar_text_is_not_the_benign_code() {
        let reason = RejectionReason::from_code("DM_APPEAL_ALREADY_SETTLED_V2");
        assert_ne!(reason, RejectionReason::AppealAlreadySettled);
        assert!(!reason.is_already_settled());
    }

    #[test]
    fn reason_serializes_as_code() {
        let json = serde_json::to_string(&RejectionReason::TermOutdated).unwrap();
        assert_eq!(json, "\"CLK_TERM_OUTDATED\"");
        let back: RejectionReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RejectionReason::TermOutdated);
    }

    #[test]
    fn rejection_accessor() {
        let err = LedgerError::rejected("settle_reward", RejectionReason::JurorAlreadyRewarded);
        assert_eq!(err.rejection(), Some(&RejectionReason::JurorAlreadyRewarded));
        assert!(!err.is_unavailable());
        assert!(err.to_string().contains("DM_JUROR_ALREADY_REWARDED"));
    }
}
