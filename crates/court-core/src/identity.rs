//! # Identifier Newtypes
//!
//! Identifiers assigned by the ledger. Each one is a distinct type. A
//! [`RoundId`] cannot be passed where a [`TermId`] is expected.
//!
//! [`VoteId`] is derived, not assigned: the voting contract keys each round's
//! vote by `disputeId · 2^128 + roundId`, and [`VoteId::new`] computes the
//! same value locally.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Access the underlying integer.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidIdentifier {
                        kind: $kind,
                        input: s.to_string(),
                    })
            }
        }
    };
}

numeric_id!(
    /// Identifier of a dispute, assigned by the dispute manager on creation.
    DisputeId,
    "dispute id"
);

numeric_id!(
    /// Zero-based index of an adjudication round within a dispute.
    RoundId,
    "round id"
);

numeric_id!(
    /// The ledger's discrete time unit. Monotonically increasing.
    TermId,
    "term id"
);

impl RoundId {
    /// Every round from the first up to and including `last`.
    pub fn up_to(last: RoundId) -> impl Iterator<Item = RoundId> {
        (0..=last.0).map(RoundId)
    }
}

impl TermId {
    /// Number of term transitions needed to move from `self` to `target`.
    /// Zero when `target` is not ahead.
    pub fn transitions_until(self, target: TermId) -> u64 {
        target.0.saturating_sub(self.0)
    }
}

/// Identifier of the commit/reveal vote attached to one dispute round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteId(U256);

impl VoteId {
    /// Derive the vote identifier for `round` of `dispute`.
    pub fn new(dispute: DisputeId, round: RoundId) -> Self {
        Self((U256::from(dispute.0) << 128) + U256::from(round.0))
    }

    /// Wrap a raw vote identifier read from the ledger.
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Access the underlying 256-bit value.
    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A voting outcome.
///
/// `0` is "missing" (no vote cast, or no ruling yet when used as a dispute's
/// final ruling), `1` is "leaked", `2` is "refused". Rulings proper start at
/// `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome(pub u8);

impl Outcome {
    /// No vote, or no final ruling yet.
    pub const MISSING: Outcome = Outcome(0);
    /// The juror's vote was leaked before reveal.
    pub const LEAKED: Outcome = Outcome(1);
    /// The juror refused to rule.
    pub const REFUSED: Outcome = Outcome(2);

    /// Whether this is the "missing" sentinel.
    pub fn is_missing(self) -> bool {
        self == Self::MISSING
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Outcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(Outcome)
            .map_err(|_| ValidationError::InvalidOutcome(s.to_string()))
    }
}
