//! # Error Hierarchy
//!
//! Validation errors for the primitive types defined in this crate, built
//! with `thiserror`. Ledger, index and orchestration failures live in the
//! crates that produce them.

use thiserror::Error;

/// Validation errors for domain primitive parsing.
///
/// Each variant carries the rejected input so operators can diagnose
/// misconfiguration from the message alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric identifier could not be parsed.
    #[error("invalid {kind}: \"{input}\" (expected a non-negative integer)")]
    InvalidIdentifier {
        /// The identifier kind (e.g. "dispute id").
        kind: &'static str,
        /// The rejected input.
        input: String,
    },

    /// An outcome is outside the `u8` range used by the voting contract.
    #[error("invalid outcome: \"{0}\" (expected 0-255)")]
    InvalidOutcome(String),

    /// A court module name is not recognised.
    #[error("unknown court module: \"{0}\"")]
    UnknownModule(String),
}

/// Errors converting between human-scale and base-unit token amounts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The amount string is empty or contains non-digit characters.
    #[error("invalid token amount: \"{0}\"")]
    Malformed(String),

    /// Negative amounts are never valid for staking or deposits.
    #[error("negative token amount: \"{0}\"")]
    Negative(String),

    /// The amount carries more fractional digits than the token supports.
    #[error("token amount \"{amount}\" has more than {decimals} fractional digits")]
    TooPrecise {
        /// The rejected input.
        amount: String,
        /// The token's declared decimals.
        decimals: u8,
    },

    /// Scaling the amount overflows 256 bits.
    #[error("token amount \"{0}\" overflows 256 bits")]
    Overflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_error_names_kind_and_input() {
        let err = ValidationError::InvalidIdentifier {
            kind: "dispute id",
            input: "abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid dispute id: \"abc\" (expected a non-negative integer)"
        );
    }

    #[test]
    fn too_precise_mentions_decimals() {
        let err = AmountError::TooPrecise {
            amount: "1.0001".into(),
            decimals: 2,
        };
        assert!(err.to_string().contains("more than 2 fractional digits"));
    }
}
