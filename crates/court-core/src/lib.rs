//! # court-core -- Foundational Types for the Court Stack
//!
//! Every other crate in the workspace depends on `court-core`; it depends on
//! nothing internal. It defines the vocabulary shared by the ledger gateway,
//! the dispute orchestrator and the heartbeat worker.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `DisputeId`, `RoundId`, `TermId` and `VoteId`
//!    are distinct types. A round number cannot be passed where a term is
//!    expected.
//!
//! 2. **No local source of truth.** The structs in [`ledger`] are snapshots
//!    of state owned by the external ledger. Nothing in the stack caches them
//!    across operations.
//!
//! 3. **Integer amounts only.** Token amounts are 256-bit unsigned integers in
//!    the token's base units. Human-scale input is converted by [`amount`]
//!    with an explicit decimal scale. Floating point never appears.
//!
//! 4. **Deterministic vote sealing.** [`vote`] reproduces the hashing the
//!    voting contract performs, so a commitment computed here is accepted at
//!    reveal time.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `court-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod vote;

pub use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

pub use amount::{format_units, to_base_units};
pub use error::{AmountError, ValidationError};
pub use identity::{DisputeId, Outcome, RoundId, TermId, VoteId};
pub use ledger::{
    AdjudicationState, Appeal, CourtModule, Dispute, DisputeState, JurorDraft, LedgerEvent,
    NextRoundDetails, Receipt, Round, SubscriptionFees,
};
