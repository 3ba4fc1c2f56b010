//! # court-arbitration -- Dispute Lifecycle Orchestration
//!
//! Drives disputes through the external court ledger:
//!
//! - **Heartbeat** (`heartbeat.rs`): [`TermAdvancer`] moves the ledger's
//!   clock forward, submitting nothing when no transition is owed.
//!
//! - **Orchestrator** (`orchestrator.rs`): [`DisputeOrchestrator`] drafts
//!   jurors, relays commit/reveal votes and appeals, executes rulings, and
//!   settles penalties, rewards and appeal deposits across every round.
//!
//! ## Crate Policy
//!
//! - Depends on `court-core` and `court-client` internally.
//! - Stateless between operations: every decision is made on state re-read
//!   from the ledger, never on a cached copy.
//! - No implicit retries. Failures propagate unless they are an
//!   "already settled" rejection during settlement.

pub mod error;
pub mod heartbeat;
pub mod orchestrator;

pub use error::ArbitrationError;
pub use heartbeat::TermAdvancer;
pub use orchestrator::{DisputeOrchestrator, SettlementReport};
