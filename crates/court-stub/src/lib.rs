//! # court-stub -- In-Memory Court Ledger and Read Index
//!
//! Process-local stand-ins for the two external systems the court stack
//! talks to. [`MemoryLedger`] implements [`court_client::Ledger`] and
//! [`MemoryIndex`] implements [`court_client::ReadIndex`].
//!
//! State is seeded directly (`set_term`, `insert_dispute`, `set_drafted`,
//! ...) and every submission is recorded as a [`LedgerCall`], so tests can
//! assert exactly what a gateway or orchestrator sent.

pub mod index;
pub mod ledger;

pub use index::MemoryIndex;
pub use ledger::{LedgerCall, MemoryLedger};
