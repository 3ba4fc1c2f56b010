//! # court-client -- Ledger and Read-Index Access for the Court Stack
//!
//! Everything that leaves the process goes through this crate:
//!
//! - [`Ledger`] is the capability bundle for the external court ledger
//!   (resolve the sending account, resolve contract addresses, read state,
//!   submit transactions). [`RpcLedger`] implements it over JSON-RPC. The
//!   in-process implementation used by tests lives in `court-stub`.
//! - [`LedgerGateway`] layers the rules every caller needs on top of a
//!   ledger: allowance resets, amount scaling, event extraction, and the
//!   no-op heartbeat when nothing is owed.
//! - [`ReadIndex`] answers eventually-consistent queries (drafted jurors).
//!   [`SubgraphIndex`] queries the court subgraph.
//!
//! ## Retry Policy
//!
//! Read-only HTTP calls are retried on transport failure with exponential
//! backoff, as configured by [`ReadRetry`]. Submissions are never retried here; a resend could duplicate a
//! side effect. Callers decide whether to try again after re-reading state.

pub mod config;
pub mod error;
pub mod gateway;
pub mod index;
pub mod ledger;
pub mod retry;
pub mod rpc;

pub use config::{ConfigError, CourtConfig, Network};
pub use error::{IndexError, LedgerError, RejectionReason};
pub use gateway::{activate_data, LedgerGateway};
pub use index::{ReadIndex, SubgraphIndex};
pub use ledger::Ledger;
pub use retry::ReadRetry;
pub use rpc::RpcLedger;
