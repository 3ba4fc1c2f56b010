//! # court-cli -- Court Stack Command-Line Interface
//!
//! ## Subcommands
//!
//! - `heartbeat` -- advance the court's terms once
//! - `worker heartbeat` -- keep advancing terms on a schedule
//! - `dispute` -- create, draft, vote, appeal, execute and settle disputes
//! - `juror` -- stake, unstake, activate and deactivate jurors tokens
//! - `subscribe` -- pay subscription fees for an arbitrable subject
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; every handler delegates to `court-client`,
//!   `court-arbitration` or `court-worker`.
//! - Connection settings come from `COURT_*` environment variables, each of
//!   which a global flag can override.
//! - A failed worker job never changes the exit code. A failed one-shot
//!   command exits 1.

pub mod connect;
pub mod dispute;
pub mod heartbeat;
pub mod juror;
pub mod subscribe;
pub mod worker;
