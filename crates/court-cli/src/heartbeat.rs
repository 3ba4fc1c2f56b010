//! # Heartbeat Subcommand
//!
//! Advances the court's terms once and exits.

use anyhow::Result;
use clap::Args;

use crate::connect::Court;

/// Arguments for the `court heartbeat` subcommand.
#[derive(Args, Debug)]
pub struct HeartbeatArgs {
    /// Maximum transitions to process. All owed transitions when omitted.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub transitions: Option<u64>,
}

pub async fn run_heartbeat(args: &HeartbeatArgs, court: &Court) -> Result<u8> {
    let transitions = court
        .orchestrator
        .terms()
        .heartbeat(args.transitions)
        .await?;
    println!("OK: transitioned {transitions} court terms");
    Ok(0)
}
