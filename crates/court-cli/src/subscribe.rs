//! # Subscribe Subcommand
//!
//! Pays subscription fees for an arbitrable subject, approving the fee
//! token to the fee recipient first.

use anyhow::Result;
use clap::Args;
use court_core::Address;

use crate::connect::Court;

/// Arguments for the `court subscribe` subcommand.
#[derive(Args, Debug)]
pub struct SubscribeArgs {
    /// Arbitrable subject to pay for.
    #[arg(long)]
    pub subject: Address,
    /// Periods to pay.
    #[arg(long, default_value_t = 1)]
    pub periods: u64,
}

pub async fn run_subscribe(args: &SubscribeArgs, court: &Court) -> Result<u8> {
    let receipt = court
        .gateway()
        .subscribe(args.subject, args.periods)
        .await?;
    println!(
        "OK: paid {} period(s) for {} (tx {})",
        args.periods, args.subject, receipt.transaction_hash
    );
    Ok(0)
}
