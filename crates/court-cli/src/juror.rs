//! # Juror Subcommand
//!
//! Stake management for jurors. Amounts are human-scale decimals in
//! jurors-token units (e.g. `10000` or `12.5`) and are scaled by the
//! token's decimals before submission.

use anyhow::Result;
use clap::{Args, Subcommand};
use court_core::{Address, Bytes};

use crate::connect::Court;

/// Arguments for the `court juror` subcommand.
#[derive(Args, Debug)]
pub struct JurorArgs {
    #[command(subcommand)]
    pub command: JurorCommand,
}

#[derive(Subcommand, Debug)]
pub enum JurorCommand {
    /// Stake jurors tokens for a juror.
    Stake {
        #[arg(long)]
        juror: Address,
        #[arg(long)]
        amount: String,
        /// Data forwarded with the stake, as hex.
        #[arg(long, default_value = "0x")]
        data: Bytes,
    },

    /// Withdraw available stake.
    Unstake {
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "0x")]
        data: Bytes,
    },

    /// Activate stake. With `--for`, stakes and activates for that juror.
    Activate {
        #[arg(long)]
        amount: String,
        #[arg(long = "for")]
        for_juror: Option<Address>,
    },

    /// Request deactivation of active stake.
    Deactivate {
        #[arg(long)]
        amount: String,
    },
}

/// Execute the juror subcommand.
pub async fn run_juror(args: &JurorArgs, court: &Court) -> Result<u8> {
    let gateway = court.gateway();
    let receipt = match &args.command {
        JurorCommand::Stake {
            juror,
            amount,
            data,
        } => {
            let receipt = gateway.stake(*juror, amount, data.clone()).await?;
            println!("OK: staked {amount} for {juror}");
            receipt
        }
        JurorCommand::Unstake { amount, data } => {
            let receipt = gateway.unstake(amount, data.clone()).await?;
            println!("OK: unstaked {amount}");
            receipt
        }
        JurorCommand::Activate {
            amount,
            for_juror: Some(juror),
        } => {
            let receipt = gateway.activate_for(*juror, amount).await?;
            println!("OK: staked and activated {amount} for {juror}");
            receipt
        }
        JurorCommand::Activate {
            amount,
            for_juror: None,
        } => {
            let receipt = gateway.activate(amount).await?;
            println!("OK: activated {amount}");
            receipt
        }
        JurorCommand::Deactivate { amount } => {
            let receipt = gateway.deactivate(amount).await?;
            println!("OK: requested deactivation of {amount}");
            receipt
        }
    };
    println!("  tx {}", receipt.transaction_hash);
    Ok(0)
}
