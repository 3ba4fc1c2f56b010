//! # Dispute Subcommand
//!
//! Dispute lifecycle operations against the live court.
//!
//! ## Subcommands
//!
//! - `create` -- Create a dispute and submit its evidence.
//! - `draft` -- Draft jurors for the last round, advancing terms first.
//! - `commit` / `reveal` -- Seal and open a vote.
//! - `appeal` / `confirm-appeal` -- Appeal a round's ruling, or oppose an appeal.
//! - `execute` -- Execute the final ruling.
//! - `can-settle` -- Whether settlement can start.
//! - `settle` -- Settle everything a ruled dispute owes.
//! - `settle-round` -- Settle penalties and appeal deposits of every round.
//! - `settle-juror` -- Settle one juror's rewards.

use anyhow::Result;
use clap::{Args, Subcommand};
use court_core::{Address, Bytes, DisputeId, Outcome};

use crate::connect::Court;

/// Arguments for the `court dispute` subcommand.
#[derive(Args, Debug)]
pub struct DisputeArgs {
    #[command(subcommand)]
    pub command: DisputeCommand,
}

#[derive(Subcommand, Debug)]
pub enum DisputeCommand {
    /// Create a dispute for an arbitrable subject.
    Create {
        /// Arbitrable subject address.
        #[arg(long)]
        subject: Address,
        /// Number of possible rulings.
        #[arg(long, default_value_t = 2)]
        rulings: u8,
        /// Dispute metadata, as text.
        #[arg(long, default_value = "")]
        metadata: String,
        /// Evidence items, as text, submitted in order.
        #[arg(long)]
        evidence: Vec<String>,
    },

    /// Draft jurors for the dispute's last round.
    Draft { dispute: DisputeId },

    /// Commit a sealed vote for the dispute's last round.
    Commit {
        dispute: DisputeId,
        #[arg(long)]
        outcome: Outcome,
        /// Password the vote salt is derived from. Needed again to reveal.
        #[arg(long)]
        password: String,
    },

    /// Reveal a juror's committed vote.
    Reveal {
        dispute: DisputeId,
        #[arg(long)]
        juror: Address,
        #[arg(long)]
        outcome: Outcome,
        #[arg(long)]
        password: String,
    },

    /// Appeal the last round in favour of `outcome`.
    Appeal {
        dispute: DisputeId,
        #[arg(long)]
        outcome: Outcome,
    },

    /// Confirm an appeal in favour of `outcome`.
    ConfirmAppeal {
        dispute: DisputeId,
        #[arg(long)]
        outcome: Outcome,
    },

    /// Execute the final ruling.
    Execute { dispute: DisputeId },

    /// Print whether settlement can start.
    CanSettle { dispute: DisputeId },

    /// Settle penalties, rewards and appeal deposits.
    Settle { dispute: DisputeId },

    /// Settle every round's penalties and appeal deposits.
    SettleRound { dispute: DisputeId },

    /// Settle one juror's rewards in every round.
    SettleJuror {
        dispute: DisputeId,
        #[arg(long)]
        juror: Address,
    },
}

/// Execute the dispute subcommand.
pub async fn run_dispute(args: &DisputeArgs, court: &Court) -> Result<u8> {
    let orchestrator = &court.orchestrator;
    match &args.command {
        DisputeCommand::Create {
            subject,
            rulings,
            metadata,
            evidence,
        } => {
            let evidence: Vec<Bytes> = evidence
                .iter()
                .map(|item| Bytes::from(item.clone().into_bytes()))
                .collect();
            let dispute = court
                .gateway()
                .submit_dispute(
                    *subject,
                    *rulings,
                    Bytes::from(metadata.clone().into_bytes()),
                    &evidence,
                )
                .await?;
            println!("OK: created dispute #{dispute}");
        }

        DisputeCommand::Draft { dispute } => {
            let jurors = orchestrator.draft(*dispute).await?;
            println!("OK: drafted {} jurors for dispute #{dispute}", jurors.len());
            for juror in jurors {
                println!("  {juror}");
            }
        }

        DisputeCommand::Commit {
            dispute,
            outcome,
            password,
        } => {
            let receipt = orchestrator.commit(*dispute, *outcome, password).await?;
            println!(
                "OK: committed vote for dispute #{dispute} (tx {})",
                receipt.transaction_hash
            );
        }

        DisputeCommand::Reveal {
            dispute,
            juror,
            outcome,
            password,
        } => {
            let receipt = orchestrator
                .reveal(*dispute, *juror, *outcome, password)
                .await?;
            println!(
                "OK: revealed vote of {juror} for dispute #{dispute} (tx {})",
                receipt.transaction_hash
            );
        }

        DisputeCommand::Appeal { dispute, outcome } => {
            let receipt = orchestrator.appeal(*dispute, *outcome).await?;
            println!(
                "OK: appealed dispute #{dispute} in favour of {outcome} (tx {})",
                receipt.transaction_hash
            );
        }

        DisputeCommand::ConfirmAppeal { dispute, outcome } => {
            let receipt = orchestrator.confirm_appeal(*dispute, *outcome).await?;
            println!(
                "OK: confirmed appeal of dispute #{dispute} in favour of {outcome} (tx {})",
                receipt.transaction_hash
            );
        }

        DisputeCommand::Execute { dispute } => {
            let receipt = orchestrator.execute(*dispute).await?;
            println!(
                "OK: executed ruling of dispute #{dispute} (tx {})",
                receipt.transaction_hash
            );
        }

        DisputeCommand::CanSettle { dispute } => {
            let ready = orchestrator.can_settle(*dispute).await?;
            println!("{ready}");
        }

        DisputeCommand::Settle { dispute } => {
            let report = orchestrator.settle(*dispute).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        DisputeCommand::SettleRound { dispute } => {
            let report = orchestrator.settle_round(*dispute).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        DisputeCommand::SettleJuror { dispute, juror } => {
            let rounds = orchestrator.settle_juror(*dispute, *juror).await?;
            if rounds.is_empty() {
                println!("OK: nothing to settle for {juror} in dispute #{dispute}");
            } else {
                let listed: Vec<String> = rounds.iter().map(ToString::to_string).collect();
                println!(
                    "OK: settled rewards of {juror} in dispute #{dispute}, rounds {}",
                    listed.join(", ")
                );
            }
        }
    }
    Ok(0)
}
