//! # court CLI entry point
//!
//! Parses command-line arguments, sets up logging, connects to the court
//! and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use court_cli::connect::{ConnectionArgs, Court};
use court_cli::dispute::{run_dispute, DisputeArgs};
use court_cli::heartbeat::{run_heartbeat, HeartbeatArgs};
use court_cli::juror::{run_juror, JurorArgs};
use court_cli::subscribe::{run_subscribe, SubscribeArgs};
use court_cli::worker::{run_worker, WorkerArgs};

/// Court stack CLI.
///
/// Advances court terms, runs the heartbeat worker, and drives disputes
/// through drafting, voting, appeals and settlement.
#[derive(Parser, Debug)]
#[command(name = "court", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Advance the court's terms once.
    Heartbeat(HeartbeatArgs),

    /// Run a background worker.
    Worker(WorkerArgs),

    /// Dispute lifecycle operations.
    Dispute(DisputeArgs),

    /// Juror stake management.
    Juror(JurorArgs),

    /// Pay subscription fees for an arbitrable subject.
    Subscribe(SubscribeArgs),
}

fn filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter(cli.verbose))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter(cli.verbose))
            .with_target(false)
            .init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "court CLI starting");

    let court = match Court::connect(&cli.connection) {
        Ok(court) => court,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match &cli.command {
        Commands::Heartbeat(args) => run_heartbeat(args, &court).await,
        Commands::Worker(args) => run_worker(args, &court).await,
        Commands::Dispute(args) => run_dispute(args, &court).await,
        Commands::Juror(args) => run_juror(args, &court).await,
        Commands::Subscribe(args) => run_subscribe(args, &court).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use court_cli::dispute::DisputeCommand;
    use court_cli::juror::JurorCommand;
    use court_cli::worker::WorkerCommand;
    use court_core::{Address, DisputeId, Outcome};

    const RPC: &str = "--rpc-url=http://127.0.0.1:8545";

    #[test]
    fn cli_parse_heartbeat_with_cap() {
        let cli = Cli::try_parse_from(["court", RPC, "heartbeat", "--transitions", "2"]).unwrap();
        match cli.command {
            Commands::Heartbeat(args) => assert_eq!(args.transitions, Some(2)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_rejects_zero_transitions() {
        let result = Cli::try_parse_from(["court", RPC, "heartbeat", "--transitions", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_worker_schedule() {
        let cli = Cli::try_parse_from([
            "court", RPC, "worker", "heartbeat", "--name", "terms-1", "--times", "0", "--tries",
            "3", "--repeat", "300",
        ])
        .unwrap();
        let Commands::Worker(args) = cli.command else {
            panic!("expected worker command");
        };
        let WorkerCommand::Heartbeat(schedule) = args.command;
        assert_eq!(schedule.name, "terms-1");
        assert_eq!(schedule.schedule().times, None);
        assert_eq!(schedule.tries, 3);
    }

    #[test]
    fn cli_parse_dispute_reveal() {
        let cli = Cli::try_parse_from([
            "court",
            "dispute",
            "reveal",
            "7",
            "--juror",
            "0x0101010101010101010101010101010101010101",
            "--outcome",
            "3",
            "--password",
            "pw",
        ])
        .unwrap();
        let Commands::Dispute(args) = cli.command else {
            panic!("expected dispute command");
        };
        match args.command {
            DisputeCommand::Reveal {
                dispute,
                juror,
                outcome,
                password,
            } => {
                assert_eq!(dispute, DisputeId(7));
                assert_eq!(juror, Address::repeat_byte(1));
                assert_eq!(outcome, Outcome(3));
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected dispute command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_dispute_create_collects_evidence() {
        let cli = Cli::try_parse_from([
            "court",
            "dispute",
            "create",
            "--subject",
            "0x5151515151515151515151515151515151515151",
            "--evidence",
            "first",
            "--evidence",
            "second",
        ])
        .unwrap();
        let Commands::Dispute(args) = cli.command else {
            panic!("expected dispute command");
        };
        match args.command {
            DisputeCommand::Create {
                rulings, evidence, ..
            } => {
                assert_eq!(rulings, 2);
                assert_eq!(evidence, vec!["first", "second"]);
            }
            other => panic!("unexpected dispute command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_juror_activate_for() {
        let cli = Cli::try_parse_from([
            "court",
            "juror",
            "activate",
            "--amount",
            "10000",
            "--for",
            "0x0202020202020202020202020202020202020202",
        ])
        .unwrap();
        let Commands::Juror(args) = cli.command else {
            panic!("expected juror command");
        };
        match args.command {
            JurorCommand::Activate { amount, for_juror } => {
                assert_eq!(amount, "10000");
                assert_eq!(for_juror, Some(Address::repeat_byte(2)));
            }
            other => panic!("unexpected juror command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_rejects_bad_outcome() {
        let result = Cli::try_parse_from([
            "court", "dispute", "appeal", "1", "--outcome", "yes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_network_flag() {
        let cli = Cli::try_parse_from(["court", "--network", "staging", "heartbeat"]).unwrap();
        assert_eq!(cli.connection.network, court_client::Network::Staging);
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(filter(0).to_string(), "warn");
        assert_eq!(filter(2).to_string(), "debug");
        assert_eq!(filter(9).to_string(), "trace");
    }
}
