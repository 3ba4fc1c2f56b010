//! # Connection Settings
//!
//! Resolves the ledger relay and read index endpoints from flags, falling
//! back to the `COURT_*` environment variables that
//! [`CourtConfig::from_env`] reads, and opens the clients.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use court_arbitration::DisputeOrchestrator;
use court_client::{
    CourtConfig, Ledger, LedgerGateway, Network, ReadIndex, ReadRetry, RpcLedger,
    SubgraphIndex,
};
use url::Url;
use zeroize::Zeroizing;

/// Default per-request timeout, matching `CourtConfig::from_env`.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read resend defaults, matching `ReadRetry::default`.
const DEFAULT_READ_RETRIES: u32 = 3;
const DEFAULT_READ_RETRY_BASE_MS: u64 = 200;

/// Endpoint flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Court network: mainnet, rinkeby, ropsten or staging.
    #[arg(long, global = true, env = "COURT_NETWORK", default_value = "mainnet")]
    pub network: Network,

    /// JSON-RPC endpoint of the ledger relay.
    #[arg(long, global = true, env = "COURT_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// GraphQL endpoint of the read index. Defaults to the network's
    /// public subgraph.
    #[arg(long, global = true, env = "COURT_SUBGRAPH_URL")]
    pub subgraph_url: Option<Url>,

    /// Bearer token for the relay.
    #[arg(long, global = true, env = "COURT_RPC_TOKEN", hide_env_values = true)]
    pub rpc_token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "COURT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Resends of a failed read after a transport error.
    #[arg(long, global = true, env = "COURT_READ_RETRIES", default_value_t = DEFAULT_READ_RETRIES)]
    pub read_retries: u32,

    /// Pause before the first read resend, in milliseconds. Doubles on
    /// every further resend.
    #[arg(long, global = true, env = "COURT_READ_RETRY_BASE_MS", default_value_t = DEFAULT_READ_RETRY_BASE_MS)]
    pub read_retry_base_ms: u64,
}

impl ConnectionArgs {
    pub fn config(&self) -> Result<CourtConfig> {
        let rpc_url = self
            .rpc_url
            .clone()
            .context("no ledger relay configured: pass --rpc-url or set COURT_RPC_URL")?;
        let subgraph_url = match &self.subgraph_url {
            Some(url) => url.clone(),
            None => self.network.default_subgraph_url()?,
        };
        Ok(CourtConfig {
            network: self.network,
            rpc_url,
            subgraph_url,
            rpc_token: self.rpc_token.clone().map(Zeroizing::new),
            timeout_secs: self.timeout_secs,
            read_retry: ReadRetry {
                retries: self.read_retries,
                base_delay: Duration::from_millis(self.read_retry_base_ms),
            },
        })
    }
}

/// Clients for one CLI invocation.
pub struct Court {
    pub orchestrator: DisputeOrchestrator<dyn Ledger, dyn ReadIndex>,
}

impl Court {
    pub fn connect(args: &ConnectionArgs) -> Result<Self> {
        let config = args.config()?;
        tracing::debug!(?config, "connecting to court");

        let ledger: Arc<dyn Ledger> =
            Arc::new(RpcLedger::new(&config).context("failed to build ledger client")?);
        let index: Arc<dyn ReadIndex> =
            Arc::new(SubgraphIndex::new(&config).context("failed to build read index client")?);
        Ok(Self {
            orchestrator: DisputeOrchestrator::new(LedgerGateway::new(ledger), index),
        })
    }

    pub fn gateway(&self) -> &LedgerGateway<dyn Ledger> {
        self.orchestrator.gateway()
    }
}
