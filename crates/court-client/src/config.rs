//! Court client configuration.
//!
//! Selects the network and the endpoints for the ledger relay and the read
//! index. The index endpoint defaults to the public subgraph for the chosen
//! network. Override via environment variables or explicit construction for
//! staging/testing.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::retry::ReadRetry;

/// Base URL of the public court subgraphs. Non-mainnet networks append
/// `-<network>`.
const SUBGRAPH_BASE: &str = "https://api.thegraph.com/subgraphs/name/aragon/aragon-court";

/// Deployment target the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Rinkeby,
    Ropsten,
    Staging,
}

impl Network {
    /// The network's lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Rinkeby => "rinkeby",
            Self::Ropsten => "ropsten",
            Self::Staging => "staging",
        }
    }

    /// The public subgraph serving this network.
    pub fn default_subgraph_url(&self) -> Result<Url, ConfigError> {
        let raw = match self {
            Self::Mainnet => SUBGRAPH_BASE.to_string(),
            other => format!("{SUBGRAPH_BASE}-{}", other.as_str()),
        };
        Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl("subgraph".to_string(), e.to_string()))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "rinkeby" => Ok(Self::Rinkeby),
            "ropsten" => Ok(Self::Ropsten),
            "staging" => Ok(Self::Staging),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Configuration for connecting to the ledger relay and the read index.
///
/// Custom `Debug` implementation redacts the `rpc_token` field to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct CourtConfig {
    /// Network the endpoints belong to.
    pub network: Network,
    /// JSON-RPC endpoint of the ledger relay.
    pub rpc_url: Url,
    /// GraphQL endpoint of the read index.
    pub subgraph_url: Url,
    /// Optional bearer token for the relay.
    pub rpc_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Resend policy for view calls and index queries.
    pub read_retry: ReadRetry,
}

impl fmt::Debug for CourtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CourtConfig")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("subgraph_url", &self.subgraph_url)
            .field("rpc_token", &self.rpc_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("read_retry", &self.read_retry)
            .finish()
    }
}

impl CourtConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `COURT_NETWORK` (default: `mainnet`)
    /// - `COURT_RPC_URL` (required)
    /// - `COURT_SUBGRAPH_URL` (default: the network's public subgraph)
    /// - `COURT_RPC_TOKEN` (optional)
    /// - `COURT_TIMEOUT_SECS` (default: 30)
    /// - `COURT_READ_RETRIES` (default: 3)
    /// - `COURT_READ_RETRY_BASE_MS` (default: 200)
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = match std::env::var("COURT_NETWORK") {
            Ok(raw) => raw.parse()?,
            Err(_) => Network::Mainnet,
        };
        let rpc_raw = std::env::var("COURT_RPC_URL").map_err(|_| ConfigError::MissingRpcUrl)?;
        let rpc_url = Url::parse(&rpc_raw)
            .map_err(|e| ConfigError::InvalidUrl("COURT_RPC_URL".to_string(), e.to_string()))?;
        let subgraph_url = match std::env::var("COURT_SUBGRAPH_URL") {
            Ok(raw) => Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidUrl("COURT_SUBGRAPH_URL".to_string(), e.to_string())
            })?,
            Err(_) => network.default_subgraph_url()?,
        };

        Ok(Self {
            network,
            rpc_url,
            subgraph_url,
            rpc_token: std::env::var("COURT_RPC_TOKEN").ok().map(Zeroizing::new),
            timeout_secs: std::env::var("COURT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            read_retry: read_retry_from_env(),
        })
    }

    /// Create a configuration pointing to local mock servers (for testing):
    /// the relay on `base_port`, the index on `base_port + 1`.
    pub fn local_mock(base_port: u16) -> Result<Self, ConfigError> {
        let index_port = base_port
            .checked_add(1)
            .ok_or(ConfigError::InvalidPort(base_port))?;
        let make_url = |port: u16| -> Result<Url, ConfigError> {
            Url::parse(&format!("http://127.0.0.1:{port}"))
                .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))
        };
        Ok(Self {
            network: Network::Staging,
            rpc_url: make_url(base_port)?,
            subgraph_url: make_url(index_port)?,
            rpc_token: None,
            timeout_secs: 5,
            read_retry: ReadRetry::default(),
        })
    }
}

fn read_retry_from_env() -> ReadRetry {
    let defaults = ReadRetry::default();
    ReadRetry {
        retries: std::env::var("COURT_READ_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retries),
        base_delay: std::env::var("COURT_READ_RETRY_BASE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("COURT_RPC_URL environment variable is required")]
    MissingRpcUrl,
    #[error("unknown network: \"{0}\" (expected mainnet, rinkeby, ropsten or staging)")]
    UnknownNetwork(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid RPC token: not a valid header value")]
    InvalidToken,
    #[error("no port above {0} for the local index")]
    InvalidPort(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_subgraph_has_no_suffix() {
        let url = Network::Mainnet.default_subgraph_url().unwrap();
        assert!(url.as_str().ends_with("/aragon-court"));
    }

    #[test]
    fn testnet_subgraph_is_suffixed() {
        let url = Network::Rinkeby.default_subgraph_url().unwrap();
        assert!(url.as_str().ends_with("/aragon-court-rinkeby"));
    }

    #[test]
    fn network_parses_case_insensitively() {
        assert_eq!("Ropsten".parse::<Network>().unwrap(), Network::Ropsten);
        assert!("goerli".parse::<Network>().is_err());
    }

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = CourtConfig::local_mock(9000).unwrap();
        assert_eq!(cfg.rpc_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.subgraph_url.as_str(), "http://127.0.0.1:9001/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.read_retry, ReadRetry::default());
    }

    #[test]
    fn local_mock_rejects_the_last_port() {
        assert!(matches!(
            CourtConfig::local_mock(u16::MAX),
            Err(ConfigError::InvalidPort(u16::MAX))
        ));
        assert!(CourtConfig::local_mock(u16::MAX - 1).is_ok());
    }

    #[test]
    fn debug_redacts_token() {
        let mut cfg = CourtConfig::local_mock(9000).unwrap();
        cfg.rpc_token = Some(Zeroizing::new("super-secret".into()));
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
