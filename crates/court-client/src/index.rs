//! # Read Index
//!
//! Eventually-consistent queries the ledger cannot answer cheaply: which
//! jurors were drafted into a round. The index lags the ledger, so a dispute
//! or round it has not seen yet yields an empty list rather than an error.
//!
//! [`SubgraphIndex`] queries the public court subgraph over GraphQL:
//!
//! ```text
//! { dispute(id: "3") { id rounds(where: { number: "0" }) { jurors { juror { id } } } } }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use court_core::{Address, DisputeId, RoundId};
use serde::Deserialize;
use url::Url;

use crate::config::CourtConfig;
use crate::error::IndexError;
use crate::retry::ReadRetry;

/// Read-side queries over indexed court state.
#[async_trait]
pub trait ReadIndex: Send + Sync {
    /// Jurors drafted into `round` of `dispute`, one entry per juror.
    async fn drafted_jurors(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Vec<Address>, IndexError>;
}

// -- GraphQL response shapes --------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    data: Option<DisputeData>,
    #[serde(default)]
    errors: Option<Vec<GraphError>>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DisputeData {
    #[serde(default)]
    dispute: Option<IndexedDispute>,
}

#[derive(Debug, Deserialize)]
struct IndexedDispute {
    #[serde(default)]
    rounds: Vec<IndexedRound>,
}

#[derive(Debug, Deserialize)]
struct IndexedRound {
    #[serde(default)]
    jurors: Vec<IndexedDraft>,
}

#[derive(Debug, Deserialize)]
struct IndexedDraft {
    juror: IndexedJuror,
}

#[derive(Debug, Deserialize)]
struct IndexedJuror {
    id: Address,
}

// -- Client -------------------------------------------------------------------

/// [`ReadIndex`] backed by the court subgraph.
#[derive(Debug, Clone)]
pub struct SubgraphIndex {
    http: reqwest::Client,
    endpoint: Url,
    read_retry: ReadRetry,
}

impl SubgraphIndex {
    pub fn new(config: &CourtConfig) -> Result<Self, IndexError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.subgraph_url.clone(),
            read_retry: config.read_retry,
        })
    }

    /// The GraphQL endpoint queried.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn drafted_jurors_query(dispute: DisputeId, round: RoundId) -> String {
        format!(
            "{{ dispute(id: \"{dispute}\") {{ id rounds(where: {{ number: \"{round}\" }}) \
             {{ jurors {{ juror {{ id }} }} }} }} }}"
        )
    }
}

#[async_trait]
impl ReadIndex for SubgraphIndex {
    async fn drafted_jurors(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Vec<Address>, IndexError> {
        let body = serde_json::json!({ "query": Self::drafted_jurors_query(dispute, round) });

        let resp = self
            .read_retry
            .send("subgraph_drafted_jurors", || {
                self.http
                    .post(self.endpoint.clone())
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(&body)
                    .send()
            })
            .await
        .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(IndexError::Unavailable(format!(
                "HTTP {}: {text}",
                status.as_u16()
            )));
        }

        let parsed: GraphResponse = resp
            .json()
            .await
            .map_err(|e| IndexError::Malformed(e.to_string()))?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(IndexError::Query(joined));
        }

        let jurors: Vec<Address> = parsed
            .data
            .and_then(|d| d.dispute)
            .and_then(|d| d.rounds.into_iter().next())
            .map(|r| r.jurors.into_iter().map(|j| j.juror.id).collect())
            .unwrap_or_default();

        tracing::debug!(%dispute, %round, count = jurors.len(), "queried drafted jurors");
        Ok(jurors)
    }
}
