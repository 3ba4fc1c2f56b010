//! # JSON-RPC Ledger
//!
//! [`Ledger`] implementation that talks JSON-RPC 2.0 to a court relay for a
//! named network. Every request is `POST <rpc_url>` with named-object
//! params and a `court_<name>` method:
//!
//! ```text
//! {"jsonrpc":"2.0","id":7,"method":"court_getRound","params":{"disputeId":3,"roundId":0}}
//! ```
//!
//! The relay answers with either `result` or an error object whose
//! `data.reason` carries the ledger's rejection code:
//!
//! ```text
//! {"jsonrpc":"2.0","id":7,"error":{"code":3,"message":"execution reverted","data":{"reason":"DM_APPEAL_ALREADY_SETTLED"}}}
//! ```
//!
//! View calls are retried on transport failure per the configured
//! [`ReadRetry`].
//! Submissions are sent exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use court_core::{
    Address, Appeal, Bytes, CourtModule, Dispute, DisputeId, JurorDraft, NextRoundDetails, Outcome,
    Receipt, Round, RoundId, SubscriptionFees, TermId, VoteId, B256, U256,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::{ConfigError, CourtConfig};
use crate::error::{LedgerError, RejectionReason};
use crate::ledger::Ledger;
use crate::retry::ReadRetry;

// -- Wire envelope ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    reason: Option<String>,
}

/// Whether a request may be resent after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Read-only; resent with backoff.
    View,
    /// Mutating; sent once.
    Submission,
}

// -- Client -------------------------------------------------------------------

/// Ledger client for a JSON-RPC court relay.
#[derive(Debug)]
pub struct RpcLedger {
    http: reqwest::Client,
    url: Url,
    read_retry: ReadRetry,
    next_id: AtomicU64,
}

impl RpcLedger {
    /// Build a client from configuration. The bearer token, when present,
    /// is attached to every request.
    pub fn new(config: &CourtConfig) -> Result<Self, LedgerError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.rpc_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|_| ConfigError::InvalidToken)?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| LedgerError::Unavailable {
                operation: "client_init".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: config.rpc_url.clone(),
            read_retry: config.read_retry,
            next_id: AtomicU64::new(1),
        })
    }

    /// The relay endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn view<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let result = self.call(method, params, Delivery::View).await?;
        serde_json::from_value(result).map_err(|e| LedgerError::Malformed {
            operation: method.into(),
            reason: e.to_string(),
        })
    }

    async fn submit(&self, method: &'static str, params: Value) -> Result<Receipt, LedgerError> {
        let result = self.call(method, params, Delivery::Submission).await?;
        let receipt: Receipt =
            serde_json::from_value(result).map_err(|e| LedgerError::Malformed {
                operation: method.into(),
                reason: e.to_string(),
            })?;
        tracing::debug!(
            method,
            tx = %receipt.transaction_hash,
            logs = receipt.logs.len(),
            "submission accepted"
        );
        Ok(receipt)
    }

    async fn call(
        &self,
        method: &'static str,
        params: Value,
        delivery: Delivery,
    ) -> Result<Value, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, ?delivery, "ledger request");

        let sent = match delivery {
            Delivery::View => {
                self.read_retry
                    .send(method, || self.http.post(self.url.clone()).json(&body).send())
                    .await
            }
            Delivery::Submission => self.http.post(self.url.clone()).json(&body).send().await,
        };
        let resp = sent.map_err(|e| LedgerError::Unavailable {
            operation: method.into(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Unavailable {
                operation: method.into(),
                reason: format!("HTTP {}: {body}", status.as_u16()),
            });
        }

        let text = resp.text().await.map_err(|e| LedgerError::Unavailable {
            operation: method.into(),
            reason: e.to_string(),
        })?;
        let envelope: RpcResponse =
            serde_json::from_str(&text).map_err(|e| LedgerError::Malformed {
                operation: method.into(),
                reason: if status.is_success() {
                    e.to_string()
                } else {
                    format!("HTTP {}: {text}", status.as_u16())
                },
            })?;

        if let Some(error) = envelope.error {
            let reason = match error.data.and_then(|d| d.reason) {
                Some(code) => RejectionReason::from_code(&code),
                None => RejectionReason::Other(error.message.clone()),
            };
            tracing::debug!(method, code = error.code, %reason, "ledger rejected request");
            return Err(LedgerError::Rejected {
                operation: method.into(),
                reason,
                message: error.message,
            });
        }

        envelope.result.ok_or_else(|| LedgerError::Malformed {
            operation: method.into(),
            reason: "response carries neither result nor error".into(),
        })
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn sender(&self) -> Result<Address, LedgerError> {
        self.view("court_sender", json!({})).await
    }

    async fn module(&self, module: CourtModule) -> Result<Address, LedgerError> {
        self.view("court_module", json!({ "module": module })).await
    }

    async fn current_term(&self) -> Result<TermId, LedgerError> {
        self.view("court_currentTerm", json!({})).await
    }

    async fn needed_transitions(&self) -> Result<u64, LedgerError> {
        self.view("court_neededTransitions", json!({})).await
    }

    async fn dispute(&self, dispute: DisputeId) -> Result<Dispute, LedgerError> {
        self.view("court_getDispute", json!({ "disputeId": dispute }))
            .await
    }

    async fn round(&self, dispute: DisputeId, round: RoundId) -> Result<Round, LedgerError> {
        self.view(
            "court_getRound",
            json!({ "disputeId": dispute, "roundId": round }),
        )
        .await
    }

    async fn appeal(&self, dispute: DisputeId, round: RoundId) -> Result<Appeal, LedgerError> {
        self.view(
            "court_getAppeal",
            json!({ "disputeId": dispute, "roundId": round }),
        )
        .await
    }

    async fn next_round_details(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<NextRoundDetails, LedgerError> {
        self.view(
            "court_getNextRoundDetails",
            json!({ "disputeId": dispute, "roundId": round }),
        )
        .await
    }

    async fn juror(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<JurorDraft, LedgerError> {
        self.view(
            "court_getJuror",
            json!({ "disputeId": dispute, "roundId": round, "juror": juror }),
        )
        .await
    }

    async fn voter_outcome(&self, vote: VoteId, voter: Address) -> Result<Outcome, LedgerError> {
        self.view(
            "court_getVoterOutcome",
            json!({ "voteId": vote, "voter": voter }),
        )
        .await
    }

    async fn max_allowed_outcome(&self, vote: VoteId) -> Result<Outcome, LedgerError> {
        self.view("court_getMaxAllowedOutcome", json!({ "voteId": vote }))
            .await
    }

    async fn is_valid_outcome(&self, vote: VoteId, outcome: Outcome) -> Result<bool, LedgerError> {
        self.view(
            "court_isValidOutcome",
            json!({ "voteId": vote, "outcome": outcome }),
        )
        .await
    }

    async fn storage_at(&self, contract: Address, slot: B256) -> Result<B256, LedgerError> {
        self.view(
            "court_getStorageAt",
            json!({ "contract": contract, "slot": slot }),
        )
        .await
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, LedgerError> {
        self.view("court_tokenDecimals", json!({ "token": token }))
            .await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        self.view(
            "court_allowance",
            json!({ "token": token, "owner": owner, "spender": spender }),
        )
        .await
    }

    async fn subscription_fees(&self, subject: Address) -> Result<SubscriptionFees, LedgerError> {
        self.view("court_getSubscriptionFees", json!({ "subject": subject }))
            .await
    }

    async fn heartbeat(&self, max_transitions: u64) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_heartbeat",
            json!({ "maxTransitions": max_transitions }),
        )
        .await
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_approve",
            json!({ "token": token, "spender": spender, "amount": amount }),
        )
        .await
    }

    async fn stake_for(
        &self,
        juror: Address,
        amount: U256,
        data: Bytes,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_stakeFor",
            json!({ "juror": juror, "amount": amount, "data": data }),
        )
        .await
    }

    async fn unstake(&self, amount: U256, data: Bytes) -> Result<Receipt, LedgerError> {
        self.submit("court_unstake", json!({ "amount": amount, "data": data }))
            .await
    }

    async fn activate(&self, amount: U256) -> Result<Receipt, LedgerError> {
        self.submit("court_activate", json!({ "amount": amount }))
            .await
    }

    async fn deactivate(&self, amount: U256) -> Result<Receipt, LedgerError> {
        self.submit("court_deactivate", json!({ "amount": amount }))
            .await
    }

    async fn pay_fees(&self, subject: Address, periods: u64) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_payFees",
            json!({ "subject": subject, "periods": periods }),
        )
        .await
    }

    async fn create_dispute(
        &self,
        subject: Address,
        possible_rulings: u8,
        metadata: Bytes,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_createDispute",
            json!({
                "subject": subject,
                "possibleRulings": possible_rulings,
                "metadata": metadata,
            }),
        )
        .await
    }

    async fn submit_evidence(
        &self,
        subject: Address,
        dispute: DisputeId,
        evidence: Bytes,
        finished: bool,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_submitEvidence",
            json!({
                "subject": subject,
                "disputeId": dispute,
                "evidence": evidence,
                "finished": finished,
            }),
        )
        .await
    }

    async fn draft(&self, dispute: DisputeId) -> Result<Receipt, LedgerError> {
        self.submit("court_draft", json!({ "disputeId": dispute }))
            .await
    }

    async fn commit(&self, vote: VoteId, commitment: B256) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_commit",
            json!({ "voteId": vote, "commitment": commitment }),
        )
        .await
    }

    async fn reveal(
        &self,
        vote: VoteId,
        voter: Address,
        outcome: Outcome,
        salt: B256,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_reveal",
            json!({ "voteId": vote, "voter": voter, "outcome": outcome, "salt": salt }),
        )
        .await
    }

    async fn create_appeal(
        &self,
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_createAppeal",
            json!({ "disputeId": dispute, "roundId": round, "ruling": ruling }),
        )
        .await
    }

    async fn confirm_appeal(
        &self,
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_confirmAppeal",
            json!({ "disputeId": dispute, "roundId": round, "ruling": ruling }),
        )
        .await
    }

    async fn settle_penalties(
        &self,
        dispute: DisputeId,
        round: RoundId,
        jurors_to_settle: u64,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_settlePenalties",
            json!({
                "disputeId": dispute,
                "roundId": round,
                "jurorsToSettle": jurors_to_settle,
            }),
        )
        .await
    }

    async fn settle_reward(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_settleReward",
            json!({ "disputeId": dispute, "roundId": round, "juror": juror }),
        )
        .await
    }

    async fn settle_appeal_deposit(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Receipt, LedgerError> {
        self.submit(
            "court_settleAppealDeposit",
            json!({ "disputeId": dispute, "roundId": round }),
        )
        .await
    }

    async fn execute_ruling(&self, dispute: DisputeId) -> Result<Receipt, LedgerError> {
        self.submit("court_executeRuling", json!({ "disputeId": dispute }))
            .await
    }
}
