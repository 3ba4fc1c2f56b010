//! # Dispute Orchestrator
//!
//! Drives a dispute through its rounds on the external ledger:
//!
//! ```text
//! draft ─▶ commit ─▶ reveal ─▶ appeal ─▶ confirm_appeal ─▶ (next round) ...
//!                                │
//!                                └──▶ execute ─▶ settle (penalties, rewards, appeal deposits)
//! ```
//!
//! The orchestrator holds no dispute state. Every operation re-reads what
//! it needs from the ledger, because other actors submit to the same
//! ledger and may have moved the dispute forward in between. Settlement is
//! idempotent for the same reason: a step that someone else already
//! settled is skipped or its "already settled" rejection is absorbed.
//!
//! A dispute is terminal once its final ruling is executed and every
//! round's penalties, every coherent juror's reward and every confirmed
//! appeal's deposits are settled.

use std::sync::Arc;

use court_client::{Ledger, LedgerError, LedgerGateway, ReadIndex, RejectionReason};
use court_core::{AdjudicationState, Address, DisputeId, Outcome, Receipt, RoundId, VoteId};
use serde::Serialize;

use crate::error::ArbitrationError;
use crate::heartbeat::TermAdvancer;

/// What a settlement pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub dispute: DisputeId,
    /// Final ruling after the pass; [`Outcome::MISSING`] if never read.
    pub final_ruling: Outcome,
    /// Whether this pass executed the ruling.
    pub ruling_executed: bool,
    /// Rounds whose penalties this pass settled.
    pub penalties_settled: Vec<RoundId>,
    /// Rewards this pass settled, by round and juror.
    pub rewards_settled: Vec<(RoundId, Address)>,
    /// Rounds whose appeal deposits this pass settled.
    pub appeal_deposits_settled: Vec<RoundId>,
    /// Steps skipped because the ledger reported them already settled.
    pub already_settled: Vec<String>,
}

impl SettlementReport {
    fn new(dispute: DisputeId) -> Self {
        Self {
            dispute,
            final_ruling: Outcome::MISSING,
            ruling_executed: false,
            penalties_settled: Vec::new(),
            rewards_settled: Vec::new(),
            appeal_deposits_settled: Vec::new(),
            already_settled: Vec::new(),
        }
    }

    /// Whether the pass submitted nothing that the ledger accepted.
    pub fn is_noop(&self) -> bool {
        !self.ruling_executed
            && self.penalties_settled.is_empty()
            && self.rewards_settled.is_empty()
            && self.appeal_deposits_settled.is_empty()
    }
}

/// Orchestrates dispute lifecycle operations over a ledger and a read index.
pub struct DisputeOrchestrator<L: ?Sized, I: ?Sized> {
    gateway: LedgerGateway<L>,
    index: Arc<I>,
    terms: TermAdvancer<L>,
}

impl<L: ?Sized, I: ?Sized> std::fmt::Debug for DisputeOrchestrator<L, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisputeOrchestrator").finish_non_exhaustive()
    }
}

impl<L: Ledger + ?Sized, I: ReadIndex + ?Sized> DisputeOrchestrator<L, I> {
    pub fn new(gateway: LedgerGateway<L>, index: Arc<I>) -> Self {
        let terms = TermAdvancer::new(gateway.clone());
        Self {
            gateway,
            index,
            terms,
        }
    }

    pub fn gateway(&self) -> &LedgerGateway<L> {
        &self.gateway
    }

    pub fn terms(&self) -> &TermAdvancer<L> {
        &self.terms
    }

    // ── Drafting ───────────────────────────────────────────────────────

    /// Draft jurors for the dispute's last round, bringing the ledger's term
    /// up to date first.
    ///
    /// If the ledger still rejects the draft for a term reason (another
    /// transition became due in between), terms are advanced once more and
    /// the draft retried once. A second term rejection is returned as
    /// [`ArbitrationError::Precondition`].
    pub async fn draft(&self, dispute: DisputeId) -> Result<Vec<Address>, ArbitrationError> {
        self.terms.ensure_current().await?;
        match self.gateway.draft(dispute).await {
            Ok(jurors) => Ok(jurors),
            Err(e) if is_term_rejection(&e) => {
                tracing::warn!(
                    %dispute,
                    error = %e,
                    "draft hit a term precondition, advancing again"
                );
                self.terms.ensure_current().await?;
                self.gateway.draft(dispute).await.map_err(|e| {
                    if is_term_rejection(&e) {
                        ArbitrationError::Precondition {
                            operation: "draft".into(),
                            reason: e.to_string(),
                        }
                    } else {
                        e.into()
                    }
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Voting and appeals ─────────────────────────────────────────────

    pub async fn commit(
        &self,
        dispute: DisputeId,
        outcome: Outcome,
        password: &str,
    ) -> Result<Receipt, ArbitrationError> {
        Ok(self.gateway.commit(dispute, outcome, password).await?)
    }

    pub async fn reveal(
        &self,
        dispute: DisputeId,
        juror: Address,
        outcome: Outcome,
        password: &str,
    ) -> Result<Receipt, ArbitrationError> {
        Ok(self
            .gateway
            .reveal(dispute, juror, outcome, password)
            .await?)
    }

    pub async fn appeal(
        &self,
        dispute: DisputeId,
        outcome: Outcome,
    ) -> Result<Receipt, ArbitrationError> {
        Ok(self.gateway.appeal(dispute, outcome).await?)
    }

    pub async fn confirm_appeal(
        &self,
        dispute: DisputeId,
        outcome: Outcome,
    ) -> Result<Receipt, ArbitrationError> {
        Ok(self.gateway.confirm_appeal(dispute, outcome).await?)
    }

    /// Execute the dispute's final ruling.
    pub async fn execute(&self, dispute: DisputeId) -> Result<Receipt, ArbitrationError> {
        tracing::info!(%dispute, "executing ruling");
        Ok(self.gateway.execute_ruling(dispute).await?)
    }

    // ── Settlement ─────────────────────────────────────────────────────

    /// Whether settlement can start: the ruling is executed, or the last
    /// round ended so it can be.
    pub async fn can_settle(&self, dispute: DisputeId) -> Result<bool, ArbitrationError> {
        let snapshot = self.gateway.dispute(dispute).await?;
        if snapshot.is_ruled() {
            return Ok(true);
        }
        let last = self.gateway.round(dispute, snapshot.last_round_id).await?;
        Ok(last.state == AdjudicationState::Ended)
    }

    /// Settle penalties (all remaining jurors) for every round and appeal
    /// deposits for every round but the last. Steps the ledger reports as
    /// already settled are skipped, so calling this twice is safe.
    pub async fn settle_round(
        &self,
        dispute: DisputeId,
    ) -> Result<SettlementReport, ArbitrationError> {
        let snapshot = self.gateway.dispute(dispute).await?;
        let mut report = SettlementReport::new(dispute);
        report.final_ruling = snapshot.final_ruling;

        for round in snapshot.rounds() {
            tracing::info!(%dispute, %round, "settling penalties");
            match self.gateway.settle_penalties(dispute, round, 0).await {
                Ok(_) => report.penalties_settled.push(round),
                Err(e) => absorb_already_settled(e, &mut report)?,
            }

            if round < snapshot.last_round_id {
                tracing::info!(%dispute, %round, "settling appeal deposits");
                match self.gateway.settle_appeal_deposit(dispute, round).await {
                    Ok(_) => report.appeal_deposits_settled.push(round),
                    Err(e) => absorb_already_settled(e, &mut report)?,
                }
            }
        }
        Ok(report)
    }

    /// Settle `juror`'s reward in every round they were drafted into.
    /// Returns the rounds settled by this call.
    pub async fn settle_juror(
        &self,
        dispute: DisputeId,
        juror: Address,
    ) -> Result<Vec<RoundId>, ArbitrationError> {
        let snapshot = self.gateway.dispute(dispute).await?;
        let mut settled = Vec::new();
        for round in snapshot.rounds() {
            let draft = self.gateway.juror(dispute, round, juror).await?;
            if !draft.is_drafted() {
                continue;
            }
            if draft.rewarded {
                tracing::debug!(%dispute, %round, %juror, "reward already settled");
                continue;
            }
            tracing::info!(%dispute, %round, %juror, "settling juror reward");
            self.gateway.settle_reward(dispute, round, juror).await?;
            settled.push(round);
        }
        Ok(settled)
    }

    /// Settle everything a ruled dispute owes.
    ///
    /// 1. Execute the ruling if it is still missing, then re-read it.
    /// 2. Per round, settle penalties unless the round shows them settled.
    /// 3. Per round, settle the reward of every drafted juror whose revealed
    ///    outcome equals the final ruling and who is not yet rewarded.
    /// 4. Per round with a confirmed appeal, settle the appeal deposits;
    ///    an "appeal already settled" rejection is absorbed.
    ///
    /// Any other failure stops the pass and is returned.
    pub async fn settle(&self, dispute: DisputeId) -> Result<SettlementReport, ArbitrationError> {
        let mut report = SettlementReport::new(dispute);
        let initial = self.gateway.dispute(dispute).await?;

        if !initial.is_ruled() {
            self.execute(dispute).await?;
            report.ruling_executed = true;
        }
        let current = self.gateway.dispute(dispute).await?;
        let final_ruling = current.final_ruling;
        report.final_ruling = final_ruling;
        tracing::info!(
            %dispute,
            %final_ruling,
            rounds = current.last_round_id.get() + 1,
            "settling dispute"
        );

        for round in current.rounds() {
            let snapshot = self.gateway.round(dispute, round).await?;
            if !snapshot.settled_penalties {
                tracing::info!(
                    %dispute,
                    %round,
                    jurors = snapshot.jurors_number,
                    "settling penalties"
                );
                self.gateway
                    .settle_penalties(dispute, round, snapshot.jurors_number)
                    .await?;
                report.penalties_settled.push(round);
            }

            let vote = VoteId::new(dispute, round);
            for juror in self.index.drafted_jurors(dispute, round).await? {
                let voted = self.gateway.voter_outcome(vote, juror).await?;
                if voted != final_ruling {
                    continue;
                }
                if self.gateway.juror(dispute, round, juror).await?.rewarded {
                    tracing::debug!(%dispute, %round, %juror, "reward already settled");
                    continue;
                }
                tracing::info!(%dispute, %round, %juror, "settling juror reward");
                self.gateway.settle_reward(dispute, round, juror).await?;
                report.rewards_settled.push((round, juror));
            }

            if self.gateway.appeal_of(dispute, round).await?.is_confirmed() {
                tracing::info!(%dispute, %round, "settling appeal deposits");
                match self.gateway.settle_appeal_deposit(dispute, round).await {
                    Ok(_) => report.appeal_deposits_settled.push(round),
                    Err(e) if e.rejection() == Some(&RejectionReason::AppealAlreadySettled) => {
                        tracing::info!(%dispute, %round, "appeal deposits were already settled");
                        report.already_settled.push(e.to_string());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        tracing::info!(
            %dispute,
            penalties = report.penalties_settled.len(),
            rewards = report.rewards_settled.len(),
            appeals = report.appeal_deposits_settled.len(),
            "dispute settled"
        );
        Ok(report)
    }
}

fn is_term_rejection(error: &LedgerError) -> bool {
    error
        .rejection()
        .is_some_and(RejectionReason::is_term_precondition)
}

/// Record a benign "already settled" rejection, or hand the error back.
fn absorb_already_settled(
    error: LedgerError,
    report: &mut SettlementReport,
) -> Result<(), ArbitrationError> {
    if error
        .rejection()
        .is_some_and(RejectionReason::is_already_settled)
    {
        tracing::info!(error = %error, "already settled, skipping");
        report.already_settled.push(error.to_string());
        Ok(())
    } else {
        Err(error.into())
    }
}
