//! # Ledger Gateway
//!
//! Typed operations over any [`Ledger`], adding the rules the raw
//! capability bundle leaves to its caller:
//!
//! - **Term advancement** submits nothing when no transition is owed.
//! - **Allowance negotiation.** Tokens refuse to move a nonzero allowance
//!   to another nonzero value, so [`LedgerGateway::approve`] resets to zero
//!   first when needed. Deposit-bearing actions (staking, appeals,
//!   subscriptions) approve exactly the amount they spend.
//! - **Amount scaling.** Juror stake amounts arrive as human-scale decimal
//!   strings and are scaled by the jurors token's declared decimals.
//! - **Event extraction.** Dispute ids and drafted jurors are read from the
//!   receipt's decoded logs.
//!
//! Every method reads fresh state; nothing is cached between calls.

use std::sync::Arc;

use court_core::{
    keccak256, to_base_units, vote, Address, Appeal, Bytes, CourtModule, Dispute, DisputeId,
    JurorDraft, Outcome, Receipt, Round, RoundId, TermId, VoteId, B256, U256,
};

use crate::error::LedgerError;
use crate::ledger::Ledger;

/// Stake data that makes the registry activate the stake in the same
/// request: the selector of `activate(uint256)`.
pub fn activate_data() -> Bytes {
    Bytes::copy_from_slice(&keccak256(b"activate(uint256)")[..4])
}

/// Evidence submitted with `finished = true` to close an evidence period.
const CLOSING_EVIDENCE: &[u8] = b"closing evidence submission period";

/// Typed court operations over a [`Ledger`].
pub struct LedgerGateway<L: ?Sized> {
    ledger: Arc<L>,
}

impl<L: ?Sized> Clone for LedgerGateway<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for LedgerGateway<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerGateway").finish_non_exhaustive()
    }
}

impl<L: Ledger + ?Sized> LedgerGateway<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    // ── Terms ──────────────────────────────────────────────────────────

    pub async fn current_term(&self) -> Result<TermId, LedgerError> {
        self.ledger.current_term().await
    }

    pub async fn needed_transitions(&self) -> Result<u64, LedgerError> {
        self.ledger.needed_transitions().await
    }

    /// Advance up to `max` owed term transitions.
    ///
    /// Returns 0 without submitting when nothing is owed or `max` is 0.
    /// Otherwise submits a single heartbeat for `min(max, needed)`
    /// transitions and returns the number the receipt reports, or the
    /// requested number when the ledger reports none.
    pub async fn advance_terms(&self, max: u64) -> Result<u64, LedgerError> {
        let needed = self.ledger.needed_transitions().await?;
        if needed == 0 {
            tracing::debug!("ledger is current, no heartbeat needed");
            return Ok(0);
        }
        if max == 0 {
            tracing::debug!(needed, "zero transition cap, no heartbeat submitted");
            return Ok(0);
        }
        let requested = max.min(needed);
        let receipt = self.ledger.heartbeat(requested).await?;
        let advanced = receipt.heartbeat_transitions().unwrap_or(requested);
        tracing::info!(
            needed,
            requested,
            transitions = advanced,
            tx = %receipt.transaction_hash,
            "advanced court terms"
        );
        Ok(advanced)
    }

    // ── Allowances ─────────────────────────────────────────────────────

    /// Set `spender`'s allowance on `token` to `amount`, resetting a nonzero
    /// existing allowance to zero first. Returns the receipts in submission
    /// order: two when a reset was needed, one otherwise.
    pub async fn approve(
        &self,
        token: Address,
        amount: U256,
        spender: Address,
    ) -> Result<Vec<Receipt>, LedgerError> {
        let owner = self.ledger.sender().await?;
        let current = self.ledger.allowance(token, owner, spender).await?;
        let mut receipts = Vec::with_capacity(2);
        if !current.is_zero() {
            tracing::debug!(%token, %spender, %current, "resetting existing allowance");
            receipts.push(self.ledger.approve(token, spender, U256::ZERO).await?);
        }
        receipts.push(self.ledger.approve(token, spender, amount).await?);
        tracing::info!(%token, %spender, %amount, "approved allowance");
        Ok(receipts)
    }

    // ── Juror stake ────────────────────────────────────────────────────

    async fn jurors_token_amount(&self, amount: &str) -> Result<(Address, U256), LedgerError> {
        let token = self.ledger.module(CourtModule::JurorsToken).await?;
        let decimals = self.ledger.token_decimals(token).await?;
        Ok((token, to_base_units(amount, decimals)?))
    }

    /// Stake `amount` jurors tokens for `juror`, approving the registry first.
    pub async fn stake(
        &self,
        juror: Address,
        amount: &str,
        data: Bytes,
    ) -> Result<Receipt, LedgerError> {
        let (token, scaled) = self.jurors_token_amount(amount).await?;
        let registry = self.ledger.module(CourtModule::JurorsRegistry).await?;
        self.approve(token, scaled, registry).await?;
        let receipt = self.ledger.stake_for(juror, scaled, data).await?;
        tracing::info!(%juror, amount, base_units = %scaled, "staked jurors tokens");
        Ok(receipt)
    }

    /// Withdraw `amount` of the sender's available stake.
    pub async fn unstake(&self, amount: &str, data: Bytes) -> Result<Receipt, LedgerError> {
        let (_, scaled) = self.jurors_token_amount(amount).await?;
        let receipt = self.ledger.unstake(scaled, data).await?;
        tracing::info!(amount, base_units = %scaled, "unstaked jurors tokens");
        Ok(receipt)
    }

    /// Activate `amount` of the sender's existing stake.
    pub async fn activate(&self, amount: &str) -> Result<Receipt, LedgerError> {
        let (_, scaled) = self.jurors_token_amount(amount).await?;
        let receipt = self.ledger.activate(scaled).await?;
        tracing::info!(amount, base_units = %scaled, "activated stake");
        Ok(receipt)
    }

    /// Stake and activate `amount` for `juror` in one request.
    pub async fn activate_for(&self, juror: Address, amount: &str) -> Result<Receipt, LedgerError> {
        self.stake(juror, amount, activate_data()).await
    }

    /// Request deactivation of `amount` of the sender's active stake.
    pub async fn deactivate(&self, amount: &str) -> Result<Receipt, LedgerError> {
        let (_, scaled) = self.jurors_token_amount(amount).await?;
        let receipt = self.ledger.deactivate(scaled).await?;
        tracing::info!(amount, base_units = %scaled, "requested stake deactivation");
        Ok(receipt)
    }

    // ── Subscriptions ──────────────────────────────────────────────────

    /// Pay `periods` periods of subscription fees for `subject`.
    pub async fn subscribe(&self, subject: Address, periods: u64) -> Result<Receipt, LedgerError> {
        let fees = self.ledger.subscription_fees(subject).await?;
        self.approve(fees.fee_token, fees.fee_amount, fees.recipient)
            .await?;
        let receipt = self.ledger.pay_fees(subject, periods).await?;
        tracing::info!(%subject, periods, fee = %fees.fee_amount, "paid subscription fees");
        Ok(receipt)
    }

    // ── Disputes ───────────────────────────────────────────────────────

    /// Create a dispute and submit its evidence in order.
    ///
    /// Fails with [`LedgerError::MissingEvent`] if the creation receipt has
    /// no `NewDispute` log; no evidence is submitted in that case.
    pub async fn submit_dispute(
        &self,
        subject: Address,
        rulings: u8,
        metadata: Bytes,
        evidence: &[Bytes],
    ) -> Result<DisputeId, LedgerError> {
        let receipt = self
            .ledger
            .create_dispute(subject, rulings, metadata)
            .await?;
        let dispute = receipt
            .new_dispute_id()
            .ok_or_else(|| LedgerError::MissingEvent {
                operation: "create_dispute".into(),
                event: "NewDispute",
            })?;
        tracing::info!(%dispute, %subject, rulings, "created dispute");

        for (index, item) in evidence.iter().enumerate() {
            self.ledger
                .submit_evidence(subject, dispute, item.clone(), false)
                .await?;
            tracing::debug!(%dispute, index, "submitted evidence");
        }
        Ok(dispute)
    }

    /// Draft jurors for the dispute's last round.
    ///
    /// Closes the subject's evidence period first when the round's draft
    /// term is still ahead. Returns the drafted jurors in event order;
    /// a juror drawn more than once appears more than once.
    pub async fn draft(&self, dispute: DisputeId) -> Result<Vec<Address>, LedgerError> {
        let snapshot = self.ledger.dispute(dispute).await?;
        let round = self.ledger.round(dispute, snapshot.last_round_id).await?;
        let term = self.ledger.current_term().await?;
        if round.draft_term > term {
            tracing::info!(
                %dispute,
                draft_term = %round.draft_term,
                current_term = %term,
                "closing evidence period before drafting"
            );
            self.ledger
                .submit_evidence(
                    snapshot.subject,
                    dispute,
                    Bytes::from_static(CLOSING_EVIDENCE),
                    true,
                )
                .await?;
        }
        let receipt = self.ledger.draft(dispute).await?;
        let jurors = receipt.drafted_jurors();
        tracing::info!(
            %dispute,
            round = %snapshot.last_round_id,
            drafted = jurors.len(),
            "drafted jurors"
        );
        Ok(jurors)
    }

    // ── Voting ─────────────────────────────────────────────────────────

    /// Commit `outcome` sealed with the salt derived from `password` for the
    /// dispute's last round.
    pub async fn commit(
        &self,
        dispute: DisputeId,
        outcome: Outcome,
        password: &str,
    ) -> Result<Receipt, LedgerError> {
        let round = self.ledger.dispute(dispute).await?.last_round_id;
        let vote = VoteId::new(dispute, round);
        let commitment = vote::seal(outcome, vote::salt(password));
        let receipt = self.ledger.commit(vote, commitment).await?;
        tracing::info!(%dispute, %round, %vote, "committed vote");
        Ok(receipt)
    }

    /// Reveal `juror`'s vote for the dispute's last round.
    pub async fn reveal(
        &self,
        dispute: DisputeId,
        juror: Address,
        outcome: Outcome,
        password: &str,
    ) -> Result<Receipt, LedgerError> {
        let round = self.ledger.dispute(dispute).await?.last_round_id;
        self.reveal_with_salt(
            VoteId::new(dispute, round),
            juror,
            outcome,
            vote::salt(password),
        )
        .await
    }

    /// Reveal a vote with an explicit salt. No client-side validation: a
    /// wrong salt surfaces as the ledger's rejection.
    pub async fn reveal_with_salt(
        &self,
        vote: VoteId,
        juror: Address,
        outcome: Outcome,
        salt: B256,
    ) -> Result<Receipt, LedgerError> {
        let receipt = self.ledger.reveal(vote, juror, outcome, salt).await?;
        tracing::info!(%vote, %juror, %outcome, "revealed vote");
        Ok(receipt)
    }

    // ── Appeals ────────────────────────────────────────────────────────

    /// Appeal the dispute's last round in favour of `outcome`, approving
    /// the dispute manager for exactly the appeal deposit.
    pub async fn appeal(&self, dispute: DisputeId, outcome: Outcome) -> Result<Receipt, LedgerError> {
        let round = self.ledger.dispute(dispute).await?.last_round_id;
        let next = self.ledger.next_round_details(dispute, round).await?;
        let manager = self.ledger.module(CourtModule::DisputeManager).await?;
        self.approve(next.fee_token, next.appeal_deposit, manager)
            .await?;
        let receipt = self.ledger.create_appeal(dispute, round, outcome).await?;
        tracing::info!(%dispute, %round, %outcome, deposit = %next.appeal_deposit, "appealed round");
        Ok(receipt)
    }

    /// Confirm the appeal of the dispute's last round in favour of
    /// `outcome`, approving exactly the confirm-appeal deposit.
    pub async fn confirm_appeal(
        &self,
        dispute: DisputeId,
        outcome: Outcome,
    ) -> Result<Receipt, LedgerError> {
        let round = self.ledger.dispute(dispute).await?.last_round_id;
        let next = self.ledger.next_round_details(dispute, round).await?;
        let manager = self.ledger.module(CourtModule::DisputeManager).await?;
        self.approve(next.fee_token, next.confirm_appeal_deposit, manager)
            .await?;
        let receipt = self.ledger.confirm_appeal(dispute, round, outcome).await?;
        tracing::info!(
            %dispute,
            %round,
            %outcome,
            deposit = %next.confirm_appeal_deposit,
            "confirmed appeal"
        );
        Ok(receipt)
    }

    // ── Settlement ─────────────────────────────────────────────────────

    pub async fn settle_penalties(
        &self,
        dispute: DisputeId,
        round: RoundId,
        jurors_to_settle: u64,
    ) -> Result<Receipt, LedgerError> {
        self.ledger
            .settle_penalties(dispute, round, jurors_to_settle)
            .await
    }

    pub async fn settle_reward(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<Receipt, LedgerError> {
        self.ledger.settle_reward(dispute, round, juror).await
    }

    pub async fn settle_appeal_deposit(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Receipt, LedgerError> {
        self.ledger.settle_appeal_deposit(dispute, round).await
    }

    pub async fn execute_ruling(&self, dispute: DisputeId) -> Result<Receipt, LedgerError> {
        self.ledger.execute_ruling(dispute).await
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub async fn dispute(&self, dispute: DisputeId) -> Result<Dispute, LedgerError> {
        self.ledger.dispute(dispute).await
    }

    pub async fn round(&self, dispute: DisputeId, round: RoundId) -> Result<Round, LedgerError> {
        self.ledger.round(dispute, round).await
    }

    pub async fn appeal_of(&self, dispute: DisputeId, round: RoundId) -> Result<Appeal, LedgerError> {
        self.ledger.appeal(dispute, round).await
    }

    pub async fn juror(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<JurorDraft, LedgerError> {
        self.ledger.juror(dispute, round, juror).await
    }

    pub async fn voter_outcome(&self, vote: VoteId, voter: Address) -> Result<Outcome, LedgerError> {
        self.ledger.voter_outcome(vote, voter).await
    }

    /// Whether the vote exists (it accepts at least one outcome).
    pub async fn vote_exists(&self, vote: VoteId) -> Result<bool, LedgerError> {
        Ok(!self.ledger.max_allowed_outcome(vote).await?.is_missing())
    }

    /// Whether the vote exists and accepts `outcome`.
    pub async fn is_valid_outcome(&self, vote: VoteId, outcome: Outcome) -> Result<bool, LedgerError> {
        if !self.vote_exists(vote).await? {
            return Ok(false);
        }
        self.ledger.is_valid_outcome(vote, outcome).await
    }

    /// The sealed commitment `voter` stored for `vote`, read from the voting
    /// contract's storage. Zero when nothing was committed.
    pub async fn commitment(&self, vote: VoteId, voter: Address) -> Result<B256, LedgerError> {
        let voting = self.ledger.module(CourtModule::Voting).await?;
        self.ledger
            .storage_at(voting, vote::commitment_slot(vote, voter))
            .await
    }
}
