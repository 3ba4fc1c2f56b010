//! # Ledger Capability Trait
//!
//! The boundary between this stack and the external ledger. A [`Ledger`]
//! bundles four capabilities:
//!
//! - **resolve-account**: the account submissions are sent from;
//! - **resolve-contract**: addresses of the court modules and tokens;
//! - **read-state**: view calls against current ledger state;
//! - **submit-transaction**: one method per mutating request, each
//!   returning the [`Receipt`] of the accepted transaction.
//!
//! [`RpcLedger`](crate::rpc::RpcLedger) implements it for live networks;
//! `court_stub::MemoryLedger` implements it in process for tests.
//! Higher-level rules (allowance resets, amount scaling, event extraction)
//! live in [`LedgerGateway`](crate::gateway::LedgerGateway), not here.
//!
//! Implementations must not retry submissions. Whether a failed submission
//! should be attempted again is a decision for the caller, made after
//! re-reading state.

use async_trait::async_trait;
use court_core::{
    Address, Appeal, Bytes, CourtModule, Dispute, DisputeId, JurorDraft, NextRoundDetails, Outcome,
    Receipt, Round, RoundId, SubscriptionFees, TermId, VoteId, B256, U256,
};

use crate::error::LedgerError;

/// Capability bundle for the external court ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    // ── Account and contract resolution ────────────────────────────────

    /// The account submissions are sent from.
    async fn sender(&self) -> Result<Address, LedgerError>;

    /// Address of a court module or token.
    async fn module(&self, module: CourtModule) -> Result<Address, LedgerError>;

    // ── Reads ──────────────────────────────────────────────────────────

    /// The ledger's current term.
    async fn current_term(&self) -> Result<TermId, LedgerError>;

    /// Term transitions owed before the ledger is current.
    async fn needed_transitions(&self) -> Result<u64, LedgerError>;

    /// A dispute snapshot.
    async fn dispute(&self, dispute: DisputeId) -> Result<Dispute, LedgerError>;

    /// A round snapshot.
    async fn round(&self, dispute: DisputeId, round: RoundId) -> Result<Round, LedgerError>;

    /// The appeal attached to a round (zero addresses when none).
    async fn appeal(&self, dispute: DisputeId, round: RoundId) -> Result<Appeal, LedgerError>;

    /// Cost and shape of the round an appeal of `round` would create.
    async fn next_round_details(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<NextRoundDetails, LedgerError>;

    /// A juror's draft weight and reward status in a round.
    async fn juror(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<JurorDraft, LedgerError>;

    /// The outcome a voter revealed ([`Outcome::MISSING`] if none).
    async fn voter_outcome(&self, vote: VoteId, voter: Address) -> Result<Outcome, LedgerError>;

    /// Highest outcome the vote accepts; [`Outcome::MISSING`] if the vote
    /// does not exist.
    async fn max_allowed_outcome(&self, vote: VoteId) -> Result<Outcome, LedgerError>;

    /// Whether the vote accepts `outcome`.
    async fn is_valid_outcome(&self, vote: VoteId, outcome: Outcome) -> Result<bool, LedgerError>;

    /// Raw contract storage word.
    async fn storage_at(&self, contract: Address, slot: B256) -> Result<B256, LedgerError>;

    /// A token's declared decimal precision.
    async fn token_decimals(&self, token: Address) -> Result<u8, LedgerError>;

    /// Allowance `owner` granted `spender` on `token`.
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError>;

    /// Subscription fee quote for an arbitrable subject.
    async fn subscription_fees(&self, subject: Address) -> Result<SubscriptionFees, LedgerError>;

    // ── Submissions ────────────────────────────────────────────────────

    /// Process up to `max_transitions` pending term transitions.
    async fn heartbeat(&self, max_transitions: u64) -> Result<Receipt, LedgerError>;

    /// Set `spender`'s allowance on `token` to `amount`.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Receipt, LedgerError>;

    /// Stake `amount` jurors tokens on behalf of `juror`.
    async fn stake_for(
        &self,
        juror: Address,
        amount: U256,
        data: Bytes,
    ) -> Result<Receipt, LedgerError>;

    /// Withdraw `amount` of the sender's available stake.
    async fn unstake(&self, amount: U256, data: Bytes) -> Result<Receipt, LedgerError>;

    /// Activate `amount` of the sender's stake for drafting.
    async fn activate(&self, amount: U256) -> Result<Receipt, LedgerError>;

    /// Request deactivation of `amount` of the sender's active stake.
    async fn deactivate(&self, amount: U256) -> Result<Receipt, LedgerError>;

    /// Pay subscription fees for `subject` for `periods` periods.
    async fn pay_fees(&self, subject: Address, periods: u64) -> Result<Receipt, LedgerError>;

    /// Create a dispute through the arbitrable `subject`.
    async fn create_dispute(
        &self,
        subject: Address,
        possible_rulings: u8,
        metadata: Bytes,
    ) -> Result<Receipt, LedgerError>;

    /// Submit evidence through the arbitrable `subject`; `finished` closes
    /// the subject's evidence period.
    async fn submit_evidence(
        &self,
        subject: Address,
        dispute: DisputeId,
        evidence: Bytes,
        finished: bool,
    ) -> Result<Receipt, LedgerError>;

    /// Draft jurors for the dispute's current round.
    async fn draft(&self, dispute: DisputeId) -> Result<Receipt, LedgerError>;

    /// Commit a sealed vote.
    async fn commit(&self, vote: VoteId, commitment: B256) -> Result<Receipt, LedgerError>;

    /// Reveal a vote on behalf of `voter`.
    async fn reveal(
        &self,
        vote: VoteId,
        voter: Address,
        outcome: Outcome,
        salt: B256,
    ) -> Result<Receipt, LedgerError>;

    /// Appeal a round in favour of `ruling`.
    async fn create_appeal(
        &self,
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    ) -> Result<Receipt, LedgerError>;

    /// Confirm a round's appeal in favour of `ruling`.
    async fn confirm_appeal(
        &self,
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    ) -> Result<Receipt, LedgerError>;

    /// Settle penalties for up to `jurors_to_settle` jurors (0 = all).
    async fn settle_penalties(
        &self,
        dispute: DisputeId,
        round: RoundId,
        jurors_to_settle: u64,
    ) -> Result<Receipt, LedgerError>;

    /// Settle a juror's reward for a round.
    async fn settle_reward(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<Receipt, LedgerError>;

    /// Settle a round's appeal deposits.
    async fn settle_appeal_deposit(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Receipt, LedgerError>;

    /// Execute the dispute's final ruling.
    async fn execute_ruling(&self, dispute: DisputeId) -> Result<Receipt, LedgerError>;
}
