//! In-memory [`Ledger`].
//!
//! Keeps just enough state to answer every read and enforces the
//! rejections callers must cope with:
//!
//! - settling penalties, a reward or an appeal deposit twice;
//! - revealing with the wrong salt, committing or revealing twice;
//! - drafting while terms are outdated or before the draft term;
//! - executing a ruling that was already executed;
//! - approving a nonzero allowance over a nonzero allowance.
//!
//! Every submission attempt is recorded as a [`LedgerCall`], accepted or
//! not. Failures can be scripted per operation with
//! [`MemoryLedger::fail_next`].

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use court_client::{activate_data, Ledger, LedgerError, RejectionReason};
use court_core::{
    vote, AdjudicationState, Address, Appeal, Bytes, CourtModule, Dispute, DisputeId,
    DisputeState, JurorDraft, LedgerEvent, NextRoundDetails, Outcome, Receipt, Round, RoundId,
    SubscriptionFees, TermId, VoteId, B256, U256,
};
use parking_lot::Mutex;

/// Juror seats in a round created by [`Ledger::create_dispute`].
const DEFAULT_JURORS_NUMBER: u64 = 3;

/// A submission sent to a [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Heartbeat {
        max_transitions: u64,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    StakeFor {
        juror: Address,
        amount: U256,
        data: Bytes,
    },
    Unstake {
        amount: U256,
        data: Bytes,
    },
    Activate {
        amount: U256,
    },
    Deactivate {
        amount: U256,
    },
    PayFees {
        subject: Address,
        periods: u64,
    },
    CreateDispute {
        subject: Address,
        possible_rulings: u8,
        metadata: Bytes,
    },
    SubmitEvidence {
        subject: Address,
        dispute: DisputeId,
        evidence: Bytes,
        finished: bool,
    },
    Draft {
        dispute: DisputeId,
    },
    Commit {
        vote: VoteId,
        commitment: B256,
    },
    Reveal {
        vote: VoteId,
        voter: Address,
        outcome: Outcome,
        salt: B256,
    },
    CreateAppeal {
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    },
    ConfirmAppeal {
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    },
    SettlePenalties {
        dispute: DisputeId,
        round: RoundId,
        jurors_to_settle: u64,
    },
    SettleReward {
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    },
    SettleAppealDeposit {
        dispute: DisputeId,
        round: RoundId,
    },
    ExecuteRuling {
        dispute: DisputeId,
    },
}

impl LedgerCall {
    /// Operation name, matching the [`Ledger`] method that sent it.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Heartbeat { .. } => "heartbeat",
            Self::Approve { .. } => "approve",
            Self::StakeFor { .. } => "stake_for",
            Self::Unstake { .. } => "unstake",
            Self::Activate { .. } => "activate",
            Self::Deactivate { .. } => "deactivate",
            Self::PayFees { .. } => "pay_fees",
            Self::CreateDispute { .. } => "create_dispute",
            Self::SubmitEvidence { .. } => "submit_evidence",
            Self::Draft { .. } => "draft",
            Self::Commit { .. } => "commit",
            Self::Reveal { .. } => "reveal",
            Self::CreateAppeal { .. } => "create_appeal",
            Self::ConfirmAppeal { .. } => "confirm_appeal",
            Self::SettlePenalties { .. } => "settle_penalties",
            Self::SettleReward { .. } => "settle_reward",
            Self::SettleAppealDeposit { .. } => "settle_appeal_deposit",
            Self::ExecuteRuling { .. } => "execute_ruling",
        }
    }
}

pub(crate) type RoundKey = (DisputeId, RoundId);

#[derive(Debug, Default)]
struct State {
    sender: Address,
    modules: HashMap<CourtModule, Address>,
    term: TermId,
    needed: u64,
    next_dispute_id: u64,
    emit_new_dispute: bool,
    tx_counter: u64,

    disputes: BTreeMap<DisputeId, Dispute>,
    rounds: HashMap<RoundKey, Round>,
    appeals: HashMap<RoundKey, Appeal>,
    settled_appeals: HashSet<RoundKey>,
    next_rounds: HashMap<RoundKey, NextRoundDetails>,
    jurors: HashMap<(DisputeId, RoundId, Address), JurorDraft>,
    draft_pools: HashMap<DisputeId, Vec<Address>>,
    rulings_on_execute: HashMap<DisputeId, Outcome>,

    commitments: HashMap<(VoteId, Address), B256>,
    outcomes: HashMap<(VoteId, Address), Outcome>,

    allowances: HashMap<(Address, Address, Address), U256>,
    decimals: HashMap<Address, u8>,
    stakes: HashMap<Address, U256>,
    active: HashMap<Address, U256>,
    subscription_fees: HashMap<Address, SubscriptionFees>,
    storage: HashMap<(Address, B256), B256>,

    failures: HashMap<&'static str, VecDeque<LedgerError>>,
    calls: Vec<LedgerCall>,
}

impl State {
    fn take_failure(&mut self, operation: &'static str) -> Result<(), LedgerError> {
        match self.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn receipt(&mut self, logs: Vec<LedgerEvent>) -> Receipt {
        self.tx_counter += 1;
        Receipt {
            transaction_hash: B256::from(U256::from(self.tx_counter).to_be_bytes::<32>()),
            logs,
        }
    }

    fn address_of(&self, module: CourtModule) -> Address {
        self.modules.get(&module).copied().unwrap_or_default()
    }

    fn dispute(&self, operation: &str, id: DisputeId) -> Result<&Dispute, LedgerError> {
        self.disputes.get(&id).ok_or_else(|| {
            LedgerError::rejected(
                operation,
                RejectionReason::Other("DM_DISPUTE_DOES_NOT_EXIST".into()),
            )
        })
    }

    fn round_mut(&mut self, operation: &str, key: RoundKey) -> Result<&mut Round, LedgerError> {
        self.rounds.get_mut(&key).ok_or_else(|| {
            LedgerError::rejected(
                operation,
                RejectionReason::Other("DM_ROUND_DOES_NOT_EXIST".into()),
            )
        })
    }

    /// Spend `amount` of the sender's allowance to `spender` on `token`.
    fn spend_allowance(
        &mut self,
        operation: &str,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let key = (token, self.sender, spender);
        let granted = self.allowances.get(&key).copied().unwrap_or_default();
        if granted < amount {
            return Err(LedgerError::rejected(
                operation,
                RejectionReason::InsufficientAllowance,
            ));
        }
        self.allowances.insert(key, granted - amount);
        Ok(())
    }

    /// Split a vote id into its dispute and round, if it names a round.
    fn vote_round(&self, vote: VoteId) -> Option<RoundKey> {
        let limbs = vote.as_u256().into_limbs();
        if limbs[1] != 0 || limbs[3] != 0 {
            return None;
        }
        let key = (DisputeId(limbs[2]), RoundId(limbs[0]));
        self.rounds.contains_key(&key).then_some(key)
    }

    fn max_allowed_outcome(&self, vote: VoteId) -> Outcome {
        self.vote_round(vote)
            .and_then(|(dispute, _)| self.disputes.get(&dispute))
            .map(|d| Outcome(Outcome::REFUSED.0.saturating_add(d.possible_rulings)))
            .unwrap_or(Outcome::MISSING)
    }
}

/// In-process court ledger.
#[derive(Debug)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    /// An empty ledger at term 0 with nothing owed, sending from `sender`.
    /// Module addresses are fixed, distinct placeholder accounts.
    pub fn new(sender: Address) -> Self {
        let modules = [
            (CourtModule::DisputeManager, 0xd1),
            (CourtModule::Voting, 0xd2),
            (CourtModule::JurorsRegistry, 0xd3),
            (CourtModule::Subscriptions, 0xd4),
            (CourtModule::JurorsToken, 0xd5),
            (CourtModule::FeeToken, 0xd6),
        ]
        .into_iter()
        .map(|(module, byte)| (module, Address::repeat_byte(byte)))
        .collect();

        Self {
            state: Mutex::new(State {
                sender,
                modules,
                emit_new_dispute: true,
                ..State::default()
            }),
        }
    }

    // -- Seeding --------------------------------------------------------------

    /// Set the current term and the transitions still owed.
    pub fn set_term(&self, current: TermId, needed: u64) {
        let mut state = self.state.lock();
        state.term = current;
        state.needed = needed;
    }

    pub fn insert_dispute(&self, id: DisputeId, dispute: Dispute) {
        let mut state = self.state.lock();
        state.next_dispute_id = state.next_dispute_id.max(id.0 + 1);
        state.disputes.insert(id, dispute);
    }

    pub fn insert_round(&self, dispute: DisputeId, round: RoundId, snapshot: Round) {
        self.state.lock().rounds.insert((dispute, round), snapshot);
    }

    pub fn insert_appeal(&self, dispute: DisputeId, round: RoundId, appeal: Appeal) {
        self.state.lock().appeals.insert((dispute, round), appeal);
    }

    pub fn insert_next_round(&self, dispute: DisputeId, round: RoundId, details: NextRoundDetails) {
        self.state
            .lock()
            .next_rounds
            .insert((dispute, round), details);
    }

    /// Seat `juror` in a round with the given draft weight.
    pub fn set_juror_weight(&self, dispute: DisputeId, round: RoundId, juror: Address, weight: u64) {
        self.state
            .lock()
            .jurors
            .entry((dispute, round, juror))
            .or_default()
            .weight = weight;
    }

    /// Record a revealed outcome directly.
    pub fn set_voter_outcome(&self, vote: VoteId, voter: Address, outcome: Outcome) {
        self.state.lock().outcomes.insert((vote, voter), outcome);
    }

    /// Draws the next draft of `dispute` produces, in order. Repeats are
    /// drafted with extra weight.
    pub fn set_draft_pool(&self, dispute: DisputeId, jurors: Vec<Address>) {
        self.state.lock().draft_pools.insert(dispute, jurors);
    }

    /// The final ruling [`Ledger::execute_ruling`] records for `dispute`.
    /// Defaults to [`Outcome::REFUSED`].
    pub fn set_ruling_on_execute(&self, dispute: DisputeId, ruling: Outcome) {
        self.state.lock().rulings_on_execute.insert(dispute, ruling);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.state.lock().decimals.insert(token, decimals);
    }

    pub fn set_subscription_fees(&self, subject: Address, fees: SubscriptionFees) {
        self.state.lock().subscription_fees.insert(subject, fees);
    }

    pub fn set_storage(&self, contract: Address, slot: B256, value: B256) {
        self.state.lock().storage.insert((contract, slot), value);
    }

    /// Accept `create_dispute` without emitting `NewDispute`.
    pub fn suppress_new_dispute_events(&self) {
        self.state.lock().emit_new_dispute = false;
    }

    /// Fail the next call of `operation` (a [`Ledger`] method name) with
    /// `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, operation: &'static str, error: LedgerError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    // -- Inspection -----------------------------------------------------------

    /// Every submission attempt, accepted or rejected, in order.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().calls.clone()
    }

    /// Number of submission attempts of `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn module_address(&self, module: CourtModule) -> Address {
        self.state.lock().address_of(module)
    }

    pub fn dispute_snapshot(&self, id: DisputeId) -> Option<Dispute> {
        self.state.lock().disputes.get(&id).cloned()
    }

    pub fn round_snapshot(&self, dispute: DisputeId, round: RoundId) -> Option<Round> {
        self.state.lock().rounds.get(&(dispute, round)).cloned()
    }

    pub fn juror_snapshot(&self, dispute: DisputeId, round: RoundId, juror: Address) -> JurorDraft {
        self.state
            .lock()
            .jurors
            .get(&(dispute, round, juror))
            .copied()
            .unwrap_or_default()
    }

    pub fn appeal_deposit_settled(&self, dispute: DisputeId, round: RoundId) -> bool {
        self.state
            .lock()
            .settled_appeals
            .contains(&(dispute, round))
    }

    pub fn stake_of(&self, juror: Address) -> U256 {
        self.state.lock().stakes.get(&juror).copied().unwrap_or_default()
    }

    pub fn active_of(&self, juror: Address) -> U256 {
        self.state.lock().active.get(&juror).copied().unwrap_or_default()
    }

    pub fn commitment_of(&self, vote: VoteId, voter: Address) -> Option<B256> {
        self.state.lock().commitments.get(&(vote, voter)).copied()
    }

    /// Record a submission, apply any scripted failure, then run `apply`.
    fn submit(
        &self,
        call: LedgerCall,
        apply: impl FnOnce(&mut State) -> Result<Vec<LedgerEvent>, LedgerError>,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.state.lock();
        let operation = call.operation();
        state.calls.push(call);
        state.take_failure(operation)?;
        let logs = apply(&mut state)?;
        Ok(state.receipt(logs))
    }

    fn read<T>(
        &self,
        operation: &'static str,
        read: impl FnOnce(&State) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut state = self.state.lock();
        state.take_failure(operation)?;
        read(&state)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn sender(&self) -> Result<Address, LedgerError> {
        self.read("sender", |s| Ok(s.sender))
    }

    async fn module(&self, module: CourtModule) -> Result<Address, LedgerError> {
        self.read("module", |s| Ok(s.address_of(module)))
    }

    async fn current_term(&self) -> Result<TermId, LedgerError> {
        self.read("current_term", |s| Ok(s.term))
    }

    async fn needed_transitions(&self) -> Result<u64, LedgerError> {
        self.read("needed_transitions", |s| Ok(s.needed))
    }

    async fn dispute(&self, dispute: DisputeId) -> Result<Dispute, LedgerError> {
        self.read("dispute", |s| s.dispute("dispute", dispute).cloned())
    }

    async fn round(&self, dispute: DisputeId, round: RoundId) -> Result<Round, LedgerError> {
        self.read("round", |s| {
            s.rounds.get(&(dispute, round)).cloned().ok_or_else(|| {
                LedgerError::rejected(
                    "round",
                    RejectionReason::Other("DM_ROUND_DOES_NOT_EXIST".into()),
                )
            })
        })
    }

    async fn appeal(&self, dispute: DisputeId, round: RoundId) -> Result<Appeal, LedgerError> {
        self.read("appeal", |s| {
            Ok(s.appeals.get(&(dispute, round)).cloned().unwrap_or(Appeal {
                maker: Address::ZERO,
                appealed_ruling: Outcome::MISSING,
                taker: Address::ZERO,
                opposed_ruling: Outcome::MISSING,
            }))
        })
    }

    async fn next_round_details(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<NextRoundDetails, LedgerError> {
        self.read("next_round_details", |s| {
            s.next_rounds.get(&(dispute, round)).cloned().ok_or_else(|| {
                LedgerError::rejected(
                    "next_round_details",
                    RejectionReason::Other("DM_ROUND_IS_FINAL".into()),
                )
            })
        })
    }

    async fn juror(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<JurorDraft, LedgerError> {
        self.read("juror", |s| {
            Ok(s.jurors
                .get(&(dispute, round, juror))
                .copied()
                .unwrap_or_default())
        })
    }

    async fn voter_outcome(&self, vote: VoteId, voter: Address) -> Result<Outcome, LedgerError> {
        self.read("voter_outcome", |s| {
            Ok(s.outcomes
                .get(&(vote, voter))
                .copied()
                .unwrap_or(Outcome::MISSING))
        })
    }

    async fn max_allowed_outcome(&self, vote: VoteId) -> Result<Outcome, LedgerError> {
        self.read("max_allowed_outcome", |s| Ok(s.max_allowed_outcome(vote)))
    }

    async fn is_valid_outcome(&self, vote: VoteId, outcome: Outcome) -> Result<bool, LedgerError> {
        self.read("is_valid_outcome", |s| {
            let max = s.max_allowed_outcome(vote);
            Ok(!max.is_missing() && outcome >= Outcome::REFUSED && outcome <= max)
        })
    }

    async fn storage_at(&self, contract: Address, slot: B256) -> Result<B256, LedgerError> {
        self.read("storage_at", |s| {
            Ok(s.storage.get(&(contract, slot)).copied().unwrap_or_default())
        })
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, LedgerError> {
        self.read("token_decimals", |s| {
            Ok(s.decimals.get(&token).copied().unwrap_or(18))
        })
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        self.read("allowance", |s| {
            Ok(s.allowances
                .get(&(token, owner, spender))
                .copied()
                .unwrap_or_default())
        })
    }

    async fn subscription_fees(&self, subject: Address) -> Result<SubscriptionFees, LedgerError> {
        self.read("subscription_fees", |s| {
            s.subscription_fees.get(&subject).cloned().ok_or_else(|| {
                LedgerError::rejected(
                    "subscription_fees",
                    RejectionReason::Other("SUB_SUBJECT_NOT_FOUND".into()),
                )
            })
        })
    }

    async fn heartbeat(&self, max_transitions: u64) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::Heartbeat { max_transitions }, |s| {
            let transitions = max_transitions.min(s.needed);
            let mut logs = Vec::new();
            for _ in 0..transitions {
                let previous = s.term;
                s.term = TermId(previous.0 + 1);
                logs.push(LedgerEvent::Heartbeat {
                    previous_term_id: previous,
                    current_term_id: s.term,
                });
            }
            s.needed -= transitions;
            Ok(logs)
        })
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::Approve {
            token,
            spender,
            amount,
        };
        self.submit(call, |s| {
            let key = (token, s.sender, spender);
            let current = s.allowances.get(&key).copied().unwrap_or_default();
            if !current.is_zero() && !amount.is_zero() {
                return Err(LedgerError::rejected(
                    "approve",
                    RejectionReason::Other("TOKEN_APPROVE_NONZERO_ALLOWANCE".into()),
                ));
            }
            s.allowances.insert(key, amount);
            Ok(Vec::new())
        })
    }

    async fn stake_for(
        &self,
        juror: Address,
        amount: U256,
        data: Bytes,
    ) -> Result<Receipt, LedgerError> {
        let activate = data == activate_data();
        let call = LedgerCall::StakeFor {
            juror,
            amount,
            data,
        };
        self.submit(call, |s| {
            let token = s.address_of(CourtModule::JurorsToken);
            let registry = s.address_of(CourtModule::JurorsRegistry);
            s.spend_allowance("stake_for", token, registry, amount)?;
            *s.stakes.entry(juror).or_default() += amount;
            if activate {
                *s.active.entry(juror).or_default() += amount;
            }
            Ok(Vec::new())
        })
    }

    async fn unstake(&self, amount: U256, data: Bytes) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::Unstake { amount, data }, |s| {
            let sender = s.sender;
            let staked = s.stakes.get(&sender).copied().unwrap_or_default();
            let active = s.active.get(&sender).copied().unwrap_or_default();
            if staked.saturating_sub(active) < amount {
                return Err(LedgerError::rejected(
                    "unstake",
                    RejectionReason::Other("JR_NOT_ENOUGH_AVAILABLE_BALANCE".into()),
                ));
            }
            s.stakes.insert(sender, staked - amount);
            Ok(Vec::new())
        })
    }

    async fn activate(&self, amount: U256) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::Activate { amount }, |s| {
            let sender = s.sender;
            let staked = s.stakes.get(&sender).copied().unwrap_or_default();
            let active = s.active.get(&sender).copied().unwrap_or_default();
            if staked.saturating_sub(active) < amount {
                return Err(LedgerError::rejected(
                    "activate",
                    RejectionReason::Other("JR_INVALID_ACTIVATION_AMOUNT".into()),
                ));
            }
            s.active.insert(sender, active + amount);
            Ok(Vec::new())
        })
    }

    async fn deactivate(&self, amount: U256) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::Deactivate { amount }, |s| {
            let sender = s.sender;
            let active = s.active.get(&sender).copied().unwrap_or_default();
            if active < amount {
                return Err(LedgerError::rejected(
                    "deactivate",
                    RejectionReason::Other("JR_INVALID_DEACTIVATION_AMOUNT".into()),
                ));
            }
            s.active.insert(sender, active - amount);
            Ok(Vec::new())
        })
    }

    async fn pay_fees(&self, subject: Address, periods: u64) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::PayFees { subject, periods }, |s| {
            let fees = s.subscription_fees.get(&subject).cloned().ok_or_else(|| {
                LedgerError::rejected(
                    "pay_fees",
                    RejectionReason::Other("SUB_SUBJECT_NOT_FOUND".into()),
                )
            })?;
            s.spend_allowance("pay_fees", fees.fee_token, fees.recipient, fees.fee_amount)?;
            Ok(Vec::new())
        })
    }

    async fn create_dispute(
        &self,
        subject: Address,
        possible_rulings: u8,
        metadata: Bytes,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::CreateDispute {
            subject,
            possible_rulings,
            metadata,
        };
        self.submit(call, |s| {
            let id = DisputeId(s.next_dispute_id);
            s.next_dispute_id += 1;
            s.disputes.insert(
                id,
                Dispute {
                    subject,
                    possible_rulings,
                    state: DisputeState::PreDraft,
                    final_ruling: Outcome::MISSING,
                    last_round_id: RoundId(0),
                    create_term_id: s.term,
                },
            );
            s.rounds.insert(
                (id, RoundId(0)),
                Round {
                    draft_term: TermId(s.term.0 + 1),
                    delayed_terms: 0,
                    jurors_number: DEFAULT_JURORS_NUMBER,
                    selected_jurors: 0,
                    juror_fees: U256::ZERO,
                    settled_penalties: false,
                    collected_tokens: U256::ZERO,
                    coherent_jurors: 0,
                    state: AdjudicationState::Invalid,
                },
            );
            Ok(if s.emit_new_dispute {
                vec![LedgerEvent::NewDispute {
                    dispute_id: id,
                    subject,
                }]
            } else {
                Vec::new()
            })
        })
    }

    async fn submit_evidence(
        &self,
        subject: Address,
        dispute: DisputeId,
        evidence: Bytes,
        finished: bool,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::SubmitEvidence {
            subject,
            dispute,
            evidence,
            finished,
        };
        self.submit(call, |s| {
            let last_round = s.dispute("submit_evidence", dispute)?.last_round_id;
            if !finished {
                return Ok(Vec::new());
            }
            let term = s.term;
            let round = s.round_mut("submit_evidence", (dispute, last_round))?;
            if round.draft_term > term {
                round.draft_term = term;
            }
            Ok(vec![LedgerEvent::EvidencePeriodClosed {
                dispute_id: dispute,
                term_id: term,
            }])
        })
    }

    async fn draft(&self, dispute: DisputeId) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::Draft { dispute }, |s| {
            if s.needed > 0 {
                return Err(LedgerError::rejected("draft", RejectionReason::TermOutdated));
            }
            let last_round = s.dispute("draft", dispute)?.last_round_id;
            let term = s.term;
            let pool = s.draft_pools.get(&dispute).cloned().unwrap_or_default();

            let round = s.round_mut("draft", (dispute, last_round))?;
            if round.draft_term > term {
                return Err(LedgerError::rejected(
                    "draft",
                    RejectionReason::DraftTermNotReached,
                ));
            }
            if round.state != AdjudicationState::Invalid {
                return Err(LedgerError::rejected(
                    "draft",
                    RejectionReason::InvalidAdjudicationState,
                ));
            }
            let seats = usize::try_from(round.jurors_number).unwrap_or(usize::MAX);
            let drawn: Vec<Address> = pool.into_iter().take(seats).collect();
            round.selected_jurors = drawn.len() as u64;
            round.state = AdjudicationState::Committing;

            let mut logs = Vec::with_capacity(drawn.len());
            for juror in drawn {
                s.jurors
                    .entry((dispute, last_round, juror))
                    .or_default()
                    .weight += 1;
                logs.push(LedgerEvent::JurorDrafted {
                    dispute_id: dispute,
                    round_id: last_round,
                    juror,
                });
            }
            if let Some(d) = s.disputes.get_mut(&dispute) {
                d.state = DisputeState::Adjudicating;
            }
            Ok(logs)
        })
    }

    async fn commit(&self, vote: VoteId, commitment: B256) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::Commit { vote, commitment }, |s| {
            if s.vote_round(vote).is_none() {
                return Err(LedgerError::rejected(
                    "commit",
                    RejectionReason::Other("CRV_VOTE_DOES_NOT_EXIST".into()),
                ));
            }
            let key = (vote, s.sender);
            if s.commitments.contains_key(&key) {
                return Err(LedgerError::rejected(
                    "commit",
                    RejectionReason::VoteAlreadyCommitted,
                ));
            }
            s.commitments.insert(key, commitment);
            Ok(Vec::new())
        })
    }

    async fn reveal(
        &self,
        vote: VoteId,
        voter: Address,
        outcome: Outcome,
        salt: B256,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::Reveal {
            vote,
            voter,
            outcome,
            salt,
        };
        self.submit(call, |s| {
            if s.outcomes.contains_key(&(vote, voter)) {
                return Err(LedgerError::rejected(
                    "reveal",
                    RejectionReason::VoteAlreadyRevealed,
                ));
            }
            match s.commitments.get(&(vote, voter)) {
                Some(sealed) if *sealed == vote::seal(outcome, salt) => {}
                _ => {
                    return Err(LedgerError::rejected(
                        "reveal",
                        RejectionReason::InvalidCommitmentSalt,
                    ))
                }
            }
            s.outcomes.insert((vote, voter), outcome);
            Ok(Vec::new())
        })
    }

    async fn create_appeal(
        &self,
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::CreateAppeal {
            dispute,
            round,
            ruling,
        };
        self.submit(call, |s| {
            let manager = s.address_of(CourtModule::DisputeManager);
            if let Some(next) = s.next_rounds.get(&(dispute, round)).cloned() {
                s.spend_allowance("create_appeal", next.fee_token, manager, next.appeal_deposit)?;
            }
            let maker = s.sender;
            s.round_mut("create_appeal", (dispute, round))?.state =
                AdjudicationState::ConfirmingAppeal;
            s.appeals.insert(
                (dispute, round),
                Appeal {
                    maker,
                    appealed_ruling: ruling,
                    taker: Address::ZERO,
                    opposed_ruling: Outcome::MISSING,
                },
            );
            Ok(Vec::new())
        })
    }

    async fn confirm_appeal(
        &self,
        dispute: DisputeId,
        round: RoundId,
        ruling: Outcome,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::ConfirmAppeal {
            dispute,
            round,
            ruling,
        };
        self.submit(call, |s| {
            let manager = s.address_of(CourtModule::DisputeManager);
            let next = s.next_rounds.get(&(dispute, round)).cloned();
            if let Some(next) = &next {
                s.spend_allowance(
                    "confirm_appeal",
                    next.fee_token,
                    manager,
                    next.confirm_appeal_deposit,
                )?;
            }
            let taker = s.sender;
            let appeal = s.appeals.get_mut(&(dispute, round)).ok_or_else(|| {
                LedgerError::rejected(
                    "confirm_appeal",
                    RejectionReason::InvalidAdjudicationState,
                )
            })?;
            appeal.taker = taker;
            appeal.opposed_ruling = ruling;
            s.round_mut("confirm_appeal", (dispute, round))?.state = AdjudicationState::Ended;

            if let Some(next) = next {
                let new_round = RoundId(round.0 + 1);
                s.rounds.insert(
                    (dispute, new_round),
                    Round {
                        draft_term: next.next_round_start_term,
                        delayed_terms: 0,
                        jurors_number: next.jurors_number,
                        selected_jurors: 0,
                        juror_fees: next.juror_fees,
                        settled_penalties: false,
                        collected_tokens: U256::ZERO,
                        coherent_jurors: 0,
                        state: AdjudicationState::Invalid,
                    },
                );
                if let Some(d) = s.disputes.get_mut(&dispute) {
                    d.last_round_id = new_round;
                    d.state = next.new_dispute_state;
                }
            }
            Ok(Vec::new())
        })
    }

    async fn settle_penalties(
        &self,
        dispute: DisputeId,
        round: RoundId,
        jurors_to_settle: u64,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::SettlePenalties {
            dispute,
            round,
            jurors_to_settle,
        };
        self.submit(call, |s| {
            let snapshot = s.round_mut("settle_penalties", (dispute, round))?;
            if snapshot.settled_penalties {
                return Err(LedgerError::rejected(
                    "settle_penalties",
                    RejectionReason::PenaltiesAlreadySettled,
                ));
            }
            snapshot.settled_penalties = true;
            Ok(Vec::new())
        })
    }

    async fn settle_reward(
        &self,
        dispute: DisputeId,
        round: RoundId,
        juror: Address,
    ) -> Result<Receipt, LedgerError> {
        let call = LedgerCall::SettleReward {
            dispute,
            round,
            juror,
        };
        self.submit(call, |s| {
            let final_ruling = s.dispute("settle_reward", dispute)?.final_ruling;
            if !s.round_mut("settle_reward", (dispute, round))?.settled_penalties {
                return Err(LedgerError::rejected(
                    "settle_reward",
                    RejectionReason::Other("DM_ROUND_PENALTIES_NOT_SETTLED".into()),
                ));
            }
            let vote = VoteId::new(dispute, round);
            let outcome = s
                .outcomes
                .get(&(vote, juror))
                .copied()
                .unwrap_or(Outcome::MISSING);
            let draft = s.jurors.entry((dispute, round, juror)).or_default();
            if draft.rewarded {
                return Err(LedgerError::rejected(
                    "settle_reward",
                    RejectionReason::JurorAlreadyRewarded,
                ));
            }
            if !draft.is_drafted() || outcome != final_ruling {
                return Err(LedgerError::rejected(
                    "settle_reward",
                    RejectionReason::Other("DM_WONT_REWARD_INCOHERENT_JUROR".into()),
                ));
            }
            draft.rewarded = true;
            Ok(Vec::new())
        })
    }

    async fn settle_appeal_deposit(
        &self,
        dispute: DisputeId,
        round: RoundId,
    ) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::SettleAppealDeposit { dispute, round }, |s| {
            if s.settled_appeals.contains(&(dispute, round)) {
                return Err(LedgerError::rejected(
                    "settle_appeal_deposit",
                    RejectionReason::AppealAlreadySettled,
                ));
            }
            if !s.round_mut("settle_appeal_deposit", (dispute, round))?.settled_penalties {
                return Err(LedgerError::rejected(
                    "settle_appeal_deposit",
                    RejectionReason::Other("DM_ROUND_PENALTIES_NOT_SETTLED".into()),
                ));
            }
            let confirmed = s
                .appeals
                .get(&(dispute, round))
                .is_some_and(Appeal::is_confirmed);
            if !confirmed {
                return Err(LedgerError::rejected(
                    "settle_appeal_deposit",
                    RejectionReason::Other("DM_ROUND_NOT_APPEALED".into()),
                ));
            }
            s.settled_appeals.insert((dispute, round));
            Ok(Vec::new())
        })
    }

    async fn execute_ruling(&self, dispute: DisputeId) -> Result<Receipt, LedgerError> {
        self.submit(LedgerCall::ExecuteRuling { dispute }, |s| {
            let ruling = s
                .rulings_on_execute
                .get(&dispute)
                .copied()
                .unwrap_or(Outcome::REFUSED);
            let record = s.disputes.get_mut(&dispute).ok_or_else(|| {
                LedgerError::rejected(
                    "execute_ruling",
                    RejectionReason::Other("DM_DISPUTE_DOES_NOT_EXIST".into()),
                )
            })?;
            if record.is_ruled() {
                return Err(LedgerError::rejected(
                    "execute_ruling",
                    RejectionReason::Other("DM_INVALID_DISPUTE_STATE".into()),
                ));
            }
            record.final_ruling = ruling;
            record.state = DisputeState::Ruled;
            Ok(Vec::new())
        })
    }
}
