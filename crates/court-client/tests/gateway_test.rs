//! LedgerGateway behaviour against the in-memory ledger.

use std::sync::Arc;

use court_client::{activate_data, LedgerError, LedgerGateway, RejectionReason};
use court_core::{
    vote, AdjudicationState, Address, Bytes, CourtModule, Dispute, DisputeId, DisputeState,
    NextRoundDetails, Outcome, Round, RoundId, SubscriptionFees, TermId, VoteId, B256, U256,
};
use court_stub::{LedgerCall, MemoryLedger};

fn sender() -> Address {
    Address::repeat_byte(0xaa)
}

fn subject() -> Address {
    Address::repeat_byte(0x51)
}

fn setup() -> (Arc<MemoryLedger>, LedgerGateway<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new(sender()));
    let gateway = LedgerGateway::new(Arc::clone(&ledger));
    (ledger, gateway)
}

fn round(draft_term: u64, state: AdjudicationState) -> Round {
    Round {
        draft_term: TermId(draft_term),
        delayed_terms: 0,
        jurors_number: 3,
        selected_jurors: 0,
        juror_fees: U256::ZERO,
        settled_penalties: false,
        collected_tokens: U256::ZERO,
        coherent_jurors: 0,
        state,
    }
}

fn dispute(last_round: u64) -> Dispute {
    Dispute {
        subject: subject(),
        possible_rulings: 2,
        state: DisputeState::Adjudicating,
        final_ruling: Outcome::MISSING,
        last_round_id: RoundId(last_round),
        create_term_id: TermId(1),
    }
}

fn approvals(ledger: &MemoryLedger) -> Vec<U256> {
    ledger
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            LedgerCall::Approve { amount, .. } => Some(amount),
            _ => None,
        })
        .collect()
}

// ── Terms ────────────────────────────────────────────────────────────

#[tokio::test]
async fn advance_terms_submits_nothing_when_current() {
    let (ledger, gateway) = setup();
    ledger.set_term(TermId(7), 0);

    assert_eq!(gateway.advance_terms(2).await.unwrap(), 0);
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn advance_terms_caps_at_max() {
    let (ledger, gateway) = setup();
    ledger.set_term(TermId(7), 5);

    assert_eq!(gateway.advance_terms(2).await.unwrap(), 2);
    assert_eq!(
        ledger.calls(),
        vec![LedgerCall::Heartbeat { max_transitions: 2 }]
    );
    assert_eq!(gateway.current_term().await.unwrap(), TermId(9));
}

#[tokio::test]
async fn advance_terms_with_zero_cap_submits_nothing() {
    let (ledger, gateway) = setup();
    ledger.set_term(TermId(7), 5);

    assert_eq!(gateway.advance_terms(0).await.unwrap(), 0);
    assert!(ledger.calls().is_empty());
    assert_eq!(gateway.needed_transitions().await.unwrap(), 5);
}

#[tokio::test]
async fn advance_terms_requests_only_what_is_owed() {
    let (ledger, gateway) = setup();
    ledger.set_term(TermId(7), 1);

    assert_eq!(gateway.advance_terms(2).await.unwrap(), 1);
    assert_eq!(
        ledger.calls(),
        vec![LedgerCall::Heartbeat { max_transitions: 1 }]
    );
}

#[tokio::test]
async fn advance_terms_propagates_unavailable() {
    let (ledger, gateway) = setup();
    ledger.fail_next(
        "needed_transitions",
        LedgerError::Unavailable {
            operation: "needed_transitions".into(),
            reason: "connection refused".into(),
        },
    );

    assert!(gateway.advance_terms(2).await.unwrap_err().is_unavailable());
    assert_eq!(ledger.count("heartbeat"), 0);
}

// ── Allowances ───────────────────────────────────────────────────────

#[tokio::test]
async fn approve_resets_nonzero_allowance_first() {
    let (ledger, gateway) = setup();
    let token = Address::repeat_byte(0x70);
    let spender = Address::repeat_byte(0x71);
    ledger.set_allowance(token, sender(), spender, U256::from(5u64));

    let receipts = gateway
        .approve(token, U256::from(40u64), spender)
        .await
        .unwrap();
    assert_eq!(receipts.len(), 2);
    assert_eq!(approvals(&ledger), vec![U256::ZERO, U256::from(40u64)]);
}

#[tokio::test]
async fn approve_from_zero_is_one_submission() {
    let (ledger, gateway) = setup();
    let token = Address::repeat_byte(0x70);
    let spender = Address::repeat_byte(0x71);

    let receipts = gateway
        .approve(token, U256::from(40u64), spender)
        .await
        .unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(approvals(&ledger), vec![U256::from(40u64)]);
}

// ── Juror stake ──────────────────────────────────────────────────────

#[tokio::test]
async fn stake_scales_by_token_decimals_and_approves_registry() {
    let (ledger, gateway) = setup();
    let token = ledger.module_address(CourtModule::JurorsToken);
    let registry = ledger.module_address(CourtModule::JurorsRegistry);
    ledger.set_decimals(token, 18);
    let juror = Address::repeat_byte(0x0f);

    gateway.stake(juror, "1.5", Bytes::new()).await.unwrap();

    let expected = U256::from(1_500_000_000_000_000_000u64);
    assert_eq!(
        ledger.calls(),
        vec![
            LedgerCall::Approve {
                token,
                spender: registry,
                amount: expected
            },
            LedgerCall::StakeFor {
                juror,
                amount: expected,
                data: Bytes::new()
            },
        ]
    );
    assert_eq!(ledger.stake_of(juror), expected);
    assert_eq!(ledger.active_of(juror), U256::ZERO);
}

#[tokio::test]
async fn activate_for_stakes_with_activation_data() {
    let (ledger, gateway) = setup();
    let token = ledger.module_address(CourtModule::JurorsToken);
    ledger.set_decimals(token, 2);
    let juror = Address::repeat_byte(0x0f);

    gateway.activate_for(juror, "3").await.unwrap();

    let stake = ledger
        .calls()
        .into_iter()
        .find(|c| c.operation() == "stake_for")
        .unwrap();
    assert_eq!(
        stake,
        LedgerCall::StakeFor {
            juror,
            amount: U256::from(300u64),
            data: activate_data()
        }
    );
    assert_eq!(ledger.active_of(juror), U256::from(300u64));
}

#[tokio::test]
async fn too_precise_amount_is_rejected_before_submission() {
    let (ledger, gateway) = setup();
    let token = ledger.module_address(CourtModule::JurorsToken);
    ledger.set_decimals(token, 2);

    let err = gateway.activate("0.001").await.unwrap_err();
    assert!(matches!(err, LedgerError::Amount(_)));
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn deactivate_more_than_active_is_rejected() {
    let (ledger, gateway) = setup();
    let err = gateway.deactivate("1").await.unwrap_err();
    assert!(err.rejection().is_some());
}

// ── Subscriptions ────────────────────────────────────────────────────

#[tokio::test]
async fn subscribe_approves_recipient_then_pays() {
    let (ledger, gateway) = setup();
    let fees = SubscriptionFees {
        recipient: Address::repeat_byte(0x44),
        fee_token: Address::repeat_byte(0x45),
        fee_amount: U256::from(250u64),
    };
    ledger.set_subscription_fees(subject(), fees.clone());

    gateway.subscribe(subject(), 3).await.unwrap();
    assert_eq!(
        ledger.calls(),
        vec![
            LedgerCall::Approve {
                token: fees.fee_token,
                spender: fees.recipient,
                amount: fees.fee_amount
            },
            LedgerCall::PayFees {
                subject: subject(),
                periods: 3
            },
        ]
    );
}

// ── Disputes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_dispute_returns_id_and_submits_evidence_in_order() {
    let (ledger, gateway) = setup();
    let evidence = vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")];

    let id = gateway
        .submit_dispute(subject(), 2, Bytes::from_static(b"meta"), &evidence)
        .await
        .unwrap();

    let submitted: Vec<Bytes> = ledger
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            LedgerCall::SubmitEvidence {
                dispute,
                evidence,
                finished,
                ..
            } => {
                assert_eq!(dispute, id);
                assert!(!finished);
                Some(evidence)
            }
            _ => None,
        })
        .collect();
    assert_eq!(submitted, evidence);
}

#[tokio::test]
async fn submit_dispute_without_event_is_missing_event() {
    let (ledger, gateway) = setup();
    ledger.suppress_new_dispute_events();

    let err = gateway
        .submit_dispute(subject(), 2, Bytes::new(), &[Bytes::from_static(b"e")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::MissingEvent {
            event: "NewDispute",
            ..
        }
    ));
    assert_eq!(ledger.count("submit_evidence"), 0);
}

#[tokio::test]
async fn draft_closes_evidence_period_when_draft_term_is_ahead() {
    let (ledger, gateway) = setup();
    let id = DisputeId(1);
    ledger.set_term(TermId(10), 0);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(12, AdjudicationState::Invalid));
    let a = Address::repeat_byte(1);
    let b = Address::repeat_byte(2);
    ledger.set_draft_pool(id, vec![a, b, a]);

    let jurors = gateway.draft(id).await.unwrap();

    assert_eq!(jurors, vec![a, b, a]);
    let ops: Vec<&str> = ledger.calls().iter().map(LedgerCall::operation).collect();
    assert_eq!(ops, vec!["submit_evidence", "draft"]);
    assert_eq!(ledger.juror_snapshot(id, RoundId(0), a).weight, 2);
}

#[tokio::test]
async fn draft_skips_evidence_close_when_draft_term_reached() {
    let (ledger, gateway) = setup();
    let id = DisputeId(1);
    ledger.set_term(TermId(12), 0);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(12, AdjudicationState::Invalid));
    ledger.set_draft_pool(id, vec![Address::repeat_byte(1)]);

    gateway.draft(id).await.unwrap();
    assert_eq!(ledger.count("submit_evidence"), 0);
    assert_eq!(ledger.count("draft"), 1);
}

// ── Voting ───────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_then_reveal_with_same_password() {
    let (ledger, gateway) = setup();
    let id = DisputeId(2);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(0, AdjudicationState::Committing));

    gateway.commit(id, Outcome(3), "correct horse").await.unwrap();
    let vote = VoteId::new(id, RoundId(0));
    assert_eq!(
        ledger.commitment_of(vote, sender()),
        Some(vote::seal(Outcome(3), vote::salt("correct horse")))
    );

    gateway
        .reveal(id, sender(), Outcome(3), "correct horse")
        .await
        .unwrap();
    assert_eq!(
        gateway.voter_outcome(vote, sender()).await.unwrap(),
        Outcome(3)
    );
}

#[tokio::test]
async fn reveal_with_wrong_password_is_rejected_by_ledger() {
    let (ledger, gateway) = setup();
    let id = DisputeId(2);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(0, AdjudicationState::Committing));
    gateway.commit(id, Outcome(3), "right").await.unwrap();

    let err = gateway
        .reveal(id, sender(), Outcome(3), "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&RejectionReason::InvalidCommitmentSalt));
}

#[tokio::test]
async fn vote_existence_and_validity() {
    let (ledger, gateway) = setup();
    let id = DisputeId(2);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(0, AdjudicationState::Committing));
    let vote = VoteId::new(id, RoundId(0));
    let missing = VoteId::new(DisputeId(50), RoundId(0));

    assert!(gateway.vote_exists(vote).await.unwrap());
    assert!(!gateway.vote_exists(missing).await.unwrap());
    assert!(gateway.is_valid_outcome(vote, Outcome(3)).await.unwrap());
    assert!(!gateway.is_valid_outcome(missing, Outcome(3)).await.unwrap());
}

#[tokio::test]
async fn commitment_reads_voting_storage_slot() {
    let (ledger, gateway) = setup();
    let vote = VoteId::new(DisputeId(2), RoundId(0));
    let juror = Address::repeat_byte(9);
    let sealed = vote::seal(Outcome(4), vote::salt("pw"));
    ledger.set_storage(
        ledger.module_address(CourtModule::Voting),
        vote::commitment_slot(vote, juror),
        sealed,
    );

    assert_eq!(gateway.commitment(vote, juror).await.unwrap(), sealed);
    assert_eq!(
        gateway
            .commitment(vote, Address::repeat_byte(8))
            .await
            .unwrap(),
        B256::ZERO
    );
}

// ── Appeals ──────────────────────────────────────────────────────────

fn next_round(fee_token: Address) -> NextRoundDetails {
    NextRoundDetails {
        next_round_start_term: TermId(30),
        jurors_number: 7,
        new_dispute_state: DisputeState::PreDraft,
        fee_token,
        total_fees: U256::from(1_000u64),
        juror_fees: U256::from(700u64),
        appeal_deposit: U256::from(300u64),
        confirm_appeal_deposit: U256::from(450u64),
    }
}

#[tokio::test]
async fn appeal_approves_exact_deposit() {
    let (ledger, gateway) = setup();
    let id = DisputeId(3);
    let fee_token = ledger.module_address(CourtModule::FeeToken);
    let manager = ledger.module_address(CourtModule::DisputeManager);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(0, AdjudicationState::Appealing));
    ledger.insert_next_round(id, RoundId(0), next_round(fee_token));

    gateway.appeal(id, Outcome(4)).await.unwrap();
    assert_eq!(
        ledger.calls(),
        vec![
            LedgerCall::Approve {
                token: fee_token,
                spender: manager,
                amount: U256::from(300u64)
            },
            LedgerCall::CreateAppeal {
                dispute: id,
                round: RoundId(0),
                ruling: Outcome(4)
            },
        ]
    );
}

#[tokio::test]
async fn confirm_appeal_approves_confirm_deposit_and_opens_next_round() {
    let (ledger, gateway) = setup();
    let id = DisputeId(3);
    let fee_token = ledger.module_address(CourtModule::FeeToken);
    ledger.insert_dispute(id, dispute(0));
    ledger.insert_round(id, RoundId(0), round(0, AdjudicationState::Appealing));
    ledger.insert_next_round(id, RoundId(0), next_round(fee_token));
    gateway.appeal(id, Outcome(4)).await.unwrap();

    gateway.confirm_appeal(id, Outcome(3)).await.unwrap();

    assert_eq!(
        approvals(&ledger),
        vec![U256::from(300u64), U256::from(450u64)]
    );
    let appeal = gateway.appeal_of(id, RoundId(0)).await.unwrap();
    assert!(appeal.is_confirmed());
    assert_eq!(
        gateway.dispute(id).await.unwrap().last_round_id,
        RoundId(1)
    );
}
