//! DisputeOrchestrator against the in-memory ledger and index.

use std::sync::Arc;

use court_arbitration::{ArbitrationError, DisputeOrchestrator};
use court_client::{LedgerError, LedgerGateway, RejectionReason};
use court_core::{
    AdjudicationState, Address, Appeal, Dispute, DisputeId, DisputeState, Outcome, Round,
    RoundId, TermId, VoteId, U256,
};
use court_stub::{LedgerCall, MemoryIndex, MemoryLedger};

const DISPUTE: DisputeId = DisputeId(0);

fn sender() -> Address {
    Address::repeat_byte(0xaa)
}

fn juror(n: u8) -> Address {
    Address::repeat_byte(n)
}

struct Harness {
    ledger: Arc<MemoryLedger>,
    index: Arc<MemoryIndex>,
    court: DisputeOrchestrator<MemoryLedger, MemoryIndex>,
}

fn harness() -> Harness {
    let ledger = Arc::new(MemoryLedger::new(sender()));
    ledger.set_term(TermId(5), 0);
    let index = Arc::new(MemoryIndex::new());
    let court = DisputeOrchestrator::new(
        LedgerGateway::new(Arc::clone(&ledger)),
        Arc::clone(&index),
    );
    Harness {
        ledger,
        index,
        court,
    }
}

fn round(state: AdjudicationState) -> Round {
    Round {
        draft_term: TermId(1),
        delayed_terms: 0,
        jurors_number: 3,
        selected_jurors: 3,
        juror_fees: U256::ZERO,
        settled_penalties: false,
        collected_tokens: U256::ZERO,
        coherent_jurors: 0,
        state,
    }
}

fn dispute(last_round: u64, final_ruling: Outcome) -> Dispute {
    Dispute {
        subject: Address::repeat_byte(0x51),
        possible_rulings: 2,
        state: if final_ruling.is_missing() {
            DisputeState::Adjudicating
        } else {
            DisputeState::Ruled
        },
        final_ruling,
        last_round_id: RoundId(last_round),
        create_term_id: TermId(1),
    }
}

fn confirmed_appeal() -> Appeal {
    Appeal {
        maker: Address::repeat_byte(0x0a),
        appealed_ruling: Outcome(3),
        taker: Address::repeat_byte(0x0b),
        opposed_ruling: Outcome(4),
    }
}

/// One ended round with three drafted jurors voting `outcomes`.
fn seed_single_round(h: &Harness, outcomes: [Outcome; 3], ruling: Outcome) {
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Ended));
    h.ledger.set_ruling_on_execute(DISPUTE, ruling);

    let vote = VoteId::new(DISPUTE, RoundId(0));
    let jurors: Vec<Address> = (1..=3).map(juror).collect();
    for (j, outcome) in jurors.iter().zip(outcomes) {
        h.ledger.set_juror_weight(DISPUTE, RoundId(0), *j, 1);
        h.ledger.set_voter_outcome(vote, *j, outcome);
    }
    h.index.set_drafted(DISPUTE, RoundId(0), jurors);
}

fn rewarded(ledger: &MemoryLedger) -> Vec<Address> {
    ledger
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            LedgerCall::SettleReward { juror, .. } => Some(juror),
            _ => None,
        })
        .collect()
}

// ── Drafting ─────────────────────────────────────────────────────────

#[tokio::test]
async fn draft_brings_terms_current_first() {
    let h = harness();
    h.ledger.set_term(TermId(5), 2);
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    let mut pending = round(AdjudicationState::Invalid);
    pending.draft_term = TermId(6);
    pending.selected_jurors = 0;
    h.ledger.insert_round(DISPUTE, RoundId(0), pending);
    h.ledger
        .set_draft_pool(DISPUTE, vec![juror(1), juror(2), juror(3)]);

    let drafted = h.court.draft(DISPUTE).await.unwrap();

    assert_eq!(drafted, vec![juror(1), juror(2), juror(3)]);
    assert_eq!(
        h.ledger.calls(),
        vec![
            LedgerCall::Heartbeat { max_transitions: 2 },
            LedgerCall::Draft { dispute: DISPUTE },
        ]
    );
}

#[tokio::test]
async fn draft_retries_once_after_term_rejection() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Invalid));
    h.ledger.set_draft_pool(DISPUTE, vec![juror(1)]);
    h.ledger.fail_next(
        "draft",
        LedgerError::rejected("draft", RejectionReason::TermOutdated),
    );

    let drafted = h.court.draft(DISPUTE).await.unwrap();

    assert_eq!(drafted, vec![juror(1)]);
    assert_eq!(h.ledger.count("draft"), 2);
}

#[tokio::test]
async fn repeated_term_rejection_is_a_precondition_error() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Invalid));
    for _ in 0..2 {
        h.ledger.fail_next(
            "draft",
            LedgerError::rejected("draft", RejectionReason::TermOutdated),
        );
    }

    let err = h.court.draft(DISPUTE).await.unwrap_err();

    assert!(
        matches!(err, ArbitrationError::Precondition { ref operation, .. } if operation == "draft"),
        "got {err:?}"
    );
    assert_eq!(h.ledger.count("draft"), 2);
}

#[tokio::test]
async fn other_draft_rejections_are_not_retried() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Committing));

    let err = h.court.draft(DISPUTE).await.unwrap_err();

    match err {
        ArbitrationError::Ledger(e) => assert_eq!(
            e.rejection(),
            Some(&RejectionReason::InvalidAdjudicationState)
        ),
        other => panic!("expected ledger rejection, got {other:?}"),
    }
    assert_eq!(h.ledger.count("draft"), 1);
}

// ── Voting ───────────────────────────────────────────────────────────

#[tokio::test]
async fn committed_vote_can_be_revealed_with_same_password() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Committing));

    h.court
        .commit(DISPUTE, Outcome(3), "correct horse")
        .await
        .unwrap();
    h.court
        .reveal(DISPUTE, sender(), Outcome(3), "correct horse")
        .await
        .unwrap();

    let vote = VoteId::new(DISPUTE, RoundId(0));
    assert_eq!(
        h.court.gateway().voter_outcome(vote, sender()).await.unwrap(),
        Outcome(3)
    );
}

// ── Settlement ───────────────────────────────────────────────────────

#[tokio::test]
async fn can_settle_follows_ruling_and_last_round() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome::MISSING));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Appealing));
    assert!(!h.court.can_settle(DISPUTE).await.unwrap());

    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Ended));
    assert!(h.court.can_settle(DISPUTE).await.unwrap());

    h.ledger.insert_dispute(DISPUTE, dispute(0, Outcome(3)));
    assert!(h.court.can_settle(DISPUTE).await.unwrap());
}

#[tokio::test]
async fn only_coherent_jurors_are_rewarded() {
    let h = harness();
    seed_single_round(&h, [Outcome(1), Outcome(2), Outcome(1)], Outcome(1));

    let report = h.court.settle(DISPUTE).await.unwrap();

    assert_eq!(h.ledger.count("settle_reward"), 2);
    assert_eq!(rewarded(&h.ledger), vec![juror(1), juror(3)]);
    assert_eq!(report.final_ruling, Outcome(1));
    assert_eq!(
        report.rewards_settled,
        vec![(RoundId(0), juror(1)), (RoundId(0), juror(3))]
    );
}

#[tokio::test]
async fn settle_executes_missing_ruling_once() {
    let h = harness();
    seed_single_round(&h, [Outcome(3), Outcome(3), Outcome(4)], Outcome(3));

    let first = h.court.settle(DISPUTE).await.unwrap();
    assert!(first.ruling_executed);
    assert_eq!(first.penalties_settled, vec![RoundId(0)]);
    assert_eq!(
        &h.ledger.calls()[..2],
        &[
            LedgerCall::ExecuteRuling { dispute: DISPUTE },
            LedgerCall::SettlePenalties {
                dispute: DISPUTE,
                round: RoundId(0),
                jurors_to_settle: 3,
            },
        ]
    );

    let second = h.court.settle(DISPUTE).await.unwrap();
    assert!(second.is_noop(), "second pass did work: {second:?}");
    assert_eq!(h.ledger.count("execute_ruling"), 1);
    assert_eq!(h.ledger.count("settle_penalties"), 1);
    assert_eq!(h.ledger.count("settle_reward"), 2);
}

#[tokio::test]
async fn settled_penalties_are_not_resubmitted() {
    let h = harness();
    seed_single_round(&h, [Outcome(3), Outcome(4), Outcome(4)], Outcome(3));
    let mut settled = round(AdjudicationState::Ended);
    settled.settled_penalties = true;
    h.ledger.insert_round(DISPUTE, RoundId(0), settled);

    let report = h.court.settle(DISPUTE).await.unwrap();

    assert!(report.penalties_settled.is_empty());
    assert_eq!(h.ledger.count("settle_penalties"), 0);
    assert_eq!(rewarded(&h.ledger), vec![juror(1)]);
}

#[tokio::test]
async fn confirmed_appeals_have_deposits_settled() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(1, Outcome(4)));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Ended));
    h.ledger
        .insert_round(DISPUTE, RoundId(1), round(AdjudicationState::Ended));
    h.ledger.insert_appeal(DISPUTE, RoundId(0), confirmed_appeal());

    let report = h.court.settle(DISPUTE).await.unwrap();

    assert!(!report.ruling_executed);
    assert_eq!(report.penalties_settled, vec![RoundId(0), RoundId(1)]);
    assert_eq!(report.appeal_deposits_settled, vec![RoundId(0)]);
    assert!(h.ledger.appeal_deposit_settled(DISPUTE, RoundId(0)));
    assert_eq!(h.ledger.count("settle_appeal_deposit"), 1);
}

#[tokio::test]
async fn already_settled_appeal_deposit_is_absorbed() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(1, Outcome(4)));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Ended));
    h.ledger
        .insert_round(DISPUTE, RoundId(1), round(AdjudicationState::Ended));
    h.ledger.insert_appeal(DISPUTE, RoundId(0), confirmed_appeal());
    h.ledger.fail_next(
        "settle_appeal_deposit",
        LedgerError::rejected(
            "settle_appeal_deposit",
            RejectionReason::AppealAlreadySettled,
        ),
    );

    let report = h.court.settle(DISPUTE).await.unwrap();

    assert!(report.appeal_deposits_settled.is_empty());
    assert_eq!(report.already_settled.len(), 1);
    assert_eq!(report.penalties_settled, vec![RoundId(0), RoundId(1)]);
}

#[tokio::test]
async fn other_appeal_deposit_failures_propagate() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(1, Outcome(4)));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Ended));
    h.ledger
        .insert_round(DISPUTE, RoundId(1), round(AdjudicationState::Ended));
    h.ledger.insert_appeal(DISPUTE, RoundId(0), confirmed_appeal());
    h.ledger.fail_next(
        "settle_appeal_deposit",
        LedgerError::Unavailable {
            operation: "court_settleAppealDeposit".into(),
            reason: "connection reset".into(),
        },
    );

    let err = h.court.settle(DISPUTE).await.unwrap_err();

    assert!(err.is_unavailable());
    // Round 1 is never reached.
    assert_eq!(h.ledger.count("settle_penalties"), 1);
}

#[tokio::test]
async fn unavailable_index_stops_the_pass() {
    let h = harness();
    seed_single_round(&h, [Outcome(3), Outcome(3), Outcome(3)], Outcome(3));
    h.index.set_unavailable(true);

    let err = h.court.settle(DISPUTE).await.unwrap_err();

    assert!(matches!(err, ArbitrationError::Index(_)));
    assert_eq!(h.ledger.count("settle_reward"), 0);
}

#[tokio::test]
async fn settle_round_twice_is_harmless() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(1, Outcome(3)));
    h.ledger
        .insert_round(DISPUTE, RoundId(0), round(AdjudicationState::Ended));
    h.ledger
        .insert_round(DISPUTE, RoundId(1), round(AdjudicationState::Ended));
    h.ledger.insert_appeal(DISPUTE, RoundId(0), confirmed_appeal());

    let first = h.court.settle_round(DISPUTE).await.unwrap();
    assert_eq!(first.penalties_settled, vec![RoundId(0), RoundId(1)]);
    assert_eq!(first.appeal_deposits_settled, vec![RoundId(0)]);

    let second = h.court.settle_round(DISPUTE).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(second.already_settled.len(), 3);
}

#[tokio::test]
async fn settle_juror_covers_every_drafted_round_once() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(1, Outcome(3)));
    for r in [RoundId(0), RoundId(1)] {
        let mut settled = round(AdjudicationState::Ended);
        settled.settled_penalties = true;
        h.ledger.insert_round(DISPUTE, r, settled);
        h.ledger.set_juror_weight(DISPUTE, r, juror(1), 1);
        h.ledger
            .set_voter_outcome(VoteId::new(DISPUTE, r), juror(1), Outcome(3));
    }

    let first = h.court.settle_juror(DISPUTE, juror(1)).await.unwrap();
    assert_eq!(first, vec![RoundId(0), RoundId(1)]);

    let second = h.court.settle_juror(DISPUTE, juror(1)).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(h.ledger.count("settle_reward"), 2);
}

#[tokio::test]
async fn settle_juror_skips_rounds_without_a_seat() {
    let h = harness();
    h.ledger.insert_dispute(DISPUTE, dispute(1, Outcome(3)));
    for r in [RoundId(0), RoundId(1)] {
        let mut settled = round(AdjudicationState::Ended);
        settled.settled_penalties = true;
        h.ledger.insert_round(DISPUTE, r, settled);
    }
    h.ledger.set_juror_weight(DISPUTE, RoundId(1), juror(2), 2);
    h.ledger.set_voter_outcome(
        VoteId::new(DISPUTE, RoundId(1)),
        juror(2),
        Outcome(3),
    );

    let settled = h.court.settle_juror(DISPUTE, juror(2)).await.unwrap();

    assert_eq!(settled, vec![RoundId(1)]);
}
