//! # Ledger Data Model
//!
//! Snapshots of the court state owned by the external ledger: disputes,
//! adjudication rounds, appeals, per-round juror drafts, and the receipts
//! returned for submitted transactions.
//!
//! Nothing here is authoritative. Every value is re-read from the ledger
//! before it is acted upon; these types only give the reads a shape.
//!
//! ## Round Lifecycle
//!
//! ```text
//! Invalid (pending draft) ──draft──▶ Committing ──▶ Revealing ──▶ Appealing
//!                                                                   │
//!                                           ConfirmingAppeal ◀──────┤
//!                                                  │                │
//!                                                  ▼                ▼
//!                                        (new round appended)     Ended
//! ```

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{DisputeId, Outcome, RoundId, TermId};

// ── Contract handles ───────────────────────────────────────────────────

/// The court contracts a gateway resolves addresses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CourtModule {
    /// Dispute manager: disputes, rounds, appeals, settlements.
    DisputeManager,
    /// Commit/reveal voting.
    Voting,
    /// Juror stake registry.
    JurorsRegistry,
    /// Subscription fee collection.
    Subscriptions,
    /// Token jurors stake in the registry.
    JurorsToken,
    /// Token used for fees and appeal deposits.
    FeeToken,
}

impl CourtModule {
    /// The wire name of this module.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisputeManager => "disputeManager",
            Self::Voting => "voting",
            Self::JurorsRegistry => "jurorsRegistry",
            Self::Subscriptions => "subscriptions",
            Self::JurorsToken => "jurorsToken",
            Self::FeeToken => "feeToken",
        }
    }
}

impl fmt::Display for CourtModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourtModule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disputeManager" => Ok(Self::DisputeManager),
            "voting" => Ok(Self::Voting),
            "jurorsRegistry" => Ok(Self::JurorsRegistry),
            "subscriptions" => Ok(Self::Subscriptions),
            "jurorsToken" => Ok(Self::JurorsToken),
            "feeToken" => Ok(Self::FeeToken),
            other => Err(ValidationError::UnknownModule(other.to_string())),
        }
    }
}

// ── Disputes ───────────────────────────────────────────────────────────

/// Dispute-level state as reported by the dispute manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisputeState {
    /// Created, first round not drafted yet.
    PreDraft,
    /// At least one round drafted; voting or appeals in progress.
    Adjudicating,
    /// Final ruling executed.
    Ruled,
}

/// A dispute snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    /// The arbitrable contract that raised the dispute.
    pub subject: Address,
    /// Number of rulings the subject accepts.
    pub possible_rulings: u8,
    /// Dispute-level state.
    pub state: DisputeState,
    /// Final ruling; [`Outcome::MISSING`] until executed.
    pub final_ruling: Outcome,
    /// Index of the latest round.
    pub last_round_id: RoundId,
    /// Term in which the dispute was created.
    #[serde(default)]
    pub create_term_id: TermId,
}

impl Dispute {
    /// Whether the final ruling has been executed.
    pub fn is_ruled(&self) -> bool {
        !self.final_ruling.is_missing()
    }

    /// Every round of this dispute, first to last.
    pub fn rounds(&self) -> impl Iterator<Item = RoundId> {
        RoundId::up_to(self.last_round_id)
    }
}

// ── Rounds ─────────────────────────────────────────────────────────────

/// Adjudication state of a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjudicationState {
    /// Round exists but jurors have not been drafted.
    Invalid,
    /// Drafted jurors are committing sealed votes.
    Committing,
    /// Jurors are revealing their votes.
    Revealing,
    /// The round's result may be appealed.
    Appealing,
    /// An appeal was made and may be confirmed.
    ConfirmingAppeal,
    /// No further action possible on this round.
    Ended,
}

impl AdjudicationState {
    /// Whether voting (commit or reveal) is open.
    pub fn is_voting(&self) -> bool {
        matches!(self, Self::Committing | Self::Revealing)
    }

    /// Whether the round is inside its appeal window.
    pub fn is_appeal_window(&self) -> bool {
        matches!(self, Self::Appealing | Self::ConfirmingAppeal)
    }
}

/// A round snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Term at which drafting becomes possible.
    pub draft_term: TermId,
    /// Terms the round was delayed because drafting happened late.
    #[serde(default)]
    pub delayed_terms: u64,
    /// Number of juror seats in the round.
    pub jurors_number: u64,
    /// Seats already filled by drafting.
    #[serde(default)]
    pub selected_jurors: u64,
    /// Fees distributed to coherent jurors.
    #[serde(default)]
    pub juror_fees: U256,
    /// Whether penalties for this round have been settled.
    pub settled_penalties: bool,
    /// Tokens collected from incoherent jurors.
    #[serde(default)]
    pub collected_tokens: U256,
    /// Weight of jurors that voted for the final ruling.
    #[serde(default)]
    pub coherent_jurors: u64,
    /// Adjudication state.
    pub state: AdjudicationState,
}

/// The appeal attached to a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appeal {
    /// Account that appealed; zero if none.
    pub maker: Address,
    /// Ruling the maker appealed in favour of.
    pub appealed_ruling: Outcome,
    /// Account that confirmed the appeal; zero if none.
    pub taker: Address,
    /// Ruling the taker confirmed in favour of.
    pub opposed_ruling: Outcome,
}

impl Appeal {
    /// Whether the appeal was confirmed (a taker exists), which is the
    /// condition for its deposits to need settling.
    pub fn is_confirmed(&self) -> bool {
        self.taker != Address::ZERO
    }
}

/// Cost and shape of the round an appeal would create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRoundDetails {
    /// Term at which the next round starts.
    pub next_round_start_term: TermId,
    /// Juror seats in the next round.
    pub jurors_number: u64,
    /// Dispute state once the next round exists.
    pub new_dispute_state: DisputeState,
    /// Token deposits are paid in.
    pub fee_token: Address,
    /// Total fees of the next round.
    pub total_fees: U256,
    /// Share of fees for jurors.
    pub juror_fees: U256,
    /// Deposit required to appeal.
    pub appeal_deposit: U256,
    /// Deposit required to confirm an appeal.
    pub confirm_appeal_deposit: U256,
}

/// A juror's participation in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JurorDraft {
    /// Times the juror was drafted into the round. Zero if not drafted.
    pub weight: u64,
    /// Whether the juror's reward has been settled.
    pub rewarded: bool,
}

impl JurorDraft {
    /// Whether the juror sits in the round and can be rewarded.
    pub fn is_drafted(&self) -> bool {
        self.weight > 0
    }
}

/// Subscription fee quote for an arbitrable subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFees {
    /// Account the fees are paid to.
    pub recipient: Address,
    /// Token the fees are paid in.
    pub fee_token: Address,
    /// Amount currently due, in base units.
    pub fee_amount: U256,
}

// ── Receipts ───────────────────────────────────────────────────────────

/// A decoded event log attached to a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    /// A dispute was created.
    #[serde(rename_all = "camelCase")]
    NewDispute {
        /// Assigned dispute identifier.
        dispute_id: DisputeId,
        /// The arbitrable subject.
        subject: Address,
    },
    /// A juror was drafted into a round. Emitted once per draw, so a juror
    /// drawn twice appears twice.
    #[serde(rename_all = "camelCase")]
    JurorDrafted {
        /// Dispute drafted for.
        dispute_id: DisputeId,
        /// Round drafted for.
        round_id: RoundId,
        /// Drafted juror.
        juror: Address,
    },
    /// The subject closed its evidence submission period.
    #[serde(rename_all = "camelCase")]
    EvidencePeriodClosed {
        /// Dispute whose evidence period closed.
        dispute_id: DisputeId,
        /// Term in which it closed.
        term_id: TermId,
    },
    /// The ledger moved from one term to the next.
    #[serde(rename_all = "camelCase")]
    Heartbeat {
        /// Term before the transition.
        previous_term_id: TermId,
        /// Term after the transition.
        current_term_id: TermId,
    },
    /// Any event this stack does not interpret.
    #[serde(other)]
    Unknown,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Hash of the accepted transaction.
    pub transaction_hash: B256,
    /// Decoded logs in emission order.
    #[serde(default)]
    pub logs: Vec<LedgerEvent>,
}

impl Receipt {
    /// A receipt with no logs.
    pub fn empty(transaction_hash: B256) -> Self {
        Self {
            transaction_hash,
            logs: Vec::new(),
        }
    }

    /// The dispute id carried by the first `NewDispute` log.
    pub fn new_dispute_id(&self) -> Option<DisputeId> {
        self.logs.iter().find_map(|log| match log {
            LedgerEvent::NewDispute { dispute_id, .. } => Some(*dispute_id),
            _ => None,
        })
    }

    /// Drafted jurors in emission order, duplicates preserved.
    pub fn drafted_jurors(&self) -> Vec<Address> {
        self.logs
            .iter()
            .filter_map(|log| match log {
                LedgerEvent::JurorDrafted { juror, .. } => Some(*juror),
                _ => None,
            })
            .collect()
    }

    /// Total term transitions reported by `Heartbeat` logs, or `None` if the
    /// receipt carries none.
    pub fn heartbeat_transitions(&self) -> Option<u64> {
        let mut seen = false;
        let total: u64 = self
            .logs
            .iter()
            .filter_map(|log| match log {
                LedgerEvent::Heartbeat {
                    previous_term_id,
                    current_term_id,
                } => {
                    seen = true;
                    Some(previous_term_id.transitions_until(*current_term_id))
                }
                _ => None,
            })
            .sum();
        seen.then_some(total)
    }
}
