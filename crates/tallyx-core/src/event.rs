use serde::{Deserialize, Serialize};
use std::fmt;

use crate::claim::LifecycleStatus;
use crate::types::{Balance, BountyId, ClaimId, Commitment, SubmitterId};

/// Notifications emitted by the ledger after a state change has committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    StatusChanged {
        claim_id: ClaimId,
        from: LifecycleStatus,
        to: LifecycleStatus,
    },
    ClaimVerified {
        claim_id: ClaimId,
        submitter: SubmitterId,
        commitment: Commitment,
        threshold: u8,
    },
    ClaimRejected {
        claim_id: ClaimId,
        submitter: SubmitterId,
        /// `TallyxError::kind()` of the verification failure.
        reason: String,
    },
    ReputationUpdated {
        submitter: SubmitterId,
        score: u32,
        correct_count: u64,
        total_count: u64,
    },
    BountyFunded {
        bounty_id: BountyId,
        funder: SubmitterId,
        target_id: String,
        reward: Balance,
    },
    BountyAwarded {
        bounty_id: BountyId,
        claim_id: ClaimId,
        winner: SubmitterId,
        reward: Balance,
    },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::StatusChanged { claim_id, from, to } => {
                write!(f, "claim #{claim_id}: {from} -> {to}")
            }
            LedgerEvent::ClaimVerified { claim_id, submitter, threshold, .. } => {
                write!(f, "claim #{claim_id} verified (threshold {threshold}%, submitter {submitter})")
            }
            LedgerEvent::ClaimRejected { claim_id, reason, .. } => {
                write!(f, "claim #{claim_id} rejected: {reason}")
            }
            LedgerEvent::ReputationUpdated { submitter, score, correct_count, total_count } => {
                write!(f, "reputation {submitter}: {score} ({correct_count}/{total_count})")
            }
            LedgerEvent::BountyFunded { bounty_id, target_id, reward, .. } => {
                write!(f, "bounty #{bounty_id} funded for {target_id}: {reward} units")
            }
            LedgerEvent::BountyAwarded { bounty_id, claim_id, winner, reward } => {
                write!(f, "bounty #{bounty_id} awarded to {winner} for claim #{claim_id}: {reward} units")
            }
        }
    }
}
