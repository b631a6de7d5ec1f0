use serde::{Deserialize, Serialize};

use crate::constants::REPUTATION_FLOOR;
use crate::types::{Balance, BountyId, SubmitterId, Timestamp};

// ── ReputationRecord ─────────────────────────────────────────────────────────

/// Per-submitter track record stored in the `reputation` sled tree.
/// Created lazily on first claim; never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub submitter: SubmitterId,
    pub correct_count: u64,
    pub total_count: u64,
    /// Always within [REPUTATION_FLOOR, REPUTATION_CEILING].
    pub score: u32,
    pub last_activity_at: Timestamp,
}

impl ReputationRecord {
    pub fn new(submitter: SubmitterId, now: Timestamp) -> Self {
        Self {
            submitter,
            correct_count: 0,
            total_count: 0,
            score: REPUTATION_FLOOR,
            last_activity_at: now,
        }
    }
}

// ── Bounty ───────────────────────────────────────────────────────────────────

/// An escrowed reward for the first verified claim.
///
/// `active`/`claimed` flip exactly once, together, when the bounty is awarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: BountyId,
    /// Free-form target identifier, e.g. a ticker or CIK. Informational only.
    pub target_id: String,
    pub reward: Balance,
    /// Funds held for this bounty. `reward` leaves escrow on award.
    pub escrowed: Balance,
    pub funder: SubmitterId,
    pub active: bool,
    pub claimed: bool,
    pub winner: Option<SubmitterId>,
    pub funded_at: Timestamp,
    pub awarded_at: Option<Timestamp>,
}

impl Bounty {
    pub fn is_open(&self) -> bool {
        self.active && !self.claimed
    }
}

// ── LedgerStats ──────────────────────────────────────────────────────────────

/// Running counters kept under the `meta` tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub claims_verified: u64,
    pub claims_rejected: u64,
    /// Distinct submitters with a reputation record.
    pub submitters: u64,
    pub bounties_funded: u64,
    pub bounties_claimed: u64,
}
