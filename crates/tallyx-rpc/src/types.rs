use serde::{Deserialize, Serialize};
use tallyx_core::claim::Claim;
use tallyx_core::constants::UNITS_PER_TOKEN;
use tallyx_core::records::{Bounty, LedgerStats, ReputationRecord};

/// Format base units as a decimal token amount, e.g. 1_500_000 → "1.5".
pub fn format_tokens(units: u128) -> String {
    let whole = units / UNITS_PER_TOKEN;
    let frac = units % UNITS_PER_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// JSON-serializable claim returned by `tallyx_getClaim`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcClaim {
    pub claim_id: u64,
    pub commitment: String,
    pub claim_type: String,
    pub claim_type_code: u8,
    pub threshold: u8,
    pub submitter: String,
    pub created_at: i64,
    pub status: String,
    /// Size of the stored proof envelope.
    pub proof_bytes: usize,
}

impl From<&Claim> for RpcClaim {
    fn from(c: &Claim) -> Self {
        Self {
            claim_id: c.id,
            commitment: c.commitment.to_hex(),
            claim_type: c.claim_type.as_str().to_string(),
            claim_type_code: c.claim_type.as_u8(),
            threshold: c.threshold,
            submitter: c.submitter.to_b58(),
            created_at: c.created_at,
            status: c.status.as_str().to_string(),
            proof_bytes: c.proof.len(),
        }
    }
}

/// Lifecycle status with its human-readable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcClaimStatus {
    pub claim_id: u64,
    pub status: String,
    pub description: String,
    pub terminal: bool,
    /// One-line summary of the whole claim.
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReputation {
    pub submitter: String,
    pub correct_count: u64,
    pub total_count: u64,
    pub score: u32,
    pub last_activity_at: i64,
}

impl From<&ReputationRecord> for RpcReputation {
    fn from(r: &ReputationRecord) -> Self {
        Self {
            submitter: r.submitter.to_b58(),
            correct_count: r.correct_count,
            total_count: r.total_count,
            score: r.score,
            last_activity_at: r.last_activity_at,
        }
    }
}

/// Amounts are u128 base units as strings, plus a token-denominated form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcBounty {
    pub bounty_id: u64,
    pub target_id: String,
    pub reward_units: String,
    pub reward_tlx: String,
    pub escrowed_units: String,
    pub funder: String,
    pub active: bool,
    pub claimed: bool,
    pub winner: Option<String>,
    pub funded_at: i64,
    pub awarded_at: Option<i64>,
    /// One-line summary; only filled by `tallyx_getBounty`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<&Bounty> for RpcBounty {
    fn from(b: &Bounty) -> Self {
        Self {
            bounty_id: b.id,
            target_id: b.target_id.clone(),
            reward_units: b.reward.to_string(),
            reward_tlx: format_tokens(b.reward),
            escrowed_units: b.escrowed.to_string(),
            funder: b.funder.to_b58(),
            active: b.active,
            claimed: b.claimed,
            winner: b.winner.as_ref().map(|w| w.to_b58()),
            funded_at: b.funded_at,
            awarded_at: b.awarded_at,
            summary: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStats {
    pub claims_verified: u64,
    pub claims_rejected: u64,
    pub submitters: u64,
    pub bounties_funded: u64,
    pub bounties_claimed: u64,
}

impl From<LedgerStats> for RpcStats {
    fn from(s: LedgerStats) -> Self {
        Self {
            claims_verified: s.claims_verified,
            claims_rejected: s.claims_rejected,
            submitters: s.submitters,
            bounties_funded: s.bounties_funded,
            bounties_claimed: s.bounties_claimed,
        }
    }
}

/// Proof-system parameters returned by `tallyx_getVerifierInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcVerifierInfo {
    pub node_version: String,
    pub protocol: String,
    pub curve: String,
    pub field_modulus: String,
    pub vk_digest: String,
    pub public_signals: usize,
    pub min_proof_bytes: usize,
    pub max_proof_bytes: usize,
    pub min_threshold: u32,
    pub max_threshold: u32,
}
