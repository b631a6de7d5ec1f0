use tallyx_core::claim::LifecycleStatus;
use tallyx_core::error::TallyxError;
use tallyx_core::types::{BountyId, ClaimId};

use crate::db::StateDb;

/// Human-oriented views over stored claims and bounties.
pub struct ClaimQuery<'a> {
    db: &'a StateDb,
}

impl<'a> ClaimQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn status(&self, id: ClaimId) -> Result<LifecycleStatus, TallyxError> {
        self.db
            .get_claim(id)?
            .map(|c| c.status)
            .ok_or(TallyxError::ClaimNotFound(id))
    }

    /// One-line summary of a claim.
    pub fn describe(&self, id: ClaimId) -> Result<String, TallyxError> {
        let c = self.db.get_claim(id)?.ok_or(TallyxError::ClaimNotFound(id))?;
        Ok(format!(
            "Claim #{} | {} >= {}% | commitment {}… | submitter {} | {}",
            c.id,
            c.claim_type,
            c.threshold,
            &c.commitment.to_hex()[..16],
            c.submitter,
            c.status.describe(),
        ))
    }

    pub fn describe_bounty(&self, id: BountyId) -> Result<String, TallyxError> {
        let b = self.db.get_bounty(id)?.ok_or(TallyxError::BountyNotFound(id))?;
        let state = match (&b.winner, b.awarded_at) {
            (Some(w), Some(at)) => format!("awarded to {} at {}", w, at),
            _ if b.is_open() => "open".to_string(),
            _ => "closed".to_string(),
        };
        Ok(format!(
            "Bounty #{} | target {} | reward {} | escrow {} | {}",
            b.id, b.target_id, b.reward, b.escrowed, state
        ))
    }
}
