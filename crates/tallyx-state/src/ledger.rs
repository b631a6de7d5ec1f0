use std::sync::Arc;

use tallyx_core::claim::{check_threshold, Claim, ClaimType, LifecycleStatus};
use tallyx_core::constants::MAX_LIST_LIMIT;
use tallyx_core::error::TallyxError;
use tallyx_core::event::LedgerEvent;
use tallyx_core::records::{Bounty, LedgerStats, ReputationRecord};
use tallyx_core::types::{Balance, BountyId, ClaimId, Commitment, SubmitterId, Timestamp};
use tallyx_zk::envelope::ProofEnvelope;
use tallyx_zk::verifier::{ProofVerifier, VerifierInfo};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::bounty::BountyMarket;
use crate::db::{tx_abort, StateDb};
use crate::events::EventBus;
use crate::reputation::ReputationEngine;

// ── ClaimLedger ──────────────────────────────────────────────────────────────

/// The claim ledger.
///
/// Owns every claim, reputation record, bounty and balance. Each `submit`
/// is atomic: it either leaves no trace, persists a Rejected claim with its
/// reputation penalty, or persists a Finalized claim together with its
/// reputation credit and bounty award. Events are published only after the
/// corresponding commit.
pub struct ClaimLedger {
    pub db: Arc<StateDb>,
    verifier: ProofVerifier,
    bounties: BountyMarket,
    events: EventBus,
}

impl ClaimLedger {
    pub fn new(db: Arc<StateDb>, verifier: ProofVerifier) -> Self {
        let events = EventBus::new();
        Self {
            bounties: BountyMarket::new(db.clone(), events.clone()),
            db,
            verifier,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Record a threshold claim about the document behind `commitment`.
    pub fn submit(
        &self,
        submitter: &SubmitterId,
        commitment: &Commitment,
        claim_type: ClaimType,
        threshold: u32,
        proof: &[u8],
        now: Timestamp,
    ) -> Result<ClaimId, TallyxError> {
        // ── Argument validation ──────────────────────────────────────────────
        let threshold = check_threshold(threshold)?;

        // ── Structural check: malformed bytes leave no state behind ─────────
        let envelope = ProofEnvelope::decode(proof).map_err(|e| {
            debug!(commitment = %commitment, error = %e, "malformed proof");
            e
        })?;

        // ── Dedup: one claim per commitment, ever ────────────────────────────
        let claim_id = self.db.next_id()?;
        if !self.db.reserve_commitment(commitment, claim_id)? {
            warn!(commitment = %commitment, "duplicate commitment rejected");
            return Err(TallyxError::DuplicateCommitment(commitment.to_hex()));
        }

        let claim = Claim::new(
            claim_id,
            *commitment,
            claim_type,
            threshold,
            submitter.clone(),
            proof.to_vec(),
            now,
        );

        // ── Verification (pure, no lock held) ────────────────────────────────
        match self.verifier.verify_envelope(&envelope, commitment, threshold) {
            Ok(()) => self.commit_success(claim, now),
            Err(e) if e.is_rejection() => self.commit_rejection(claim, e, now),
            Err(e) => {
                self.db.release_commitment(commitment, claim_id)?;
                Err(e)
            }
        }
    }

    fn commit_success(&self, claim: Claim, now: Timestamp) -> Result<ClaimId, TallyxError> {
        let submitter = claim.submitter.clone();
        let result = self.db.transaction(|txn| {
            let mut c = claim.clone();
            c.status = c.status.verify().map_err(tx_abort)?;
            c.status = c.status.finalize().map_err(tx_abort)?;
            txn.put_claim(&c)?;
            let rep = ReputationEngine::record_success(txn, &c.submitter, now)?;
            let award = BountyMarket::try_award(txn, &c.submitter, now)?;
            txn.update_stats(|s| s.claims_verified += 1)?;
            Ok((rep, award))
        });

        let (rep, award) = match result {
            Ok(v) => v,
            Err(e) => {
                self.db.release_commitment(&claim.commitment, claim.id)?;
                return Err(e);
            }
        };

        info!(
            claim_id = claim.id,
            submitter = %submitter,
            threshold = claim.threshold,
            claim_type = %claim.claim_type,
            score = rep.score,
            bounty = award.as_ref().map(|b| b.id),
            "claim finalized"
        );

        let mut events = vec![
            LedgerEvent::StatusChanged {
                claim_id: claim.id,
                from: LifecycleStatus::Submitted,
                to: LifecycleStatus::Verified,
            },
            LedgerEvent::ClaimVerified {
                claim_id: claim.id,
                submitter: submitter.clone(),
                commitment: claim.commitment,
                threshold: claim.threshold,
            },
            reputation_event(&rep),
        ];
        if let Some(event) = award
            .as_ref()
            .and_then(|b| BountyMarket::awarded_event(b, claim.id))
        {
            events.push(event);
        }
        events.push(LedgerEvent::StatusChanged {
            claim_id: claim.id,
            from: LifecycleStatus::Verified,
            to: LifecycleStatus::Finalized,
        });
        self.events.emit_all(events);

        Ok(claim.id)
    }

    /// Persist the claim as Rejected with its reputation penalty, then hand
    /// the verification error back to the caller.
    fn commit_rejection(
        &self,
        claim: Claim,
        reason: TallyxError,
        now: Timestamp,
    ) -> Result<ClaimId, TallyxError> {
        let result = self.db.transaction(|txn| {
            let mut c = claim.clone();
            c.status = c.status.reject().map_err(tx_abort)?;
            txn.put_claim(&c)?;
            let rep = ReputationEngine::record_failure(txn, &c.submitter, now)?;
            txn.update_stats(|s| s.claims_rejected += 1)?;
            Ok(rep)
        });

        // Nothing was recorded, so the commitment stays claimable.
        let rep = match result {
            Ok(rep) => rep,
            Err(e) => {
                self.db.release_commitment(&claim.commitment, claim.id)?;
                return Err(e);
            }
        };

        warn!(
            claim_id = claim.id,
            submitter = %claim.submitter,
            reason = reason.kind(),
            score = rep.score,
            "claim rejected"
        );

        self.events.emit_all([
            LedgerEvent::StatusChanged {
                claim_id: claim.id,
                from: LifecycleStatus::Submitted,
                to: LifecycleStatus::Rejected,
            },
            LedgerEvent::ClaimRejected {
                claim_id: claim.id,
                submitter: claim.submitter.clone(),
                reason: reason.kind().to_string(),
            },
            reputation_event(&rep),
        ]);

        Err(reason)
    }

    // ── Bounties ─────────────────────────────────────────────────────────────

    pub fn fund_bounty(
        &self,
        funder: &SubmitterId,
        target_id: &str,
        reward: Balance,
        escrowed: Balance,
        now: Timestamp,
    ) -> Result<BountyId, TallyxError> {
        self.bounties.fund(funder, target_id, reward, escrowed, now)
    }

    pub fn active_bounties(&self) -> Result<Vec<Bounty>, TallyxError> {
        self.bounties.active()
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, TallyxError> {
        self.db.get_claim(id)
    }

    pub fn get_status(&self, id: ClaimId) -> Result<Option<LifecycleStatus>, TallyxError> {
        Ok(self.db.get_claim(id)?.map(|c| c.status))
    }

    pub fn get_reputation(&self, id: &SubmitterId) -> Result<Option<ReputationRecord>, TallyxError> {
        self.db.get_reputation(id)
    }

    pub fn get_bounty(&self, id: BountyId) -> Result<Option<Bounty>, TallyxError> {
        self.db.get_bounty(id)
    }

    pub fn get_balance(&self, id: &SubmitterId) -> Result<Balance, TallyxError> {
        self.db.get_balance(id)
    }

    /// Newest first, at most `MAX_LIST_LIMIT`.
    pub fn recent_claims(&self, limit: u32) -> Result<Vec<Claim>, TallyxError> {
        self.db.recent_claims(limit.min(MAX_LIST_LIMIT) as usize)
    }

    pub fn stats(&self) -> Result<LedgerStats, TallyxError> {
        self.db.get_stats()
    }

    pub fn verifier_info(&self) -> VerifierInfo {
        self.verifier.info()
    }
}

fn reputation_event(rec: &ReputationRecord) -> LedgerEvent {
    LedgerEvent::ReputationUpdated {
        submitter: rec.submitter.clone(),
        score: rec.score,
        correct_count: rec.correct_count,
        total_count: rec.total_count,
    }
}
