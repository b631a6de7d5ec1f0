use std::sync::Arc;

use tallyx_core::constants::MAX_BOUNTY_TARGET_LEN;
use tallyx_core::error::TallyxError;
use tallyx_core::event::LedgerEvent;
use tallyx_core::records::Bounty;
use tallyx_core::types::{Balance, BountyId, ClaimId, SubmitterId, Timestamp};
use tracing::info;

use crate::db::{tx_abort, LedgerTxn, StateDb, TxResult};
use crate::events::EventBus;

/// Escrowed rewards paid to the first verified claim.
///
/// Open bounties form a queue in funding order. Awards always take the head
/// of the queue; the bounty's `target_id` is informational and not matched
/// against the claim.
pub struct BountyMarket {
    db: Arc<StateDb>,
    events: EventBus,
}

impl BountyMarket {
    pub fn new(db: Arc<StateDb>, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Create an active bounty holding `escrowed` units, of which `reward`
    /// is paid out on award.
    pub fn fund(
        &self,
        funder: &SubmitterId,
        target_id: &str,
        reward: Balance,
        escrowed: Balance,
        now: Timestamp,
    ) -> Result<BountyId, TallyxError> {
        let target_id = target_id.trim();
        if target_id.is_empty() || target_id.len() > MAX_BOUNTY_TARGET_LEN {
            return Err(TallyxError::InvalidBountyTarget {
                max: MAX_BOUNTY_TARGET_LEN,
            });
        }
        if reward == 0 {
            return Err(TallyxError::ZeroAmount);
        }
        if escrowed < reward {
            return Err(TallyxError::InsufficientFunds { reward, escrowed });
        }

        let bounty = Bounty {
            id: self.db.next_id()?,
            target_id: target_id.to_string(),
            reward,
            escrowed,
            funder: funder.clone(),
            active: true,
            claimed: false,
            winner: None,
            funded_at: now,
            awarded_at: None,
        };

        self.db.transaction(|txn| {
            txn.put_bounty(&bounty)?;
            let mut open = txn.open_bounties()?;
            open.push(bounty.id);
            txn.put_open_bounties(&open)?;
            txn.update_stats(|s| s.bounties_funded += 1)
        })?;

        info!(bounty_id = bounty.id, target = %bounty.target_id, reward, "bounty funded");
        self.events.emit(LedgerEvent::BountyFunded {
            bounty_id: bounty.id,
            funder: funder.clone(),
            target_id: bounty.target_id.clone(),
            reward,
        });
        Ok(bounty.id)
    }

    /// Award the oldest open bounty to `winner`, inside the caller's
    /// transaction. Returns the awarded bounty, or `None` if nothing is open.
    ///
    /// The bounty flips to claimed, `reward` leaves escrow and is credited
    /// to the winner's balance, all in the same transaction.
    pub fn try_award(
        txn: &LedgerTxn<'_>,
        winner: &SubmitterId,
        now: Timestamp,
    ) -> TxResult<Option<Bounty>> {
        let mut open = txn.open_bounties()?;
        let mut awarded = None;

        while !open.is_empty() {
            let id = open.remove(0);
            let Some(mut bounty) = txn.get_bounty(id)? else {
                continue;
            };
            if !bounty.is_open() {
                continue;
            }
            bounty.escrowed = bounty
                .escrowed
                .checked_sub(bounty.reward)
                .ok_or_else(|| {
                    tx_abort(TallyxError::InsufficientFunds {
                        reward: bounty.reward,
                        escrowed: bounty.escrowed,
                    })
                })?;
            bounty.active = false;
            bounty.claimed = true;
            bounty.winner = Some(winner.clone());
            bounty.awarded_at = Some(now);
            txn.put_bounty(&bounty)?;
            txn.credit(winner, bounty.reward)?;
            txn.update_stats(|s| s.bounties_claimed += 1)?;
            awarded = Some(bounty);
            break;
        }

        txn.put_open_bounties(&open)?;
        Ok(awarded)
    }

    /// Event describing an award made by `try_award`.
    pub fn awarded_event(bounty: &Bounty, claim_id: ClaimId) -> Option<LedgerEvent> {
        Some(LedgerEvent::BountyAwarded {
            bounty_id: bounty.id,
            claim_id,
            winner: bounty.winner.clone()?,
            reward: bounty.reward,
        })
    }

    /// Currently open bounties, oldest first.
    pub fn active(&self) -> Result<Vec<Bounty>, TallyxError> {
        let mut out = Vec::new();
        for id in self.db.open_bounties()? {
            if let Some(b) = self.db.get_bounty(id)? {
                if b.is_open() {
                    out.push(b);
                }
            }
        }
        Ok(out)
    }
}
