use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Transactional;
use std::path::Path;
use tallyx_core::claim::Claim;
use tallyx_core::error::TallyxError;
use tallyx_core::records::{Bounty, LedgerStats, ReputationRecord};
use tallyx_core::types::{Balance, BountyId, ClaimId, Commitment, SubmitterId};

const STATS_KEY: &[u8] = b"stats";
const OPEN_BOUNTIES_KEY: &[u8] = b"open_bounties";

/// Result type of closures run inside a ledger transaction.
pub type TxResult<T> = ConflictableTransactionResult<T, TallyxError>;

fn storage(e: sled::Error) -> TallyxError {
    TallyxError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TallyxError> {
    bincode::serialize(value).map_err(|e| TallyxError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TallyxError> {
    bincode::deserialize(bytes).map_err(|e| TallyxError::Serialization(e.to_string()))
}

fn abort(e: TallyxError) -> ConflictableTransactionError<TallyxError> {
    ConflictableTransactionError::Abort(e)
}

fn balance_from(bytes: &[u8]) -> Result<Balance, TallyxError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| TallyxError::Serialization(format!("balance is {} bytes", bytes.len())))?;
    Ok(u128::from_be_bytes(arr))
}

/// Persistent ledger database backed by sled.
///
/// Named trees:
///   claims       — ClaimId (u64 BE)  → bincode(Claim)
///   commitments  — Commitment bytes  → ClaimId (u64 BE); dedup marker
///   reputation   — SubmitterId bytes → bincode(ReputationRecord)
///   bounties     — BountyId (u64 BE) → bincode(Bounty)
///   balances     — SubmitterId bytes → u128 BE
///   meta         — utf8 key bytes    → raw bytes (stats, open-bounty queue)
pub struct StateDb {
    _db: sled::Db,
    claims: sled::Tree,
    commitments: sled::Tree,
    reputation: sled::Tree,
    bounties: sled::Tree,
    balances: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TallyxError> {
        let db = sled::open(path).map_err(storage)?;
        let claims      = db.open_tree("claims").map_err(storage)?;
        let commitments = db.open_tree("commitments").map_err(storage)?;
        let reputation  = db.open_tree("reputation").map_err(storage)?;
        let bounties    = db.open_tree("bounties").map_err(storage)?;
        let balances    = db.open_tree("balances").map_err(storage)?;
        let meta        = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, claims, commitments, reputation, bounties, balances, meta })
    }

    // ── Identifiers ──────────────────────────────────────────────────────────

    /// Next identifier from sled's monotonic counter (ids start at 1).
    pub fn next_id(&self) -> Result<u64, TallyxError> {
        Ok(self._db.generate_id().map_err(storage)? + 1)
    }

    // ── Commitment markers ───────────────────────────────────────────────────

    /// Atomically claim `commitment` for `claim_id`. Returns false if the
    /// commitment was already taken.
    pub fn reserve_commitment(
        &self,
        commitment: &Commitment,
        claim_id: ClaimId,
    ) -> Result<bool, TallyxError> {
        let swapped = self
            .commitments
            .compare_and_swap(
                commitment.as_bytes(),
                None as Option<&[u8]>,
                Some(&claim_id.to_be_bytes()[..]),
            )
            .map_err(storage)?;
        Ok(swapped.is_ok())
    }

    /// Undo a reservation made by `reserve_commitment`. A no-op if the marker
    /// no longer points at `claim_id`.
    pub fn release_commitment(
        &self,
        commitment: &Commitment,
        claim_id: ClaimId,
    ) -> Result<(), TallyxError> {
        let _ = self
            .commitments
            .compare_and_swap(
                commitment.as_bytes(),
                Some(&claim_id.to_be_bytes()[..]),
                None as Option<&[u8]>,
            )
            .map_err(storage)?;
        Ok(())
    }

    pub fn commitment_claim(&self, commitment: &Commitment) -> Result<Option<ClaimId>, TallyxError> {
        match self.commitments.get(commitment.as_bytes()).map_err(storage)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    TallyxError::Serialization("commitment marker is not a claim id".into())
                })?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // ── Claims ───────────────────────────────────────────────────────────────

    pub fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, TallyxError> {
        match self.claims.get(id.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Newest claims first.
    pub fn recent_claims(&self, limit: usize) -> Result<Vec<Claim>, TallyxError> {
        let mut out = Vec::with_capacity(limit.min(64));
        for item in self.claims.iter().rev().take(limit) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    // ── Reputation ───────────────────────────────────────────────────────────

    pub fn get_reputation(&self, id: &SubmitterId) -> Result<Option<ReputationRecord>, TallyxError> {
        match self.reputation.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Bounties ─────────────────────────────────────────────────────────────

    pub fn get_bounty(&self, id: BountyId) -> Result<Option<Bounty>, TallyxError> {
        match self.bounties.get(id.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Open bounty ids in funding order.
    pub fn open_bounties(&self) -> Result<Vec<BountyId>, TallyxError> {
        match self.meta.get(OPEN_BOUNTIES_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    // ── Balances ─────────────────────────────────────────────────────────────

    pub fn get_balance(&self, id: &SubmitterId) -> Result<Balance, TallyxError> {
        match self.balances.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => balance_from(&bytes),
            None => Ok(0),
        }
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn get_stats(&self) -> Result<LedgerStats, TallyxError> {
        match self.meta.get(STATS_KEY).map_err(storage)? {
            Some(bytes) => decode(&bytes),
            None => Ok(LedgerStats::default()),
        }
    }

    // ── Transactions ─────────────────────────────────────────────────────────

    /// Run `f` as one serializable transaction over every record tree except
    /// the commitment markers. sled may call `f` more than once on conflict,
    /// so it must not have side effects outside the transaction.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, TallyxError>
    where
        F: Fn(&LedgerTxn<'_>) -> TxResult<T>,
    {
        (&self.claims, &self.reputation, &self.bounties, &self.balances, &self.meta)
            .transaction(|(claims, reputation, bounties, balances, meta)| {
                f(&LedgerTxn { claims, reputation, bounties, balances, meta })
            })
            .map_err(|e| match e {
                TransactionError::Abort(inner) => inner,
                TransactionError::Storage(e) => storage(e),
            })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), TallyxError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }

    /// Overwrite a meta entry with arbitrary bytes.
    #[cfg(test)]
    pub(crate) fn put_meta_raw(&self, key: &[u8], value: &[u8]) {
        self.meta.insert(key, value).expect("meta insert");
    }
}

/// Typed view of the record trees inside a transaction.
pub struct LedgerTxn<'a> {
    claims: &'a TransactionalTree,
    reputation: &'a TransactionalTree,
    bounties: &'a TransactionalTree,
    balances: &'a TransactionalTree,
    meta: &'a TransactionalTree,
}

impl LedgerTxn<'_> {
    pub fn put_claim(&self, claim: &Claim) -> TxResult<()> {
        self.claims
            .insert(&claim.id.to_be_bytes()[..], encode(claim).map_err(abort)?)?;
        Ok(())
    }

    pub fn get_reputation(&self, id: &SubmitterId) -> TxResult<Option<ReputationRecord>> {
        match self.reputation.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes).map_err(abort)?)),
            None => Ok(None),
        }
    }

    pub fn put_reputation(&self, record: &ReputationRecord) -> TxResult<()> {
        self.reputation
            .insert(&record.submitter.as_bytes()[..], encode(record).map_err(abort)?)?;
        Ok(())
    }

    pub fn get_bounty(&self, id: BountyId) -> TxResult<Option<Bounty>> {
        match self.bounties.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes).map_err(abort)?)),
            None => Ok(None),
        }
    }

    pub fn put_bounty(&self, bounty: &Bounty) -> TxResult<()> {
        self.bounties
            .insert(&bounty.id.to_be_bytes()[..], encode(bounty).map_err(abort)?)?;
        Ok(())
    }

    pub fn open_bounties(&self) -> TxResult<Vec<BountyId>> {
        match self.meta.get(OPEN_BOUNTIES_KEY)? {
            Some(bytes) => Ok(decode(&bytes).map_err(abort)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn put_open_bounties(&self, ids: &[BountyId]) -> TxResult<()> {
        self.meta
            .insert(OPEN_BOUNTIES_KEY, encode(&ids.to_vec()).map_err(abort)?)?;
        Ok(())
    }

    pub fn get_balance(&self, id: &SubmitterId) -> TxResult<Balance> {
        match self.balances.get(id.as_bytes())? {
            Some(bytes) => Ok(balance_from(&bytes).map_err(abort)?),
            None => Ok(0),
        }
    }

    pub fn credit(&self, id: &SubmitterId, amount: Balance) -> TxResult<Balance> {
        let balance = self
            .get_balance(id)?
            .checked_add(amount)
            .ok_or_else(|| abort(TallyxError::Other("balance overflow".into())))?;
        self.balances
            .insert(&id.as_bytes()[..], &balance.to_be_bytes()[..])?;
        Ok(balance)
    }

    pub fn get_stats(&self) -> TxResult<LedgerStats> {
        match self.meta.get(STATS_KEY)? {
            Some(bytes) => Ok(decode(&bytes).map_err(abort)?),
            None => Ok(LedgerStats::default()),
        }
    }

    /// Read-modify-write of the stats record.
    pub fn update_stats(&self, f: impl FnOnce(&mut LedgerStats)) -> TxResult<()> {
        let mut stats = self.get_stats()?;
        f(&mut stats);
        self.meta.insert(STATS_KEY, encode(&stats).map_err(abort)?)?;
        Ok(())
    }
}

/// Map a lifecycle or validation error raised inside a transaction.
pub fn tx_abort(e: TallyxError) -> ConflictableTransactionError<TallyxError> {
    abort(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("tallyx_db_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn commitment_reserved_once() {
        let db = temp_db("reserve_once");
        let c = Commitment::from_bytes([9u8; 32]);
        assert!(db.reserve_commitment(&c, 1).unwrap());
        assert!(!db.reserve_commitment(&c, 2).unwrap());
        assert_eq!(db.commitment_claim(&c).unwrap(), Some(1));
    }

    #[test]
    fn release_only_own_reservation() {
        let db = temp_db("release_own");
        let c = Commitment::from_bytes([3u8; 32]);
        assert!(db.reserve_commitment(&c, 5).unwrap());
        db.release_commitment(&c, 6).unwrap();
        assert_eq!(db.commitment_claim(&c).unwrap(), Some(5));
        db.release_commitment(&c, 5).unwrap();
        assert_eq!(db.commitment_claim(&c).unwrap(), None);
        assert!(db.reserve_commitment(&c, 7).unwrap());
    }

    #[test]
    fn ids_are_increasing() {
        let db = temp_db("ids");
        let a = db.next_id().unwrap();
        let b = db.next_id().unwrap();
        assert!(a >= 1);
        assert!(b > a);
    }

    #[test]
    fn aborted_transaction_leaves_no_trace() {
        let db = temp_db("abort");
        let who = SubmitterId::from_bytes([1u8; 32]);
        let res: Result<(), TallyxError> = db.transaction(|txn| {
            txn.credit(&who, 500)?;
            txn.update_stats(|s| s.claims_verified += 1)?;
            Err(tx_abort(TallyxError::ZeroAmount))
        });
        assert!(matches!(res, Err(TallyxError::ZeroAmount)));
        assert_eq!(db.get_balance(&who).unwrap(), 0);
        assert_eq!(db.get_stats().unwrap(), LedgerStats::default());
    }

    #[test]
    fn committed_transaction_is_visible() {
        let db = temp_db("commit");
        let who = SubmitterId::from_bytes([2u8; 32]);
        let total = db
            .transaction(|txn| {
                txn.credit(&who, 40)?;
                txn.credit(&who, 2)
            })
            .unwrap();
        assert_eq!(total, 42);
        assert_eq!(db.get_balance(&who).unwrap(), 42);
    }
}
