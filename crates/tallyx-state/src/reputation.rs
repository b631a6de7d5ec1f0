use tallyx_core::constants::{
    ACCURACY_SCALE, ACCURACY_WEIGHT_TENTHS, REPUTATION_CEILING, REPUTATION_FLOOR,
    VOLUME_BONUS_CAP_CLAIMS, VOLUME_BONUS_PER_CLAIM, VOLUME_WEIGHT_TENTHS,
};
use tallyx_core::records::ReputationRecord;
use tallyx_core::types::{SubmitterId, Timestamp};

use crate::db::{LedgerTxn, TxResult};

/// Per-submitter accuracy scoring.
///
/// The score is always recomputed from the counters, never adjusted
/// incrementally, so it cannot drift outside its bounds.
pub struct ReputationEngine;

impl ReputationEngine {
    /// score = round(0.8 · accuracy + 0.2 · volume_bonus), clamped to
    /// [REPUTATION_FLOOR, REPUTATION_CEILING].
    ///
    /// accuracy is per-mille correct; volume_bonus grows 10 points per
    /// claim up to 100.
    pub fn score(correct_count: u64, total_count: u64) -> u32 {
        if total_count == 0 {
            return REPUTATION_FLOOR;
        }
        let correct = correct_count.min(total_count);
        let accuracy = correct * ACCURACY_SCALE / total_count;
        let volume_bonus = total_count.min(VOLUME_BONUS_CAP_CLAIMS) * VOLUME_BONUS_PER_CLAIM;
        let raw = (ACCURACY_WEIGHT_TENTHS * accuracy + VOLUME_WEIGHT_TENTHS * volume_bonus + 5) / 10;
        raw.clamp(REPUTATION_FLOOR as u64, REPUTATION_CEILING as u64) as u32
    }

    /// Count one verified claim.
    pub fn record_success(
        txn: &LedgerTxn<'_>,
        submitter: &SubmitterId,
        now: Timestamp,
    ) -> TxResult<ReputationRecord> {
        Self::record(txn, submitter, true, now)
    }

    /// Count one rejected claim.
    pub fn record_failure(
        txn: &LedgerTxn<'_>,
        submitter: &SubmitterId,
        now: Timestamp,
    ) -> TxResult<ReputationRecord> {
        Self::record(txn, submitter, false, now)
    }

    fn record(
        txn: &LedgerTxn<'_>,
        submitter: &SubmitterId,
        correct: bool,
        now: Timestamp,
    ) -> TxResult<ReputationRecord> {
        let mut rec = match txn.get_reputation(submitter)? {
            Some(rec) => rec,
            None => {
                txn.update_stats(|s| s.submitters += 1)?;
                ReputationRecord::new(submitter.clone(), now)
            }
        };
        rec.total_count += 1;
        if correct {
            rec.correct_count += 1;
        }
        rec.score = Self::score(rec.correct_count, rec.total_count);
        rec.last_activity_at = now;
        txn.put_reputation(&rec)?;
        Ok(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StateDb;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("tallyx_reputation_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn first_success_scores_802() {
        // accuracy 1000, bonus 10: (8000 + 20 + 5) / 10
        assert_eq!(ReputationEngine::score(1, 1), 802);
    }

    #[test]
    fn volume_bonus_saturates_at_ten_claims() {
        assert_eq!(ReputationEngine::score(10, 10), 820);
        assert_eq!(ReputationEngine::score(50, 50), 820);
    }

    #[test]
    fn score_never_leaves_bounds() {
        for total in 0..40u64 {
            for correct in 0..=total {
                let s = ReputationEngine::score(correct, total);
                assert!((REPUTATION_FLOOR..=REPUTATION_CEILING).contains(&s), "{correct}/{total} -> {s}");
            }
        }
        // All failures bottom out at the floor.
        assert_eq!(ReputationEngine::score(0, 25), REPUTATION_FLOOR);
    }

    #[test]
    fn records_accumulate_in_db() {
        let db = temp_db("accumulate");
        let who = SubmitterId::from_bytes([4u8; 32]);

        db.transaction(|txn| ReputationEngine::record_success(txn, &who, 10))
            .unwrap();
        let rec = db
            .transaction(|txn| ReputationEngine::record_failure(txn, &who, 20))
            .unwrap();

        assert_eq!(rec.correct_count, 1);
        assert_eq!(rec.total_count, 2);
        // accuracy 500, bonus 20: (4000 + 40 + 5) / 10
        assert_eq!(rec.score, 404);
        assert_eq!(rec.last_activity_at, 20);
        assert_eq!(db.get_reputation(&who).unwrap(), Some(rec));
        assert_eq!(db.get_stats().unwrap().submitters, 1);
    }
}
