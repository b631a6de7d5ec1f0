//! tallyx-core::claim
//!
//! Claim records and their lifecycle.
//!
//! A claim is immutable once created except for `status`, which only moves
//! along Submitted → Verified → Finalized or Submitted → Rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_THRESHOLD, MIN_THRESHOLD};
use crate::error::TallyxError;
use crate::types::{ClaimId, Commitment, SubmitterId, Timestamp};

// ── ClaimType ────────────────────────────────────────────────────────────────

/// Category of signal a claim asserts about the committed document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    InsiderSelling = 0,
    ExecutiveExit = 1,
    RiskLanguageSurge = 2,
    InsiderBuying = 3,
}

impl ClaimType {
    pub fn from_u8(v: u8) -> Result<Self, TallyxError> {
        match v {
            0 => Ok(ClaimType::InsiderSelling),
            1 => Ok(ClaimType::ExecutiveExit),
            2 => Ok(ClaimType::RiskLanguageSurge),
            3 => Ok(ClaimType::InsiderBuying),
            other => Err(TallyxError::InvalidClaimType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Wire name, e.g. `"INSIDER_SELLING"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::InsiderSelling => "INSIDER_SELLING",
            ClaimType::ExecutiveExit => "EXECUTIVE_EXIT",
            ClaimType::RiskLanguageSurge => "RISK_LANGUAGE_SURGE",
            ClaimType::InsiderBuying => "INSIDER_BUYING",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LifecycleStatus ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStatus {
    /// Accepted for processing; proof not yet checked.
    Submitted,
    /// Proof checked and accepted.
    Verified,
    /// Reputation and bounty effects applied. Terminal.
    Finalized,
    /// Proof failed binding or algebraic verification. Terminal.
    Rejected,
}

impl LifecycleStatus {
    pub fn verify(self) -> Result<Self, TallyxError> {
        match self {
            LifecycleStatus::Submitted => Ok(LifecycleStatus::Verified),
            from => Err(from.illegal(LifecycleStatus::Verified)),
        }
    }

    pub fn finalize(self) -> Result<Self, TallyxError> {
        match self {
            LifecycleStatus::Verified => Ok(LifecycleStatus::Finalized),
            from => Err(from.illegal(LifecycleStatus::Finalized)),
        }
    }

    pub fn reject(self) -> Result<Self, TallyxError> {
        match self {
            LifecycleStatus::Submitted => Ok(LifecycleStatus::Rejected),
            from => Err(from.illegal(LifecycleStatus::Rejected)),
        }
    }

    fn illegal(self, to: LifecycleStatus) -> TallyxError {
        TallyxError::InvalidStatusTransition {
            from: self.as_str(),
            to: to.as_str(),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleStatus::Finalized | LifecycleStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::Submitted => "Submitted",
            LifecycleStatus::Verified => "Verified",
            LifecycleStatus::Finalized => "Finalized",
            LifecycleStatus::Rejected => "Rejected",
        }
    }

    /// Human-readable status line.
    pub fn describe(self) -> &'static str {
        match self {
            LifecycleStatus::Submitted => "Submitted - awaiting verification",
            LifecycleStatus::Verified => "Verified - proof accepted",
            LifecycleStatus::Finalized => "Finalized - rewards settled",
            LifecycleStatus::Rejected => "Rejected - proof failed verification",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Claim ────────────────────────────────────────────────────────────────────

/// A threshold claim as stored in the `claims` sled tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// SHA-256 of the evidence document.
    pub commitment: Commitment,
    pub claim_type: ClaimType,
    /// Percentage the private ratio is asserted to meet, 1..=100.
    pub threshold: u8,
    pub submitter: SubmitterId,
    pub created_at: Timestamp,
    /// Encoded proof envelope exactly as submitted.
    pub proof: Vec<u8>,
    pub status: LifecycleStatus,
}

impl Claim {
    pub fn new(
        id: ClaimId,
        commitment: Commitment,
        claim_type: ClaimType,
        threshold: u8,
        submitter: SubmitterId,
        proof: Vec<u8>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            commitment,
            claim_type,
            threshold,
            submitter,
            created_at,
            proof,
            status: LifecycleStatus::Submitted,
        }
    }
}

/// Validate a caller-supplied threshold and narrow it to `u8`.
pub fn check_threshold(threshold: u32) -> Result<u8, TallyxError> {
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
        return Err(TallyxError::InvalidThreshold { got: threshold });
    }
    Ok(threshold as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_paths() {
        let s = LifecycleStatus::Submitted;
        let v = s.verify().unwrap();
        assert_eq!(v.finalize().unwrap(), LifecycleStatus::Finalized);
        assert_eq!(s.reject().unwrap(), LifecycleStatus::Rejected);
    }

    #[test]
    fn illegal_transitions_are_errors() {
        assert!(LifecycleStatus::Submitted.finalize().is_err());
        assert!(LifecycleStatus::Verified.reject().is_err());
        assert!(LifecycleStatus::Finalized.verify().is_err());
        let err = LifecycleStatus::Rejected.verify().unwrap_err();
        match err {
            TallyxError::InvalidStatusTransition { from, to } => {
                assert_eq!(from, "Rejected");
                assert_eq!(to, "Verified");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn claim_type_wire_values() {
        assert_eq!(ClaimType::from_u8(2).unwrap(), ClaimType::RiskLanguageSurge);
        assert_eq!(ClaimType::InsiderBuying.as_u8(), 3);
        assert!(matches!(
            ClaimType::from_u8(4),
            Err(TallyxError::InvalidClaimType(4))
        ));
    }

    #[test]
    fn threshold_bounds() {
        assert_eq!(check_threshold(1).unwrap(), 1);
        assert_eq!(check_threshold(100).unwrap(), 100);
        assert!(matches!(
            check_threshold(0),
            Err(TallyxError::InvalidThreshold { got: 0 })
        ));
        assert!(check_threshold(101).is_err());
    }
}
