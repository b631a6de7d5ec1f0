use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::TallyxError;

/// Amount in base units (1 TLX = 1_000_000 units).
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Ledger-assigned claim identifier (monotonically increasing).
pub type ClaimId = u64;

/// Ledger-assigned bounty identifier (monotonically increasing).
pub type BountyId = u64;

fn decode_32(bytes: &[u8], what: &str) -> Result<[u8; 32], TallyxError> {
    <[u8; 32]>::try_from(bytes).map_err(|_| {
        TallyxError::InvalidIdentifier(format!("{what} must be 32 bytes, got {}", bytes.len()))
    })
}

// ── SubmitterId ──────────────────────────────────────────────────────────────

/// 32-byte identity of a claim submitter or bounty funder.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmitterId(pub [u8; 32]);

impl SubmitterId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, TallyxError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TallyxError::InvalidIdentifier(format!("submitter id: {e}")))?;
        Ok(Self(decode_32(&bytes, "submitter id")?))
    }
}

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_b58();
        write!(f, "SubmitterId({})", &b58[..b58.len().min(8)])
    }
}

// ── Commitment ───────────────────────────────────────────────────────────────

/// 32-byte commitment to an external evidence document (its SHA-256 hash).
/// The ledger never interprets the document; the commitment is the only link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Commit to a document: SHA-256 over its raw bytes.
    pub fn of_document(document: &[u8]) -> Self {
        Self(Sha256::digest(document).into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TallyxError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| TallyxError::InvalidIdentifier(format!("commitment: {e}")))?;
        Ok(Self(decode_32(&bytes, "commitment")?))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({}…)", &self.to_hex()[..16])
    }
}
