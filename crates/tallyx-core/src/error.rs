use thiserror::Error;

#[derive(Debug, Error)]
pub enum TallyxError {
    // ── Submission errors ────────────────────────────────────────────────────
    #[error("invalid threshold: {got} is outside 1..=100")]
    InvalidThreshold { got: u32 },

    #[error("invalid claim type: {0}")]
    InvalidClaimType(u8),

    #[error("commitment already processed: {0}")]
    DuplicateCommitment(String),

    // ── Verification errors ──────────────────────────────────────────────────
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("public signal {field} does not match the claimed inputs")]
    BindingMismatch { field: &'static str },

    #[error("proof rejected by the Groth16 verifier")]
    AlgebraicVerificationFailure,

    // ── Prover errors ────────────────────────────────────────────────────────
    #[error("witness does not satisfy the threshold circuit: {0}")]
    Unsatisfiable(String),

    #[error("proof system error: {0}")]
    ProofSystem(String),

    // ── Lifecycle errors ─────────────────────────────────────────────────────
    #[error("invalid claim status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("claim not found: {0}")]
    ClaimNotFound(u64),

    // ── Bounty errors ────────────────────────────────────────────────────────
    #[error("insufficient funds: reward {reward} exceeds escrowed {escrowed}")]
    InsufficientFunds { reward: u128, escrowed: u128 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("bounty not found: {0}")]
    BountyNotFound(u64),

    #[error("bounty target id must be 1..={max} bytes")]
    InvalidBountyTarget { max: usize },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl TallyxError {
    /// True for verification failures that are recorded as a `Rejected`
    /// claim. Structural failures (`MalformedProof`) leave no state behind.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TallyxError::BindingMismatch { .. } | TallyxError::AlgebraicVerificationFailure
        )
    }

    /// True for errors caused by the caller's input rather than the node.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            TallyxError::Serialization(_)
                | TallyxError::Storage(_)
                | TallyxError::ProofSystem(_)
                | TallyxError::Other(_)
        )
    }

    /// Short machine-readable name of the error kind, used in rejection events.
    pub fn kind(&self) -> &'static str {
        match self {
            TallyxError::InvalidThreshold { .. } => "InvalidThreshold",
            TallyxError::InvalidClaimType(_) => "InvalidClaimType",
            TallyxError::DuplicateCommitment(_) => "DuplicateCommitment",
            TallyxError::MalformedProof(_) => "MalformedProof",
            TallyxError::BindingMismatch { .. } => "BindingMismatch",
            TallyxError::AlgebraicVerificationFailure => "AlgebraicVerificationFailure",
            TallyxError::Unsatisfiable(_) => "Unsatisfiable",
            TallyxError::ProofSystem(_) => "ProofSystem",
            TallyxError::InvalidStatusTransition { .. } => "InvalidStatusTransition",
            TallyxError::ClaimNotFound(_) => "ClaimNotFound",
            TallyxError::InsufficientFunds { .. } => "InsufficientFunds",
            TallyxError::ZeroAmount => "ZeroAmount",
            TallyxError::BountyNotFound(_) => "BountyNotFound",
            TallyxError::InvalidBountyTarget { .. } => "InvalidBountyTarget",
            TallyxError::InvalidIdentifier(_) => "InvalidIdentifier",
            TallyxError::Serialization(_) => "Serialization",
            TallyxError::Storage(_) => "Storage",
            TallyxError::Other(_) => "Other",
        }
    }
}
