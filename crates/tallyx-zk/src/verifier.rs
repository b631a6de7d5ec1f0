use ark_bn254::{Bn254, Fr};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, PreparedVerifyingKey, VerifyingKey};
use ark_snark::SNARK;
use serde::{Deserialize, Serialize};
use tallyx_core::claim::check_threshold;
use tallyx_core::constants::{MAX_THRESHOLD, MIN_THRESHOLD, PUBLIC_SIGNAL_COUNT};
use tallyx_core::error::TallyxError;
use tallyx_core::types::Commitment;
use tracing::debug;

use crate::encoding::{encode_public_inputs, field_to_bytes};
use crate::envelope::{ProofEnvelope, MAX_PROOF_BYTES, MIN_PROOF_BYTES};
use crate::keys::vk_digest;

/// Checks threshold proofs against the published verifying key.
///
/// Holds only the prepared key; every call is pure.
#[derive(Clone)]
pub struct ProofVerifier {
    pvk: PreparedVerifyingKey<Bn254>,
    vk_digest: [u8; 32],
}

/// Static description of what this verifier accepts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifierInfo {
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

impl ProofVerifier {
    pub fn new(vk: &VerifyingKey<Bn254>) -> Result<Self, TallyxError> {
        let pvk = Groth16::<Bn254>::process_vk(vk)
            .map_err(|e| TallyxError::ProofSystem(format!("prepare vk: {e}")))?;
        Ok(Self {
            pvk,
            vk_digest: vk_digest(vk),
        })
    }

    pub fn vk_digest(&self) -> [u8; 32] {
        self.vk_digest
    }

    /// Full check of submitted proof bytes.
    ///
    /// Order: threshold range, envelope structure, public-signal binding,
    /// then the pairing check. A proof for another commitment or threshold
    /// is reported as `BindingMismatch` without touching the pairing.
    pub fn verify(
        &self,
        proof: &[u8],
        commitment: &Commitment,
        threshold: u32,
    ) -> Result<(), TallyxError> {
        let threshold = check_threshold(threshold)?;
        let envelope = ProofEnvelope::decode(proof)?;
        self.verify_envelope(&envelope, commitment, threshold)
    }

    /// Binding and algebraic checks on an already decoded envelope.
    pub fn verify_envelope(
        &self,
        envelope: &ProofEnvelope,
        commitment: &Commitment,
        threshold: u8,
    ) -> Result<(), TallyxError> {
        let expected = encode_public_inputs(commitment, threshold);
        check_binding(&envelope.public_signals, &expected)?;

        let proof = envelope.groth16_proof()?;
        let accepted = Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, &expected, &proof)
            .map_err(|_| TallyxError::AlgebraicVerificationFailure)?;
        if !accepted {
            return Err(TallyxError::AlgebraicVerificationFailure);
        }
        debug!(commitment = %commitment, threshold, "groth16 proof accepted");
        Ok(())
    }

    pub fn info(&self) -> VerifierInfo {
        VerifierInfo {
            protocol: "groth16".into(),
            curve: "bn254".into(),
            field_modulus: Fr::MODULUS.to_string(),
            vk_digest: hex::encode(self.vk_digest),
            public_signals: PUBLIC_SIGNAL_COUNT,
            min_proof_bytes: MIN_PROOF_BYTES,
            max_proof_bytes: MAX_PROOF_BYTES,
            min_threshold: MIN_THRESHOLD,
            max_threshold: MAX_THRESHOLD,
        }
    }
}

fn check_binding(signals: &[[u8; 32]], expected: &[Fr; 2]) -> Result<(), TallyxError> {
    if signals.len() != PUBLIC_SIGNAL_COUNT {
        return Err(TallyxError::BindingMismatch {
            field: "public_signals",
        });
    }
    if signals[0] != field_to_bytes(&expected[0]) {
        return Err(TallyxError::BindingMismatch {
            field: "commitment_field",
        });
    }
    if signals[1] != field_to_bytes(&expected[1]) {
        return Err(TallyxError::BindingMismatch {
            field: "threshold_field",
        });
    }
    Ok(())
}
