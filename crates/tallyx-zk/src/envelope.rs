//! Proof envelope: the byte string a client submits alongside a claim.
//!
//! Layout (bincode, fixed-width integers):
//!
//! ```text
//! version        u8
//! groth16        u64 length ‖ compressed Groth16 proof (128 bytes)
//! public_signals u64 count  ‖ count × 32-byte little-endian field elements
//! ```
//!
//! Public signals are located by decoding, never by fixed offsets.

use ark_bn254::{Bn254, Fr};
use ark_groth16::Proof;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bincode::Options;
use serde::{Deserialize, Serialize};
use tallyx_core::constants::{
    FIELD_ELEMENT_BYTES, GROTH16_PROOF_BYTES, PROOF_ENVELOPE_VERSION, PUBLIC_SIGNAL_COUNT,
};
use tallyx_core::error::TallyxError;

use crate::encoding::field_to_bytes;

/// Smallest well-formed envelope: version, two length prefixes, one
/// compressed proof and the expected public signals.
pub const MIN_PROOF_BYTES: usize =
    1 + 8 + GROTH16_PROOF_BYTES + 8 + PUBLIC_SIGNAL_COUNT * FIELD_ELEMENT_BYTES;

/// Upper bound on accepted envelope size.
pub const MAX_PROOF_BYTES: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofEnvelope {
    pub version: u8,
    /// Compressed `ark_groth16::Proof<Bn254>`.
    pub groth16: Vec<u8>,
    /// Canonical encodings of the public signals, in circuit order.
    pub public_signals: Vec<[u8; 32]>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PROOF_BYTES as u64)
        .reject_trailing_bytes()
}

impl ProofEnvelope {
    pub fn new(proof: &Proof<Bn254>, public_inputs: &[Fr]) -> Result<Self, TallyxError> {
        let mut groth16 = Vec::with_capacity(GROTH16_PROOF_BYTES);
        proof
            .serialize_compressed(&mut groth16)
            .map_err(|e| TallyxError::ProofSystem(e.to_string()))?;
        Ok(Self {
            version: PROOF_ENVELOPE_VERSION,
            groth16,
            public_signals: public_inputs.iter().map(field_to_bytes).collect(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TallyxError> {
        codec()
            .serialize(self)
            .map_err(|e| TallyxError::Serialization(e.to_string()))
    }

    /// Structural decode. Does not look at what the public signals say.
    pub fn decode(bytes: &[u8]) -> Result<Self, TallyxError> {
        if bytes.len() < MIN_PROOF_BYTES {
            return Err(TallyxError::MalformedProof(format!(
                "{} bytes, need at least {MIN_PROOF_BYTES}",
                bytes.len()
            )));
        }
        if bytes.len() > MAX_PROOF_BYTES {
            return Err(TallyxError::MalformedProof(format!(
                "{} bytes, limit is {MAX_PROOF_BYTES}",
                bytes.len()
            )));
        }

        let envelope: ProofEnvelope = codec()
            .deserialize(bytes)
            .map_err(|e| TallyxError::MalformedProof(format!("envelope: {e}")))?;

        if envelope.version != PROOF_ENVELOPE_VERSION {
            return Err(TallyxError::MalformedProof(format!(
                "unsupported envelope version {}",
                envelope.version
            )));
        }
        if envelope.groth16.len() != GROTH16_PROOF_BYTES {
            return Err(TallyxError::MalformedProof(format!(
                "groth16 proof is {} bytes, expected {GROTH16_PROOF_BYTES}",
                envelope.groth16.len()
            )));
        }
        Ok(envelope)
    }

    /// Decode the Groth16 proof points (on-curve and subgroup checked).
    pub fn groth16_proof(&self) -> Result<Proof<Bn254>, TallyxError> {
        Proof::<Bn254>::deserialize_compressed(self.groth16.as_slice())
            .map_err(|e| TallyxError::MalformedProof(format!("groth16 proof: {e}")))
    }
}
