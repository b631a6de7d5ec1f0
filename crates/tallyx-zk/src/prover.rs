use ark_bn254::{Bn254, Fr};
use ark_ff::UniformRand;
use ark_groth16::{Groth16, ProvingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use tallyx_core::claim::check_threshold;
use tallyx_core::error::TallyxError;
use tallyx_core::types::Commitment;
use tracing::debug;

use crate::circuit::{ThresholdCircuit, ThresholdWitness};
use crate::encoding::encode_public_inputs;
use crate::envelope::ProofEnvelope;

/// Prove that `floor(observed * 100 / total) >= threshold` for the document
/// behind `commitment`, without revealing `observed` or `total`.
///
/// Fails with `Unsatisfiable` before any proving work when the quantities do
/// not meet the threshold.
pub fn prove_threshold<R: RngCore + CryptoRng>(
    proving_key: &ProvingKey<Bn254>,
    commitment: &Commitment,
    threshold: u32,
    total: u64,
    observed: u64,
    rng: &mut R,
) -> Result<ProofEnvelope, TallyxError> {
    let threshold = check_threshold(threshold)?;

    if total == 0 {
        return Err(TallyxError::Unsatisfiable("total must be positive".into()));
    }
    if observed > total {
        return Err(TallyxError::Unsatisfiable(format!(
            "observed {observed} exceeds total {total}"
        )));
    }

    let witness = ThresholdWitness {
        total,
        observed,
        salt: Fr::rand(rng),
    };
    let (ratio, _) = witness
        .ratio_and_remainder()
        .ok_or_else(|| TallyxError::Unsatisfiable("total must be positive".into()))?;
    if ratio < threshold as u128 {
        return Err(TallyxError::Unsatisfiable(format!(
            "ratio {ratio}% is below threshold {threshold}%"
        )));
    }

    let public_inputs = encode_public_inputs(commitment, threshold);
    let circuit = ThresholdCircuit::new(public_inputs[0], public_inputs[1], witness);

    // Groth16 does not check satisfiability itself; catch any gap between
    // the native checks above and the constraint system here.
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit
        .clone()
        .generate_constraints(cs.clone())
        .map_err(|e| TallyxError::ProofSystem(e.to_string()))?;
    let satisfied = cs
        .is_satisfied()
        .map_err(|e| TallyxError::ProofSystem(e.to_string()))?;
    if !satisfied {
        let which = cs.which_is_unsatisfied().ok().flatten().unwrap_or_default();
        return Err(TallyxError::Unsatisfiable(format!(
            "constraint {which} not satisfied"
        )));
    }
    debug!(
        constraints = cs.num_constraints(),
        threshold, "threshold witness satisfied"
    );

    let proof = Groth16::<Bn254>::prove(proving_key, circuit, rng)
        .map_err(|e| TallyxError::ProofSystem(format!("prove: {e}")))?;
    ProofEnvelope::new(&proof, &public_inputs)
}
