//! Zero-knowledge threshold proofs: Groth16 over BN254.
//!
//! ```text
//! encoding.rs  — commitment/threshold → field elements
//! circuit.rs   — R1CS for floor(observed*100/total) >= threshold
//! envelope.rs  — versioned proof byte format
//! keys.rs      — parameter generation and key files
//! prover.rs    — prove_threshold
//! verifier.rs  — ProofVerifier
//! ```

pub mod circuit;
pub mod encoding;
pub mod envelope;
pub mod keys;
pub mod prover;
pub mod verifier;

pub use circuit::{ThresholdCircuit, ThresholdWitness};
pub use encoding::{
    encode_commitment, encode_public_inputs, encode_threshold, field_to_bytes, field_to_decimal,
};
pub use envelope::{ProofEnvelope, MAX_PROOF_BYTES, MIN_PROOF_BYTES};
pub use keys::{has_verifying_key, load_verifying_key, vk_digest, ThresholdKeys};
pub use prover::prove_threshold;
pub use verifier::{ProofVerifier, VerifierInfo};

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use once_cell::sync::Lazy;
    use tallyx_core::error::TallyxError;
    use tallyx_core::types::Commitment;

    static KEYS: Lazy<ThresholdKeys> = Lazy::new(|| {
        let mut rng = StdRng::seed_from_u64(7);
        ThresholdKeys::generate(&mut rng).unwrap()
    });

    fn verifier() -> ProofVerifier {
        ProofVerifier::new(&KEYS.verifying_key).unwrap()
    }

    fn prove(commitment: &Commitment, threshold: u32, total: u64, observed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(threshold as u64 ^ observed);
        prove_threshold(&KEYS.proving_key, commitment, threshold, total, observed, &mut rng)
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn proof_meeting_threshold_verifies() {
        let c = Commitment::of_document(b"10b5-1 plan filing");
        let proof = prove(&c, 40, 350_000, 150_000);
        assert!(proof.len() >= MIN_PROOF_BYTES);
        verifier().verify(&proof, &c, 40).unwrap();
    }

    #[test]
    fn ratio_below_threshold_cannot_be_proven() {
        let c = Commitment::of_document(b"quiet quarter");
        let mut rng = StdRng::seed_from_u64(1);
        let err = prove_threshold(&KEYS.proving_key, &c, 40, 350_000, 100_000, &mut rng)
            .unwrap_err();
        assert!(matches!(err, TallyxError::Unsatisfiable(_)));

        let err = prove_threshold(&KEYS.proving_key, &c, 10, 0, 0, &mut rng).unwrap_err();
        assert!(matches!(err, TallyxError::Unsatisfiable(_)));
    }

    #[test]
    fn proof_bound_to_its_commitment() {
        let c = Commitment::of_document(b"filing A");
        let other = Commitment::of_document(b"filing B");
        let proof = prove(&c, 40, 100, 50);
        let err = verifier().verify(&proof, &other, 40).unwrap_err();
        assert!(matches!(
            err,
            TallyxError::BindingMismatch { field: "commitment_field" }
        ));
    }

    #[test]
    fn commitments_differing_in_first_byte_do_not_share_proofs() {
        let zero = Commitment::from_bytes([0u8; 32]);
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        let one = Commitment::from_bytes(bytes);

        let proof = prove(&zero, 40, 100, 50);
        verifier().verify(&proof, &zero, 40).unwrap();
        let err = verifier().verify(&proof, &one, 40).unwrap_err();
        assert!(matches!(
            err,
            TallyxError::BindingMismatch { field: "commitment_field" }
        ));

        let proof = prove(&one, 40, 100, 50);
        let err = verifier().verify(&proof, &zero, 40).unwrap_err();
        assert!(matches!(
            err,
            TallyxError::BindingMismatch { field: "commitment_field" }
        ));
    }

    #[test]
    fn proof_bound_to_its_threshold() {
        let c = Commitment::of_document(b"filing A");
        // A 50% proof at threshold 40 does not vouch for threshold 30.
        let proof = prove(&c, 40, 100, 50);
        let err = verifier().verify(&proof, &c, 30).unwrap_err();
        assert!(matches!(
            err,
            TallyxError::BindingMismatch { field: "threshold_field" }
        ));
    }

    #[test]
    fn out_of_range_threshold_rejected_before_decoding() {
        let c = Commitment::of_document(b"filing");
        for t in [0u32, 101] {
            let err = verifier().verify(&[], &c, t).unwrap_err();
            assert!(matches!(err, TallyxError::InvalidThreshold { got } if got == t));
        }
    }

    #[test]
    fn tampered_groth16_points_fail_algebraically() {
        let c = Commitment::of_document(b"filing A");
        let good = ProofEnvelope::decode(&prove(&c, 20, 10, 5)).unwrap();
        let other = ProofEnvelope::decode(&prove(&Commitment::of_document(b"x"), 20, 10, 9))
            .unwrap();
        // Valid curve points from a different statement, correct signals.
        let forged = ProofEnvelope {
            groth16: other.groth16.clone(),
            ..good
        };
        let err = verifier()
            .verify(&forged.to_bytes().unwrap(), &c, 20)
            .unwrap_err();
        assert!(matches!(err, TallyxError::AlgebraicVerificationFailure));
    }

    #[test]
    fn truncated_proof_is_malformed() {
        let c = Commitment::of_document(b"filing");
        let proof = prove(&c, 5, 10, 1);
        let err = verifier().verify(&proof[..100], &c, 5).unwrap_err();
        assert!(matches!(err, TallyxError::MalformedProof(_)));
    }

    #[test]
    fn keys_survive_disk_round_trip() {
        let dir = std::env::temp_dir().join(format!("tallyx_keys_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        KEYS.save(&dir).unwrap();
        assert!(ThresholdKeys::exist_in(&dir));
        assert!(has_verifying_key(&dir));
        let loaded = keys::load_verifying_key(&dir).unwrap();
        assert_eq!(vk_digest(&loaded), vk_digest(&KEYS.verifying_key));

        let c = Commitment::of_document(b"persisted");
        let proof = prove(&c, 40, 350_000, 150_000);
        ProofVerifier::new(&loaded).unwrap().verify(&proof, &c, 40).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn verifier_info_reports_field_and_bounds() {
        let info = verifier().info();
        assert_eq!(info.public_signals, 2);
        assert_eq!(info.min_threshold, 1);
        assert_eq!(info.max_threshold, 100);
        assert!(info.field_modulus.starts_with("218882428718392752222464057452572750885"));
        assert_eq!(info.vk_digest.len(), 64);
    }
}
