//! Mapping of ledger inputs onto BN254 scalar field elements.
//!
//! A 256-bit commitment does not fit the ~254-bit field, so it is never
//! truncated: both 128-bit halves are hashed together with Keccak-256 and the
//! digest is reduced modulo the field prime. Prover and verifier must agree on
//! this mapping bit for bit.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use sha3::{Digest, Keccak256};
use tallyx_core::types::Commitment;

/// Commitment → field element: keccak256(high_128_be ‖ low_128_be) mod p.
pub fn encode_commitment(commitment: &Commitment) -> Fr {
    let (high, low) = commitment.as_bytes().split_at(16);
    let mut hasher = Keccak256::new();
    hasher.update(high);
    hasher.update(low);
    Fr::from_be_bytes_mod_order(&hasher.finalize())
}

/// Threshold percentage → field element (direct embedding).
pub fn encode_threshold(threshold: u8) -> Fr {
    Fr::from(threshold as u64)
}

/// Public inputs in circuit order: `[commitment_field, threshold_field]`.
pub fn encode_public_inputs(commitment: &Commitment, threshold: u8) -> [Fr; 2] {
    [encode_commitment(commitment), encode_threshold(threshold)]
}

/// Canonical 32-byte (little-endian, compressed) form of a field element.
pub fn field_to_bytes(value: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&value.into_bigint().to_bytes_le());
    out
}

/// Decimal string form, as public signals are usually shown to humans.
pub fn field_to_decimal(value: &Fr) -> String {
    value.into_bigint().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;
    use ark_serialize::CanonicalSerialize;

    #[test]
    fn modulus_is_bn254_scalar_prime() {
        assert_eq!(
            Fr::MODULUS.to_string(),
            "21888242871839275222246405745257275088548364400416034343698204186575808495617"
        );
    }

    #[test]
    fn high_half_affects_encoding() {
        let a = Commitment::from_bytes([0u8; 32]);
        let mut b_bytes = [0u8; 32];
        b_bytes[0] = 1;
        let b = Commitment::from_bytes(b_bytes);
        assert_ne!(encode_commitment(&a), encode_commitment(&b));
    }

    #[test]
    fn low_half_affects_encoding() {
        let mut x = [0x5Au8; 32];
        let a = Commitment::from_bytes(x);
        x[31] ^= 0x01;
        let b = Commitment::from_bytes(x);
        assert_ne!(encode_commitment(&a), encode_commitment(&b));
    }

    #[test]
    fn commitment_reduced_from_full_keccak_digest() {
        let c = Commitment::from_bytes([0xFFu8; 32]);
        let digest = Keccak256::digest([0xFFu8; 32]);
        assert_eq!(encode_commitment(&c), Fr::from_be_bytes_mod_order(&digest));
        assert!(!encode_commitment(&c).is_zero());
    }

    #[test]
    fn public_input_order() {
        let c = Commitment::of_document(b"form 4 filing");
        let [cf, tf] = encode_public_inputs(&c, 40);
        assert_eq!(cf, encode_commitment(&c));
        assert_eq!(tf, Fr::from(40u64));
        assert_eq!(field_to_decimal(&tf), "40");
        assert_eq!(field_to_bytes(&tf)[0], 40);

        let mut compressed = Vec::new();
        cf.serialize_compressed(&mut compressed).unwrap();
        assert_eq!(compressed, field_to_bytes(&cf).to_vec());
    }
}
