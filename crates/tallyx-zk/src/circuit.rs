//! R1CS for the threshold relation.
//!
//! Statement: the prover knows `total > 0`, `observed <= total` and a salt
//! such that `floor(observed * 100 / total) >= threshold`, bound to the public
//! `commitment_field`.
//!
//! Public inputs, in order: `commitment_field`, `threshold_field`.
//!
//! Every integer relation is kept far below the field prime (quantities are
//! range-checked at 64 bits, the ratio at 32 bits) so the field equations
//! coincide with their integer counterparts.

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, One, PrimeField, Zero};
use ark_relations::lc;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystemRef, LinearCombination, SynthesisError, Variable,
};
use tallyx_core::constants::{QUANTITY_BITS, RATIO_BITS, RATIO_SCALE};

/// Private inputs known only to the prover.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdWitness {
    pub total: u64,
    pub observed: u64,
    pub salt: Fr,
}

impl ThresholdWitness {
    /// floor(observed * 100 / total) and the remainder. `None` when total is 0.
    pub fn ratio_and_remainder(&self) -> Option<(u128, u128)> {
        if self.total == 0 {
            return None;
        }
        let scaled = self.observed as u128 * RATIO_SCALE as u128;
        Some((scaled / self.total as u128, scaled % self.total as u128))
    }
}

/// Constraint synthesizer for the threshold claim.
///
/// `witness` is `None` during key generation; synthesis then only lays out
/// the constraint shape.
#[derive(Clone, Debug)]
pub struct ThresholdCircuit {
    pub commitment_field: Option<Fr>,
    pub threshold_field: Option<Fr>,
    pub witness: Option<ThresholdWitness>,
}

impl ThresholdCircuit {
    /// Shape-only instance used for Groth16 parameter generation.
    pub fn blank() -> Self {
        Self {
            commitment_field: None,
            threshold_field: None,
            witness: None,
        }
    }

    pub fn new(commitment_field: Fr, threshold_field: Fr, witness: ThresholdWitness) -> Self {
        Self {
            commitment_field: Some(commitment_field),
            threshold_field: Some(threshold_field),
            witness: Some(witness),
        }
    }

    /// Derived witness values, computed once per synthesis.
    fn assignments(&self) -> Option<Assignments> {
        let w = self.witness?;
        let c = self.commitment_field?;
        let t = self.threshold_field?;

        let total = Fr::from(w.total);
        let observed = Fr::from(w.observed);
        // A zero total still yields a (failing) assignment so the system can
        // be checked for satisfiability instead of erroring out.
        let (ratio, rem) = w.ratio_and_remainder().unwrap_or((0, 0));
        let ratio = Fr::from(ratio);
        let rem = Fr::from(rem);

        let one = Fr::one();
        let range_ok = fits_in_bits(&(total - one), QUANTITY_BITS)
            && fits_in_bits(&(total - observed), QUANTITY_BITS)
            && fits_in_bits(&(total - rem - one), QUANTITY_BITS)
            && fits_in_bits(&ratio, RATIO_BITS)
            && fits_in_bits(&(ratio - t), RATIO_BITS);

        Some(Assignments {
            total,
            observed,
            salt: w.salt,
            ratio,
            rem,
            binding: c.square() + w.salt,
            valid: if range_ok { one } else { Fr::zero() },
        })
    }
}

#[derive(Clone, Copy)]
struct Assignments {
    total: Fr,
    observed: Fr,
    salt: Fr,
    ratio: Fr,
    rem: Fr,
    binding: Fr,
    valid: Fr,
}

/// True when the canonical integer form of `value` is below 2^bits.
pub fn fits_in_bits(value: &Fr, bits: usize) -> bool {
    value
        .into_bigint()
        .to_bits_le()
        .iter()
        .skip(bits)
        .all(|b| !*b)
}

impl ConstraintSynthesizer<Fr> for ThresholdCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let a = self.assignments();

        // ── Public inputs ────────────────────────────────────────────────────
        let commitment = cs.new_input_variable(|| {
            self.commitment_field.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let threshold = cs.new_input_variable(|| {
            self.threshold_field.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ── Private witnesses ────────────────────────────────────────────────
        let total = witness(&cs, a.map(|a| a.total))?;
        let observed = witness(&cs, a.map(|a| a.observed))?;
        let salt = witness(&cs, a.map(|a| a.salt))?;
        let ratio = witness(&cs, a.map(|a| a.ratio))?;
        let rem = witness(&cs, a.map(|a| a.rem))?;
        let binding = witness(&cs, a.map(|a| a.binding))?;
        let valid = witness(&cs, a.map(|a| a.valid))?;

        // Raw quantities fit in 64 bits.
        enforce_bits(
            &cs,
            lc!() + total,
            a.map(|a| a.total),
            QUANTITY_BITS,
        )?;
        enforce_bits(
            &cs,
            lc!() + observed,
            a.map(|a| a.observed),
            QUANTITY_BITS,
        )?;

        // total > 0
        enforce_bits(
            &cs,
            lc!() + total - Variable::One,
            a.map(|a| a.total - Fr::one()),
            QUANTITY_BITS,
        )?;

        // observed <= total
        enforce_bits(
            &cs,
            lc!() + total - observed,
            a.map(|a| a.total - a.observed),
            QUANTITY_BITS,
        )?;

        // Floor division: ratio * total = observed * 100 - rem, 0 <= rem < total.
        enforce_bits(&cs, lc!() + rem, a.map(|a| a.rem), QUANTITY_BITS)?;
        enforce_bits(
            &cs,
            lc!() + total - rem - Variable::One,
            a.map(|a| a.total - a.rem - Fr::one()),
            QUANTITY_BITS,
        )?;
        enforce_bits(&cs, lc!() + ratio, a.map(|a| a.ratio), RATIO_BITS)?;
        cs.enforce_constraint(
            lc!() + ratio,
            lc!() + total,
            lc!() + (Fr::from(RATIO_SCALE), observed) - rem,
        )?;

        // ratio >= threshold
        enforce_bits(
            &cs,
            lc!() + ratio - threshold,
            a.zip(self.threshold_field).map(|(a, t)| a.ratio - t),
            RATIO_BITS,
        )?;

        // Binding: the proof is tied to this commitment and salt.
        cs.enforce_constraint(
            lc!() + commitment,
            lc!() + commitment,
            lc!() + binding - salt,
        )?;

        // valid ∈ {0, 1} and valid = 1.
        enforce_boolean(&cs, valid)?;
        cs.enforce_constraint(lc!() + valid, lc!() + Variable::One, lc!() + Variable::One)?;

        Ok(())
    }
}

fn witness(cs: &ConstraintSystemRef<Fr>, value: Option<Fr>) -> Result<Variable, SynthesisError> {
    cs.new_witness_variable(|| value.ok_or(SynthesisError::AssignmentMissing))
}

fn enforce_boolean(cs: &ConstraintSystemRef<Fr>, bit: Variable) -> Result<(), SynthesisError> {
    // b · (1 − b) = 0
    cs.enforce_constraint(lc!() + bit, lc!() + Variable::One - bit, lc!())
}

/// Decompose `target` into `bits` boolean witnesses and constrain
/// Σ 2^i · b_i = target. Satisfiable only when target ∈ [0, 2^bits).
fn enforce_bits(
    cs: &ConstraintSystemRef<Fr>,
    target: LinearCombination<Fr>,
    value: Option<Fr>,
    bits: usize,
) -> Result<(), SynthesisError> {
    let le_bits = value.map(|v| v.into_bigint().to_bits_le());

    let mut sum = lc!();
    let mut coeff = Fr::one();
    for i in 0..bits {
        let bit_value = le_bits.as_ref().map(|b| Fr::from(b[i] as u64));
        let bit = witness(cs, bit_value)?;
        enforce_boolean(cs, bit)?;
        sum = sum + (coeff, bit);
        coeff += coeff;
    }

    cs.enforce_constraint(sum, lc!() + Variable::One, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn satisfied(total: u64, observed: u64, threshold: u64) -> bool {
        let circuit = ThresholdCircuit::new(
            Fr::from(123_456_789u64),
            Fr::from(threshold),
            ThresholdWitness {
                total,
                observed,
                salt: Fr::from(42u64),
            },
        );
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn ratio_at_or_above_threshold_satisfies() {
        // 60%
        assert!(satisfied(100_000, 60_000, 40));
        // exactly at threshold (>=, not >)
        assert!(satisfied(100_000, 40_000, 40));
        assert!(satisfied(7, 7, 100));
    }

    #[test]
    fn ratio_below_threshold_fails() {
        // 39%
        assert!(!satisfied(100_000, 39_000, 40));
        // floor(2 * 100 / 3) = 66
        assert!(!satisfied(3, 2, 67));
        assert!(satisfied(3, 2, 66));
    }

    #[test]
    fn out_of_domain_quantities_fail() {
        assert!(!satisfied(0, 0, 1));
        assert!(!satisfied(10, 11, 1));
    }

    #[test]
    fn extreme_quantities_stay_sound() {
        assert!(satisfied(u64::MAX, u64::MAX, 100));
        assert!(satisfied(u64::MAX, u64::MAX / 2, 49));
        assert!(!satisfied(u64::MAX, u64::MAX / 2, 51));
    }

    #[test]
    fn blank_circuit_has_fixed_shape() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        ThresholdCircuit::blank()
            .generate_constraints(cs.clone())
            .unwrap();
        // one + two public inputs
        assert_eq!(cs.num_instance_variables(), 3);
        assert!(cs.num_constraints() > 6 * QUANTITY_BITS);
    }

    #[test]
    fn fits_in_bits_boundaries() {
        assert!(fits_in_bits(&Fr::from(u32::MAX as u64), 32));
        assert!(!fits_in_bits(&Fr::from(1u64 << 32), 32));
        assert!(!fits_in_bits(&(Fr::zero() - Fr::one()), 64));
    }
}
