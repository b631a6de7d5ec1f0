use std::fs;
use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::CircuitSpecificSetupSNARK;
use ark_std::rand::{CryptoRng, RngCore};
use tallyx_core::error::TallyxError;
use tracing::info;

use crate::circuit::ThresholdCircuit;

pub const PROVING_KEY_FILE: &str = "threshold.pk";
pub const VERIFYING_KEY_FILE: &str = "threshold.vk";

/// Groth16 parameters for the threshold circuit.
///
/// Generated locally these come from a single-party setup, which is only
/// fit for development. A deployment publishes the verifying key from a
/// proper ceremony and distributes the proving key to provers.
#[derive(Clone)]
pub struct ThresholdKeys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl ThresholdKeys {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, TallyxError> {
        let (proving_key, verifying_key) =
            Groth16::<Bn254>::setup(ThresholdCircuit::blank(), rng)
                .map_err(|e| TallyxError::ProofSystem(format!("setup: {e}")))?;
        Ok(Self {
            proving_key,
            verifying_key,
        })
    }

    /// Write both keys into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<(), TallyxError> {
        fs::create_dir_all(dir).map_err(|e| TallyxError::Storage(e.to_string()))?;
        write_key(&dir.join(PROVING_KEY_FILE), &self.proving_key)?;
        write_key(&dir.join(VERIFYING_KEY_FILE), &self.verifying_key)?;
        info!(dir = %dir.display(), vk = %hex::encode(vk_digest(&self.verifying_key)), "threshold keys written");
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, TallyxError> {
        Ok(Self {
            proving_key: read_key(&dir.join(PROVING_KEY_FILE))?,
            verifying_key: read_key(&dir.join(VERIFYING_KEY_FILE))?,
        })
    }

    /// True when both key files are present in `dir`.
    pub fn exist_in(dir: &Path) -> bool {
        dir.join(PROVING_KEY_FILE).is_file() && dir.join(VERIFYING_KEY_FILE).is_file()
    }
}

/// True when `dir` holds a verifying key, with or without its proving key.
pub fn has_verifying_key(dir: &Path) -> bool {
    dir.join(VERIFYING_KEY_FILE).is_file()
}

/// Load only the verifying key, as a verifier-only node does.
pub fn load_verifying_key(dir: &Path) -> Result<VerifyingKey<Bn254>, TallyxError> {
    read_key(&dir.join(VERIFYING_KEY_FILE))
}

/// BLAKE3 digest of the compressed verifying key; identifies the key in
/// logs and RPC responses.
pub fn vk_digest(vk: &VerifyingKey<Bn254>) -> [u8; 32] {
    let mut bytes = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = vk.serialize_compressed(&mut bytes);
    *blake3::hash(&bytes).as_bytes()
}

fn write_key<T: CanonicalSerialize>(path: &Path, key: &T) -> Result<(), TallyxError> {
    let mut bytes = Vec::with_capacity(key.compressed_size());
    key.serialize_compressed(&mut bytes)
        .map_err(|e| TallyxError::Serialization(e.to_string()))?;
    fs::write(path, bytes).map_err(|e| TallyxError::Storage(format!("{}: {e}", path.display())))
}

fn read_key<T: CanonicalDeserialize>(path: &Path) -> Result<T, TallyxError> {
    let bytes =
        fs::read(path).map_err(|e| TallyxError::Storage(format!("{}: {e}", path.display())))?;
    T::deserialize_compressed(bytes.as_slice())
        .map_err(|e| TallyxError::Serialization(format!("{}: {e}", path.display())))
}
