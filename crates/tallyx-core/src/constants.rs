/// ─── TallyX Protocol Constants ──────────────────────────────────────────────
///
/// "Prove the ratio, keep the numbers."
///
/// Base unit:    tally  (1 TLX = 1,000,000 tallies)
/// Ticker:       TLX

// ── Units ────────────────────────────────────────────────────────────────────

/// 1 TLX expressed in base units. A bounty reward of "1.0" is this many units.
pub const UNITS_PER_TOKEN: u128 = 1_000_000;

// ── Claim thresholds ─────────────────────────────────────────────────────────

/// Smallest threshold percentage a claim may assert.
pub const MIN_THRESHOLD: u32 = 1;

/// Largest threshold percentage a claim may assert.
pub const MAX_THRESHOLD: u32 = 100;

/// Ratios are expressed as whole percentages: floor(observed * 100 / total).
pub const RATIO_SCALE: u64 = 100;

// ── Reputation ───────────────────────────────────────────────────────────────

/// Score assigned on first activity; scores never fall below it.
pub const REPUTATION_FLOOR: u32 = 100;

/// Upper bound on any reputation score.
pub const REPUTATION_CEILING: u32 = 1_000;

/// Accuracy is measured in per-mille (correct * 1000 / total).
pub const ACCURACY_SCALE: u64 = 1_000;

/// Weight of accuracy in the score, in tenths (0.8).
pub const ACCURACY_WEIGHT_TENTHS: u64 = 8;

/// Weight of the volume bonus in the score, in tenths (0.2).
pub const VOLUME_WEIGHT_TENTHS: u64 = 2;

/// Claims counted toward the volume bonus before it saturates.
pub const VOLUME_BONUS_CAP_CLAIMS: u64 = 10;

/// Bonus points per counted claim (saturates at 100).
pub const VOLUME_BONUS_PER_CLAIM: u64 = 10;

// ── Proof envelope ───────────────────────────────────────────────────────────

/// Current proof envelope format version.
pub const PROOF_ENVELOPE_VERSION: u8 = 1;

/// Number of public signals carried by a threshold proof:
/// [commitment_field, threshold_field].
pub const PUBLIC_SIGNAL_COUNT: usize = 2;

/// Bytes of one canonically serialized BN254 scalar field element.
pub const FIELD_ELEMENT_BYTES: usize = 32;

/// Bytes of a compressed Groth16/BN254 proof (A: G1, B: G2, C: G1).
pub const GROTH16_PROOF_BYTES: usize = 128;

// ── Circuit widths ───────────────────────────────────────────────────────────

/// Bit width of the range checks on raw quantities.
pub const QUANTITY_BITS: usize = 64;

/// Bit width of the percentage comparator.
pub const RATIO_BITS: usize = 32;

// ── Bounties ─────────────────────────────────────────────────────────────────

/// Maximum length in bytes of a bounty target identifier (ticker, CIK, …).
pub const MAX_BOUNTY_TARGET_LEN: usize = 64;

// ── RPC listings ─────────────────────────────────────────────────────────────

/// Maximum page size for list endpoints.
pub const MAX_LIST_LIMIT: u32 = 200;
