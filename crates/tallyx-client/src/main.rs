//! tallyx-client
//!
//! CLI for TallyX. Holds a submitter identity, generates threshold proofs
//! locally from the proving key, and talks to a running node via JSON-RPC.
//!
//! Usage:
//!   tallyx-client identity    [--identity <path>]
//!   tallyx-client setup       [--keys-dir <dir>]
//!   tallyx-client commit      --document <path>
//!   tallyx-client prove       (--document <path> | --commitment <hex>) --threshold <pct> --total <n> --observed <n>
//!   tallyx-client submit      (--document <path> | --commitment <hex>) --claim-type <type> --threshold <pct>
//!                             (--proof <hex> | --total <n> --observed <n>) [--rpc <url>]
//!   tallyx-client claim       --claim-id <id>
//!   tallyx-client status      --claim-id <id>
//!   tallyx-client reputation  [--submitter <b58>]
//!   tallyx-client balance     [--submitter <b58>]
//!   tallyx-client fund        --target <id> --reward <tlx> [--escrow <tlx>]
//!   tallyx-client bounty      --bounty-id <id>
//!   tallyx-client bounties
//!   tallyx-client recent      [--limit <n>]
//!   tallyx-client stats
//!   tallyx-client info

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use tallyx_core::claim::{check_threshold, ClaimType};
use tallyx_core::constants::{MAX_LIST_LIMIT, UNITS_PER_TOKEN};
use tallyx_core::types::{Commitment, SubmitterId};
use tallyx_rpc::types::format_tokens;
use tallyx_rpc::RpcClaim;
use tallyx_zk::{encode_public_inputs, field_to_decimal, prove_threshold, vk_digest, ThresholdKeys};

mod rpc_client;
use rpc_client::TallyxRpcClient;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "tallyx-client",
    version,
    about = "TallyX client — prove and submit threshold claims"
)]
struct Args {
    /// Path to the submitter identity file (JSON).
    #[arg(long, global = true, default_value = "~/.tallyx/identity.json")]
    identity: PathBuf,

    /// Directory holding the threshold proving key.
    #[arg(long, global = true, default_value = "~/.tallyx/keys")]
    keys_dir: PathBuf,

    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8545")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new submitter identity and save it to the identity file.
    Identity,

    /// Run a local single-party setup and write the threshold keys.
    Setup,

    /// Print the SHA-256 commitment of a document.
    Commit {
        #[arg(long)]
        document: PathBuf,
    },

    /// Generate a threshold proof and print it as hex.
    Prove {
        #[command(flatten)]
        target: CommitmentArg,
        /// Claimed minimum percentage (1-100).
        #[arg(long)]
        threshold: u32,
        /// Total quantity in the document.
        #[arg(long)]
        total: u64,
        /// Observed quantity in the document.
        #[arg(long)]
        observed: u64,
        /// Write the proof bytes to this file instead of printing hex.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Submit a claim, proving it first when no proof is supplied.
    Submit {
        #[command(flatten)]
        target: CommitmentArg,
        /// Claim type: 0-3 or its name (e.g. INSIDER_SELLING).
        #[arg(long, value_parser = parse_claim_type)]
        claim_type: ClaimType,
        /// Claimed minimum percentage (1-100).
        #[arg(long)]
        threshold: u32,
        /// Proof envelope as hex.
        #[arg(long, conflicts_with_all = ["total", "observed"])]
        proof: Option<String>,
        /// Total quantity, to prove locally.
        #[arg(long, requires = "observed")]
        total: Option<u64>,
        /// Observed quantity, to prove locally.
        #[arg(long, requires = "total")]
        observed: Option<u64>,
    },

    /// Print a claim record.
    Claim {
        #[arg(long)]
        claim_id: u64,
    },

    /// Print the lifecycle status of a claim.
    Status {
        #[arg(long)]
        claim_id: u64,
    },

    /// Print a submitter's reputation. Defaults to the local identity.
    Reputation {
        #[arg(long)]
        submitter: Option<String>,
    },

    /// Print a submitter's bounty winnings. Defaults to the local identity.
    Balance {
        #[arg(long)]
        submitter: Option<String>,
    },

    /// Escrow a bounty funded by the local identity.
    Fund {
        /// Free-form identifier of what the bounty is for.
        #[arg(long)]
        target: String,
        /// Reward paid to the first verified claim, in TLX.
        #[arg(long)]
        reward: String,
        /// Amount escrowed, in TLX. Defaults to the reward.
        #[arg(long)]
        escrow: Option<String>,
    },

    /// Print a bounty record.
    Bounty {
        #[arg(long)]
        bounty_id: u64,
    },

    /// List open bounties.
    Bounties,

    /// List the newest claims.
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Print ledger counters.
    Stats,

    /// Print the node's proof-system parameters.
    Info,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct CommitmentArg {
    /// Document to commit to.
    #[arg(long)]
    document: Option<PathBuf>,
    /// Commitment as hex (64 chars, optional 0x).
    #[arg(long)]
    commitment: Option<String>,
}

impl CommitmentArg {
    fn resolve(&self) -> anyhow::Result<Commitment> {
        match (&self.document, &self.commitment) {
            (Some(path), _) => commit_file(path),
            (None, Some(hex)) => Commitment::from_hex(hex).context("parsing commitment"),
            (None, None) => bail!("either --document or --commitment is required"),
        }
    }
}

/// On-disk submitter identity.
#[derive(Serialize, Deserialize)]
struct Identity {
    submitter: String,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn,tallyx_client=info")
        .init();

    let args = Args::parse();
    let identity = expand_tilde(&args.identity);
    let keys_dir = expand_tilde(&args.keys_dir);
    let client = TallyxRpcClient::new(&args.rpc);

    match args.command {
        Command::Identity => cmd_identity(&identity),

        Command::Setup => cmd_setup(&keys_dir),

        Command::Commit { document } => {
            let commitment = commit_file(&document)?;
            println!("{}", commitment.to_hex());
            Ok(())
        }

        Command::Prove { target, threshold, total, observed, out } => {
            let commitment = target.resolve()?;
            let proof = prove(&keys_dir, &commitment, threshold, total, observed)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &proof)
                        .with_context(|| format!("writing proof to {}", path.display()))?;
                    println!("Proof ({} bytes) written to {}", proof.len(), path.display());
                }
                None => println!("{}", hex::encode(&proof)),
            }
            Ok(())
        }

        Command::Submit { target, claim_type, threshold, proof, total, observed } => {
            let submitter = load_identity(&identity)?;
            let commitment = target.resolve()?;
            let proof_hex = match (proof, total, observed) {
                (Some(hex), _, _) => hex,
                (None, Some(total), Some(observed)) => {
                    hex::encode(prove(&keys_dir, &commitment, threshold, total, observed)?)
                }
                _ => bail!("pass --proof, or --total and --observed to prove locally"),
            };
            let claim_id = client
                .submit_claim(
                    &submitter.to_b58(),
                    &commitment.to_hex(),
                    claim_type.as_u8(),
                    threshold,
                    &proof_hex,
                )
                .await?;
            println!("Claim submitted: #{}", claim_id);
            if let Some(status) = client.get_status(claim_id).await? {
                println!("Status:   {}", status.description);
            }
            Ok(())
        }

        Command::Claim { claim_id } => {
            match client.get_claim(claim_id).await? {
                Some(claim) => print_claim(&claim),
                None => println!("Claim #{} not found", claim_id),
            }
            Ok(())
        }

        Command::Status { claim_id } => {
            match client.get_status(claim_id).await? {
                Some(status) => {
                    println!("{}", status.summary);
                    println!("Status:   {}", status.description);
                }
                None => println!("Claim #{} not found", claim_id),
            }
            Ok(())
        }

        Command::Reputation { submitter } => {
            let addr = submitter_or_identity(submitter, &identity)?;
            match client.get_reputation(&addr).await? {
                Some(rep) => {
                    println!("Submitter:  {}", rep.submitter);
                    println!("Score:      {}", rep.score);
                    println!("Correct:    {} / {}", rep.correct_count, rep.total_count);
                    println!("Last seen:  {}", rep.last_activity_at);
                }
                None => println!("No claims from {}", addr),
            }
            Ok(())
        }

        Command::Balance { submitter } => {
            let addr = submitter_or_identity(submitter, &identity)?;
            let bal = client.get_balance(&addr).await?;
            println!("Submitter:  {}", addr);
            println!("Balance:    {} TLX  ({} units)", format_tokens(bal), bal);
            Ok(())
        }

        Command::Fund { target, reward, escrow } => {
            let funder = load_identity(&identity)?;
            let reward = parse_tokens(&reward)?;
            let escrowed = match escrow {
                Some(e) => parse_tokens(&e)?,
                None => reward,
            };
            let bounty_id = client
                .fund_bounty(&funder.to_b58(), &target, reward, escrowed)
                .await?;
            println!("Bounty funded: #{}", bounty_id);
            Ok(())
        }

        Command::Bounty { bounty_id } => {
            match client.get_bounty(bounty_id).await? {
                Some(b) => {
                    println!("Bounty #{} for {}", b.bounty_id, b.target_id);
                    println!("  Reward:   {} TLX", b.reward_tlx);
                    println!("  Escrowed: {} units", b.escrowed_units);
                    println!("  Funder:   {}", b.funder);
                    match b.winner {
                        Some(w) => println!("  Winner:   {}", w),
                        None if b.active => println!("  Open"),
                        None => println!("  Closed"),
                    }
                    if let Some(summary) = b.summary {
                        println!("  {}", summary);
                    }
                }
                None => println!("Bounty #{} not found", bounty_id),
            }
            Ok(())
        }

        Command::Bounties => {
            let bounties = client.get_active_bounties().await?;
            if bounties.is_empty() {
                println!("No open bounties");
            }
            for b in bounties {
                println!("#{:<6} {:<24} {} TLX", b.bounty_id, b.target_id, b.reward_tlx);
            }
            Ok(())
        }

        Command::Recent { limit } => {
            let limit = limit.min(MAX_LIST_LIMIT);
            for claim in client.get_recent_claims(limit).await? {
                println!(
                    "#{:<6} {:<20} {:>3}%  {:<10} {}",
                    claim.claim_id, claim.claim_type, claim.threshold, claim.status, claim.commitment
                );
            }
            Ok(())
        }

        Command::Stats => {
            let s = client.get_stats().await?;
            println!("Claims verified:   {}", s.claims_verified);
            println!("Claims rejected:   {}", s.claims_rejected);
            println!("Submitters:        {}", s.submitters);
            println!("Bounties funded:   {}", s.bounties_funded);
            println!("Bounties claimed:  {}", s.bounties_claimed);
            Ok(())
        }

        Command::Info => {
            let info = client.get_verifier_info().await?;
            println!("Node version:   {}", info.node_version);
            println!("Protocol:       {} over {}", info.protocol, info.curve);
            println!("Field modulus:  {}", info.field_modulus);
            println!("VK digest:      {}", info.vk_digest);
            println!("Public signals: {}", info.public_signals);
            println!("Proof size:     {}..={} bytes", info.min_proof_bytes, info.max_proof_bytes);
            println!("Threshold:      {}..={}%", info.min_threshold, info.max_threshold);
            Ok(())
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_identity(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!(
            "Identity file {} already exists. Delete it first to create a new identity.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let id = SubmitterId::from_bytes(rand::random::<[u8; 32]>());
    let json = serde_json::to_string_pretty(&Identity { submitter: id.to_b58() })?;
    std::fs::write(path, &json)
        .with_context(|| format!("writing identity to {}", path.display()))?;

    println!("Generated new identity.");
    println!("Submitter: {}", id.to_b58());
    println!("File:      {}", path.display());
    Ok(())
}

fn cmd_setup(keys_dir: &Path) -> anyhow::Result<()> {
    if ThresholdKeys::exist_in(keys_dir) {
        bail!(
            "Threshold keys already exist in {}. Delete them first to run a new setup.",
            keys_dir.display()
        );
    }
    info!("Running threshold circuit setup...");
    let keys = ThresholdKeys::generate(&mut rand::rngs::OsRng).context("generating keys")?;
    keys.save(keys_dir)
        .with_context(|| format!("writing keys to {}", keys_dir.display()))?;

    println!("Threshold keys written to {}", keys_dir.display());
    println!("VK digest: {}", hex::encode(vk_digest(&keys.verifying_key)));
    println!("\nSingle-party setup: anyone holding the toxic waste can forge proofs.");
    println!("Use for development only; a node must be started with the same keys.");
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn prove(
    keys_dir: &Path,
    commitment: &Commitment,
    threshold: u32,
    total: u64,
    observed: u64,
) -> anyhow::Result<Vec<u8>> {
    let keys = ThresholdKeys::load(keys_dir)
        .with_context(|| format!("loading threshold keys from {}", keys_dir.display()))?;
    info!("Proving threshold {}% for {}...", threshold, commitment);
    let [commitment_field, threshold_field] =
        encode_public_inputs(commitment, check_threshold(threshold)?);
    info!(
        commitment = %field_to_decimal(&commitment_field),
        threshold = %field_to_decimal(&threshold_field),
        "public signals"
    );
    let envelope = prove_threshold(
        &keys.proving_key,
        commitment,
        threshold,
        total,
        observed,
        &mut rand::rngs::OsRng,
    )
    .context("generating proof")?;
    Ok(envelope.to_bytes()?)
}

fn commit_file(path: &Path) -> anyhow::Result<Commitment> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading document {}", path.display()))?;
    Ok(Commitment::of_document(&bytes))
}

fn load_identity(path: &Path) -> anyhow::Result<SubmitterId> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading identity {} (run `tallyx-client identity`)", path.display()))?;
    let identity: Identity = serde_json::from_str(&json).context("parsing identity file")?;
    Ok(SubmitterId::from_b58(&identity.submitter)?)
}

fn submitter_or_identity(submitter: Option<String>, identity: &Path) -> anyhow::Result<String> {
    match submitter {
        Some(s) => Ok(s),
        None => Ok(load_identity(identity)?.to_b58()),
    }
}

fn print_claim(claim: &RpcClaim) {
    println!("Claim #{}", claim.claim_id);
    println!("  Type:       {} ({})", claim.claim_type, claim.claim_type_code);
    println!("  Threshold:  {}%", claim.threshold);
    println!("  Commitment: {}", claim.commitment);
    println!("  Submitter:  {}", claim.submitter);
    println!("  Created:    {}", claim.created_at);
    println!("  Status:     {}", claim.status);
    println!("  Proof:      {} bytes", claim.proof_bytes);
}

fn parse_claim_type(s: &str) -> Result<ClaimType, String> {
    if let Ok(code) = s.parse::<u8>() {
        return ClaimType::from_u8(code).map_err(|e| e.to_string());
    }
    (0u8..4)
        .filter_map(|code| ClaimType::from_u8(code).ok())
        .find(|t| t.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown claim type {s:?}"))
}

/// Parse a decimal TLX amount into base units without going through floats.
fn parse_tokens(s: &str) -> anyhow::Result<u128> {
    let s = s.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        bail!("amount {s:?} must be plain decimal digits");
    }
    if frac.len() > 6 {
        bail!("at most 6 decimal places allowed in {s:?}");
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().context("parsing amount")? };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<6}").parse().context("parsing amount")?
    };
    whole
        .checked_mul(UNITS_PER_TOKEN)
        .and_then(|w| w.checked_add(frac_units))
        .context("amount overflows")
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_exactly() {
        assert_eq!(parse_tokens("1").unwrap(), UNITS_PER_TOKEN);
        assert_eq!(parse_tokens("1.5").unwrap(), 1_500_000);
        assert_eq!(parse_tokens("0.000001").unwrap(), 1);
        assert_eq!(parse_tokens(".25").unwrap(), 250_000);
        assert!(parse_tokens("0.0000001").is_err());
        assert!(parse_tokens("-1").is_err());
        assert!(parse_tokens("abc").is_err());
        assert!(parse_tokens("1.+5").is_err());
        assert!(parse_tokens("+1").is_err());
        assert!(parse_tokens("1.-5").is_err());
        assert!(parse_tokens(".").is_err());
        assert!(parse_tokens("").is_err());
    }

    #[test]
    fn claim_types_by_code_or_name() {
        assert_eq!(parse_claim_type("0").unwrap(), ClaimType::InsiderSelling);
        assert_eq!(parse_claim_type("executive_exit").unwrap(), ClaimType::ExecutiveExit);
        assert_eq!(parse_claim_type("INSIDER_BUYING").unwrap(), ClaimType::InsiderBuying);
        assert!(parse_claim_type("4").is_err());
        assert!(parse_claim_type("BULLISH").is_err());
    }

    #[test]
    fn commitment_arg_prefers_document() {
        let dir = std::env::temp_dir().join(format!("tallyx_client_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let doc = dir.join("filing.txt");
        std::fs::write(&doc, b"filing body").unwrap();

        let arg = CommitmentArg { document: Some(doc), commitment: None };
        assert_eq!(arg.resolve().unwrap(), Commitment::of_document(b"filing body"));

        let hex = Commitment::of_document(b"x").to_hex();
        let arg = CommitmentArg { document: None, commitment: Some(hex.clone()) };
        assert_eq!(arg.resolve().unwrap().to_hex(), hex);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
