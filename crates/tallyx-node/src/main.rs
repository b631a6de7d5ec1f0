//! tallyx-node — the TallyX ledger node.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Load the Groth16 verifying key, running a setup on first run
//!   3. Build the proof verifier and the claim ledger
//!   4. Start the JSON-RPC 2.0 server
//!   5. Log ledger events until shutdown

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use tallyx_core::event::LedgerEvent;
use tallyx_rpc::{RpcServer, RpcServerState};
use tallyx_state::{ClaimLedger, StateDb};
use tallyx_zk::{has_verifying_key, load_verifying_key, ProofVerifier, ThresholdKeys};

#[derive(Parser, Debug)]
#[command(
    name = "tallyx-node",
    version,
    about = "TallyX node — verifiable threshold claims over committed documents"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.tallyx/data")]
    data_dir: PathBuf,

    /// Directory holding the threshold verifying key. The proving key is
    /// written here too when the node runs its own setup.
    #[arg(long, default_value = "~/.tallyx/keys")]
    keys_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tallyx=debug".into()),
        )
        .init();

    let args = Args::parse();
    info!("TallyX node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    info!(claims = db.claim_count(), "state database open");

    // ── Proof system ──────────────────────────────────────────────────────────
    let keys_dir = expand_tilde(&args.keys_dir);
    let verifier = load_or_generate_verifier(&keys_dir)?;
    info!(vk = %hex::encode(verifier.vk_digest()), "verifier ready");

    let ledger = Arc::new(ClaimLedger::new(Arc::clone(&db), verifier));

    // ── Event log ─────────────────────────────────────────────────────────────
    let mut events = ledger.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event logger lagged behind the ledger")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        ledger: Arc::clone(&ledger),
    });
    let rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!("node ready");
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listening for shutdown signal")?;
            info!("shutdown requested");
            let _ = rpc_handle.stop();
        }
        _ = rpc_handle.clone().stopped() => {
            warn!("RPC server stopped");
        }
    }

    db.flush().context("flushing state database")?;
    info!("node stopped");
    Ok(())
}

/// Build the verifier from the verifying key in `dir`, or run a fresh setup
/// if there is none. A published verifying key alone is enough.
///
/// # Warning
/// Generated keys come from a single-party setup: whoever ran it can forge
/// proofs. Only use this for local development and testing.
fn load_or_generate_verifier(dir: &Path) -> anyhow::Result<ProofVerifier> {
    let vk = if has_verifying_key(dir) {
        info!(dir = %dir.display(), "loading verifying key");
        load_verifying_key(dir)
            .with_context(|| format!("loading verifying key from {}", dir.display()))?
    } else {
        warn!(
            dir = %dir.display(),
            "No threshold keys found. Running an ephemeral single-party setup — DO NOT USE IN PRODUCTION."
        );
        let keys =
            ThresholdKeys::generate(&mut rand::rngs::OsRng).context("generating threshold keys")?;
        keys.save(dir)
            .with_context(|| format!("writing threshold keys to {}", dir.display()))?;
        keys.verifying_key
    };
    ProofVerifier::new(&vk).context("preparing verifying key")
}

fn log_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::ClaimRejected { .. } => warn!(%event, "ledger event"),
        _ => info!(%event, "ledger event"),
    }
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
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
    use rand::{rngs::StdRng, SeedableRng};
    use tallyx_zk::keys::PROVING_KEY_FILE;
    use tallyx_zk::vk_digest;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tallyx_node_test_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn verifying_key_alone_is_enough() {
        let dir = temp_dir("vk_only");
        let keys = ThresholdKeys::generate(&mut StdRng::seed_from_u64(5)).unwrap();
        keys.save(&dir).unwrap();
        std::fs::remove_file(dir.join(PROVING_KEY_FILE)).unwrap();

        let verifier = load_or_generate_verifier(&dir).unwrap();
        assert_eq!(verifier.vk_digest(), vk_digest(&keys.verifying_key));
        // No setup ran, so no proving key reappeared.
        assert!(!dir.join(PROVING_KEY_FILE).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_key_dir_runs_setup_once() {
        let dir = temp_dir("bootstrap");
        let first = load_or_generate_verifier(&dir).unwrap();
        assert!(ThresholdKeys::exist_in(&dir));

        let second = load_or_generate_verifier(&dir).unwrap();
        assert_eq!(first.vk_digest(), second.vk_digest());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = std::env::var("HOME").unwrap();
        assert_eq!(
            expand_tilde(Path::new("~/.tallyx/data")),
            PathBuf::from(home).join(".tallyx/data")
        );
        assert_eq!(expand_tilde(Path::new("/var/lib/tallyx")), PathBuf::from("/var/lib/tallyx"));
    }
}
