//! End-to-end smoke test for tallyx-node.
//!
//! Starts a real node process with empty data and key directories, proves a
//! claim locally against the keys the node generated, and drives the ledger
//! over JSON-RPC.
//!
//! Run with:
//!   cargo test -p tallyx-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tallyx_core::constants::UNITS_PER_TOKEN;
use tallyx_core::types::{Commitment, SubmitterId};
use tallyx_zk::{prove_threshold, ThresholdKeys};

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    root_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.root_dir);
    }
}

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_raw(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    resp.json().await.expect("parse RPC JSON")
}

async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let json = rpc_raw(client, url, method, params).await;
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

/// Call `method` expecting an error; returns the error object.
async fn rpc_error(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let json = rpc_raw(client, url, method, params).await;
    match json.get("error") {
        Some(err) => err.clone(),
        None => panic!("expected error from {method}, got {}", json["result"]),
    }
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "tallyx_getVerifierInfo",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

fn random_submitter() -> SubmitterId {
    SubmitterId::from_bytes(rand::random::<[u8; 32]>())
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_prove_submit_and_award() {
    // ── 1. Start node on fresh directories ────────────────────────────────────
    let root_dir = std::env::temp_dir().join(format!("tallyx_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root_dir);
    std::fs::create_dir_all(&root_dir).unwrap();
    let data_dir = root_dir.join("state");
    let keys_dir = root_dir.join("keys");

    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);

    let node_bin = env!("CARGO_BIN_EXE_tallyx-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir", data_dir.to_str().unwrap(),
            "--keys-dir", keys_dir.to_str().unwrap(),
            "--rpc-addr", &format!("127.0.0.1:{}", rpc_port),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn tallyx-node");

    let _guard = NodeGuard { child, root_dir };

    // Key generation happens before the RPC server binds, so allow for a slow
    // unoptimised setup.
    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(120)).await,
        "tallyx-node did not become ready within 120 seconds"
    );

    let info = rpc_call(&http, &rpc_url, "tallyx_getVerifierInfo", serde_json::json!([])).await;
    assert_eq!(info["protocol"], "groth16");
    assert_eq!(info["public_signals"], 2);

    // ── 2. Fund a bounty ──────────────────────────────────────────────────────
    let funder = random_submitter();
    let reward = UNITS_PER_TOKEN.to_string();
    let bounty_id = rpc_call(
        &http,
        &rpc_url,
        "tallyx_fundBounty",
        serde_json::json!([funder.to_b58(), "CIK-0000320193", reward, reward]),
    )
    .await
    .as_u64()
    .expect("bounty id");

    // ── 3. Prove locally with the node's keys and submit ──────────────────────
    let keys = ThresholdKeys::load(&keys_dir).expect("node wrote threshold keys");
    let commitment = Commitment::of_document(b"10-K filing: 75 of 100 insider trades were sales");
    let envelope = prove_threshold(
        &keys.proving_key,
        &commitment,
        60,
        100,
        75,
        &mut rand::rngs::OsRng,
    )
    .expect("prove");
    let proof_hex = hex::encode(&envelope.to_bytes().expect("encode envelope"));

    let alice = random_submitter();
    let claim_id = rpc_call(
        &http,
        &rpc_url,
        "tallyx_submitClaim",
        serde_json::json!([alice.to_b58(), commitment.to_hex(), 0, 60, proof_hex]),
    )
    .await
    .as_u64()
    .expect("claim id");

    // ── 4. Check the resulting state ──────────────────────────────────────────
    let status = rpc_call(&http, &rpc_url, "tallyx_getStatus", serde_json::json!([claim_id])).await;
    assert_eq!(status["status"], "Finalized");
    assert_eq!(status["terminal"], true);
    assert!(status["summary"].as_str().unwrap().starts_with("Claim #"));

    let rep = rpc_call(
        &http,
        &rpc_url,
        "tallyx_getReputation",
        serde_json::json!([alice.to_b58()]),
    )
    .await;
    assert_eq!(rep["score"], 802);
    assert_eq!(rep["correct_count"], 1);

    let balance = rpc_call(&http, &rpc_url, "tallyx_getBalance", serde_json::json!([alice.to_b58()])).await;
    assert_eq!(balance.as_str().unwrap(), reward);

    let bounty = rpc_call(&http, &rpc_url, "tallyx_getBounty", serde_json::json!([bounty_id])).await;
    assert_eq!(bounty["claimed"], true);
    assert_eq!(bounty["winner"], alice.to_b58());
    assert!(bounty["summary"].as_str().unwrap().contains("awarded to"));

    // ── 5. Caller errors ──────────────────────────────────────────────────────
    let dup = rpc_error(
        &http,
        &rpc_url,
        "tallyx_submitClaim",
        serde_json::json!([random_submitter().to_b58(), commitment.to_hex(), 0, 60, proof_hex]),
    )
    .await;
    assert_eq!(dup["code"], -32602);
    assert_eq!(dup["data"], "DuplicateCommitment");

    let other = Commitment::of_document(b"another filing");
    let bad_threshold = rpc_error(
        &http,
        &rpc_url,
        "tallyx_submitClaim",
        serde_json::json!([alice.to_b58(), other.to_hex(), 0, 101, proof_hex]),
    )
    .await;
    assert_eq!(bad_threshold["data"], "InvalidThreshold");

    let missing = rpc_call(&http, &rpc_url, "tallyx_getStatus", serde_json::json!([9_999])).await;
    assert!(missing.is_null());

    let stats = rpc_call(&http, &rpc_url, "tallyx_getStats", serde_json::json!([])).await;
    assert_eq!(stats["claims_verified"], 1);
    assert_eq!(stats["bounties_claimed"], 1);
}

