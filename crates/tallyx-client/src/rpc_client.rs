use anyhow::{bail, Context};
use serde::de::DeserializeOwned;

use tallyx_rpc::{RpcBounty, RpcClaim, RpcClaimStatus, RpcReputation, RpcStats, RpcVerifierInfo};

/// Plain JSON-RPC 2.0 client used by the CLI to talk to a running node.
///
/// Uses raw HTTP POST with serde_json rather than the jsonrpsee client.
pub struct TallyxRpcClient {
    url: String,
    client: reqwest::Client,
}

impl TallyxRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            let message = err["message"].as_str().unwrap_or("unknown error");
            match err["data"].as_str() {
                Some(kind) => bail!("{method} failed ({kind}): {message}"),
                None => bail!("{method} failed: {message}"),
            }
        }

        Ok(json["result"].clone())
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).with_context(|| format!("parsing {method} response"))
    }

    /// Submit a claim with its hex proof envelope. Returns the claim id.
    pub async fn submit_claim(
        &self,
        submitter: &str,
        commitment: &str,
        claim_type: u8,
        threshold: u32,
        proof_hex: &str,
    ) -> anyhow::Result<u64> {
        self.call_as(
            "tallyx_submitClaim",
            serde_json::json!([submitter, commitment, claim_type, threshold, proof_hex]),
        )
        .await
    }

    pub async fn get_claim(&self, claim_id: u64) -> anyhow::Result<Option<RpcClaim>> {
        self.call_as("tallyx_getClaim", serde_json::json!([claim_id])).await
    }

    pub async fn get_status(&self, claim_id: u64) -> anyhow::Result<Option<RpcClaimStatus>> {
        self.call_as("tallyx_getStatus", serde_json::json!([claim_id])).await
    }

    pub async fn get_reputation(&self, submitter: &str) -> anyhow::Result<Option<RpcReputation>> {
        self.call_as("tallyx_getReputation", serde_json::json!([submitter]))
            .await
    }

    pub async fn get_bounty(&self, bounty_id: u64) -> anyhow::Result<Option<RpcBounty>> {
        self.call_as("tallyx_getBounty", serde_json::json!([bounty_id])).await
    }

    /// Escrow a bounty. Amounts are in base units. Returns the bounty id.
    pub async fn fund_bounty(
        &self,
        funder: &str,
        target_id: &str,
        reward: u128,
        escrowed: u128,
    ) -> anyhow::Result<u64> {
        self.call_as(
            "tallyx_fundBounty",
            serde_json::json!([funder, target_id, reward.to_string(), escrowed.to_string()]),
        )
        .await
    }

    /// Bounty winnings in base units.
    pub async fn get_balance(&self, submitter: &str) -> anyhow::Result<u128> {
        let result = self
            .call("tallyx_getBalance", serde_json::json!([submitter]))
            .await?;
        let bal_str = result.as_str().context("expected string balance")?;
        let bal: u128 = bal_str.parse().context("parsing balance")?;
        Ok(bal)
    }

    pub async fn get_recent_claims(&self, limit: u32) -> anyhow::Result<Vec<RpcClaim>> {
        self.call_as("tallyx_getRecentClaims", serde_json::json!([limit]))
            .await
    }

    pub async fn get_active_bounties(&self) -> anyhow::Result<Vec<RpcBounty>> {
        self.call_as("tallyx_getActiveBounties", serde_json::json!([]))
            .await
    }

    pub async fn get_stats(&self) -> anyhow::Result<RpcStats> {
        self.call_as("tallyx_getStats", serde_json::json!([])).await
    }

    pub async fn get_verifier_info(&self) -> anyhow::Result<RpcVerifierInfo> {
        self.call_as("tallyx_getVerifierInfo", serde_json::json!([]))
            .await
    }
}
