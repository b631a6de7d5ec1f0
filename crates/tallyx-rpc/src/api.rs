use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{
    RpcBounty, RpcClaim, RpcClaimStatus, RpcReputation, RpcStats, RpcVerifierInfo,
};

/// TallyX JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "tallyx_" via `namespace = "tallyx"`.
#[rpc(server, namespace = "tallyx")]
pub trait TallyxApi {
    /// Submit a threshold claim. `proof_hex` is the hex-encoded proof
    /// envelope. Returns the new claim id; verification failures are
    /// returned as errors after the rejected claim has been recorded.
    #[method(name = "submitClaim")]
    async fn submit_claim(
        &self,
        submitter: String,
        commitment: String,
        claim_type: u8,
        threshold: u32,
        proof_hex: String,
    ) -> RpcResult<u64>;

    #[method(name = "getClaim")]
    async fn get_claim(&self, claim_id: u64) -> RpcResult<Option<RpcClaim>>;

    /// Lifecycle status and its description.
    #[method(name = "getStatus")]
    async fn get_status(&self, claim_id: u64) -> RpcResult<Option<RpcClaimStatus>>;

    /// Reputation record by base-58 submitter id.
    #[method(name = "getReputation")]
    async fn get_reputation(&self, submitter: String) -> RpcResult<Option<RpcReputation>>;

    #[method(name = "getBounty")]
    async fn get_bounty(&self, bounty_id: u64) -> RpcResult<Option<RpcBounty>>;

    /// Fund a bounty. Amounts are base units as decimal strings.
    #[method(name = "fundBounty")]
    async fn fund_bounty(
        &self,
        funder: String,
        target_id: String,
        reward: String,
        escrowed: String,
    ) -> RpcResult<u64>;

    /// Bounty winnings credited to a submitter, in base units.
    #[method(name = "getBalance")]
    async fn get_balance(&self, submitter: String) -> RpcResult<String>;

    /// Newest claims first. `limit` is capped at 200.
    #[method(name = "getRecentClaims")]
    async fn get_recent_claims(&self, limit: u32) -> RpcResult<Vec<RpcClaim>>;

    /// Open bounties in award order.
    #[method(name = "getActiveBounties")]
    async fn get_active_bounties(&self) -> RpcResult<Vec<RpcBounty>>;

    #[method(name = "getStats")]
    async fn get_stats(&self) -> RpcResult<RpcStats>;

    #[method(name = "getVerifierInfo")]
    async fn get_verifier_info(&self) -> RpcResult<RpcVerifierInfo>;
}
