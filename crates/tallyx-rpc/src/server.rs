use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use tallyx_core::claim::ClaimType;
use tallyx_core::error::TallyxError;
use tallyx_core::types::{Balance, Commitment, SubmitterId};
use tallyx_state::{ClaimLedger, ClaimQuery};

use crate::api::TallyxApiServer;
use crate::types::{
    RpcBounty, RpcClaim, RpcClaimStatus, RpcReputation, RpcStats, RpcVerifierInfo,
};

const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Caller mistakes map to invalid-params, node faults to internal-error.
/// The error kind travels in `data` so clients can branch on it.
fn ledger_err(e: TallyxError) -> ErrorObject<'static> {
    let code = if e.is_caller_error() {
        INVALID_PARAMS
    } else {
        INTERNAL_ERROR
    };
    ErrorObject::owned(code, e.to_string(), Some(e.kind()))
}

fn parse_submitter(s: &str) -> Result<SubmitterId, ErrorObject<'static>> {
    SubmitterId::from_b58(s).map_err(|e| rpc_err(INVALID_PARAMS, e.to_string()))
}

fn parse_amount(s: &str, field: &str) -> Result<Balance, ErrorObject<'static>> {
    s.trim()
        .parse::<Balance>()
        .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid {field}: {e}")))
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub ledger: Arc<ClaimLedger>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS, so browser
    /// front-ends can call it directly. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let middleware = ServiceBuilder::new().layer(CorsLayer::permissive());
        let server = Server::builder()
            .set_http_middleware(middleware)
            .build(addr)
            .await?;
        let bound = server.local_addr()?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(addr = %bound, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl TallyxApiServer for RpcServer {
    async fn submit_claim(
        &self,
        submitter: String,
        commitment: String,
        claim_type: u8,
        threshold: u32,
        proof_hex: String,
    ) -> RpcResult<u64> {
        let submitter = parse_submitter(&submitter)?;
        let commitment = Commitment::from_hex(&commitment).map_err(ledger_err)?;
        let claim_type = ClaimType::from_u8(claim_type).map_err(ledger_err)?;
        let proof = hex::decode(proof_hex.trim_start_matches("0x"))
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid proof hex: {e}")))?;

        debug!(submitter = %submitter, commitment = %commitment, threshold, "RPC: submitClaim");

        // Verification is CPU-bound; keep it off the async workers.
        let ledger = self.state.ledger.clone();
        let result = tokio::task::spawn_blocking(move || {
            ledger.submit(&submitter, &commitment, claim_type, threshold, &proof, now())
        })
        .await
        .map_err(|e| rpc_err(INTERNAL_ERROR, format!("submit task failed: {e}")))?;

        Ok(result.map_err(ledger_err)?)
    }

    async fn get_claim(&self, claim_id: u64) -> RpcResult<Option<RpcClaim>> {
        let claim = self
            .state
            .ledger
            .get_claim(claim_id)
            .map_err(ledger_err)?;
        Ok(claim.as_ref().map(RpcClaim::from))
    }

    async fn get_status(&self, claim_id: u64) -> RpcResult<Option<RpcClaimStatus>> {
        let query = ClaimQuery::new(&self.state.ledger.db);
        let status = match query.status(claim_id) {
            Ok(status) => status,
            Err(TallyxError::ClaimNotFound(_)) => return Ok(None),
            Err(e) => return Err(ledger_err(e)),
        };
        Ok(Some(RpcClaimStatus {
            claim_id,
            status: status.as_str().to_string(),
            description: status.describe().to_string(),
            terminal: status.is_terminal(),
            summary: query.describe(claim_id).map_err(ledger_err)?,
        }))
    }

    async fn get_reputation(&self, submitter: String) -> RpcResult<Option<RpcReputation>> {
        let id = parse_submitter(&submitter)?;
        let rec = self
            .state
            .ledger
            .get_reputation(&id)
            .map_err(ledger_err)?;
        Ok(rec.as_ref().map(RpcReputation::from))
    }

    async fn get_bounty(&self, bounty_id: u64) -> RpcResult<Option<RpcBounty>> {
        let bounty = self
            .state
            .ledger
            .get_bounty(bounty_id)
            .map_err(ledger_err)?;
        let Some(bounty) = bounty else {
            return Ok(None);
        };
        let summary = ClaimQuery::new(&self.state.ledger.db)
            .describe_bounty(bounty_id)
            .map_err(ledger_err)?;
        Ok(Some(RpcBounty {
            summary: Some(summary),
            ..RpcBounty::from(&bounty)
        }))
    }

    async fn fund_bounty(
        &self,
        funder: String,
        target_id: String,
        reward: String,
        escrowed: String,
    ) -> RpcResult<u64> {
        let funder = parse_submitter(&funder)?;
        let reward = parse_amount(&reward, "reward")?;
        let escrowed = parse_amount(&escrowed, "escrowed")?;
        let id = self
            .state
            .ledger
            .fund_bounty(&funder, &target_id, reward, escrowed, now())
            .map_err(ledger_err)?;
        Ok(id)
    }

    async fn get_balance(&self, submitter: String) -> RpcResult<String> {
        let id = parse_submitter(&submitter)?;
        let balance = self
            .state
            .ledger
            .get_balance(&id)
            .map_err(ledger_err)?;
        Ok(balance.to_string())
    }

    async fn get_recent_claims(&self, limit: u32) -> RpcResult<Vec<RpcClaim>> {
        let claims = self
            .state
            .ledger
            .recent_claims(limit)
            .map_err(ledger_err)?;
        Ok(claims.iter().map(RpcClaim::from).collect())
    }

    async fn get_active_bounties(&self) -> RpcResult<Vec<RpcBounty>> {
        let bounties = self
            .state
            .ledger
            .active_bounties()
            .map_err(ledger_err)?;
        Ok(bounties.iter().map(RpcBounty::from).collect())
    }

    async fn get_stats(&self) -> RpcResult<RpcStats> {
        let stats = self.state.ledger.stats().map_err(ledger_err)?;
        Ok(stats.into())
    }

    async fn get_verifier_info(&self) -> RpcResult<RpcVerifierInfo> {
        let info = self.state.ledger.verifier_info();
        Ok(RpcVerifierInfo {
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol: info.protocol,
            curve: info.curve,
            field_modulus: info.field_modulus,
            vk_digest: info.vk_digest,
            public_signals: info.public_signals,
            min_proof_bytes: info.min_proof_bytes,
            max_proof_bytes: info.max_proof_bytes,
            min_threshold: info.min_threshold,
            max_threshold: info.max_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_invalid_params() {
        let e = ledger_err(TallyxError::InvalidThreshold { got: 0 });
        assert_eq!(e.code(), INVALID_PARAMS);
        let e = ledger_err(TallyxError::BindingMismatch { field: "threshold_field" });
        assert_eq!(e.code(), INVALID_PARAMS);
        assert!(e.data().unwrap().get().contains("BindingMismatch"));
    }

    #[test]
    fn node_faults_are_internal() {
        let e = ledger_err(TallyxError::Storage("disk full".into()));
        assert_eq!(e.code(), INTERNAL_ERROR);
        assert_eq!(e.message(), "storage error: disk full");
    }

    #[test]
    fn amounts_parse_as_u128() {
        assert_eq!(parse_amount(" 1000000 ", "reward").unwrap(), 1_000_000);
        assert!(parse_amount("-1", "reward").is_err());
        assert!(parse_amount("1.5", "reward").is_err());
    }
}
