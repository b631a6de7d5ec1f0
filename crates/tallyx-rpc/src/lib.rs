//! tallyx-rpc
//!
//! JSON-RPC 2.0 server for TallyX nodes.
//!
//! Namespace: "tallyx"
//! Methods:
//!   tallyx_submitClaim       — submit a threshold claim with its proof
//!   tallyx_getClaim          — claim by id
//!   tallyx_getStatus         — lifecycle status + description
//!   tallyx_getReputation     — submitter reputation record
//!   tallyx_getBounty         — bounty by id
//!   tallyx_fundBounty        — escrow a new bounty
//!   tallyx_getBalance        — bounty winnings of a submitter
//!   tallyx_getRecentClaims   — newest claims
//!   tallyx_getActiveBounties — open bounties
//!   tallyx_getStats          — ledger counters
//!   tallyx_getVerifierInfo   — proof-system parameters

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{
    RpcBounty, RpcClaim, RpcClaimStatus, RpcReputation, RpcStats, RpcVerifierInfo,
};
