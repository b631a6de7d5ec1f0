pub mod bounty;
pub mod db;
pub mod events;
pub mod ledger;
pub mod query;
pub mod reputation;

pub use bounty::BountyMarket;
pub use db::StateDb;
pub use events::EventBus;
pub use ledger::ClaimLedger;
pub use query::ClaimQuery;
pub use reputation::ReputationEngine;
