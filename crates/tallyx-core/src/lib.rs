pub mod claim;
pub mod constants;
pub mod error;
pub mod event;
pub mod records;
pub mod types;

pub use claim::*;
pub use constants::*;
pub use error::TallyxError;
pub use event::LedgerEvent;
pub use records::*;
pub use types::*;
