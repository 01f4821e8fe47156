// Club Ledger - Core Library
// Members, their monthly contributions, and the HTTP API over them

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use db::{setup_database, Database};
pub use entities::{Contribution, Member, MemberContribution, MemberPatch, NewContribution, NewMember};
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;

#[cfg(feature = "server")]
pub use api::{router, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
