//! Collaborator-facing facade and read-model services.

pub mod ledger_manager;
pub mod services;

pub use ledger_manager::{LedgerManager, OpenOutcome};
pub use services::SummaryService;
