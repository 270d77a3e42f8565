#![doc(test(attr(deny(warnings))))]

//! IFO Ledger keeps a personal-finance transaction table in a JSON store,
//! answers filter and sum queries over it, applies edits by row index, and
//! protects the store file with dated daily backups.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod query;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::{LedgerManager, OpenOutcome, SummaryService};
pub use errors::{LedgerError, Result};
pub use ledger::{MergeReport, RecordMutator, RowIndex, Table, Transaction, TransactionType};
pub use query::{FilterValue, PredicateSet};
pub use storage::{BackupManager, JsonLedgerStore, Snapshot, StorageBackend};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("IFO Ledger tracing initialized.");
    });
}
