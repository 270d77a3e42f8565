pub mod backup;
pub mod json_backend;

use std::path::Path;

use crate::{errors::Result, ledger::Table};

/// Abstraction over the persisted table.
pub trait StorageBackend: Send + Sync {
    /// Reads the persisted table, failing with `StoreUnavailable` when the
    /// document is missing or does not parse.
    fn load(&self) -> Result<Table>;
    /// Replaces the persisted table with `table`, all-or-nothing.
    fn save(&mut self, table: &Table) -> Result<()>;
    /// Cached table if one is held, otherwise [`StorageBackend::load`].
    fn get_all(&mut self) -> Result<Table>;
    /// Drops any cached table so the next read goes to disk.
    fn invalidate(&mut self);
    fn store_path(&self) -> &Path;
}

pub use backup::{BackupManager, Snapshot};
pub use json_backend::JsonLedgerStore;
