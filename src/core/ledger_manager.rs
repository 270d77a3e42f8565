use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::{
    config::Config,
    errors::{LedgerError, Result},
    ledger::{MergeReport, RecordMutator, RowIndex, Table, Transaction},
    query::{self, PredicateSet},
    storage::{BackupManager, JsonLedgerStore, Snapshot, StorageBackend},
};

/// How [`LedgerManager::open`] obtained the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Loaded,
    Restored(Snapshot),
}

/// Facade that coordinates the in-memory table, persistence, and backups.
pub struct LedgerManager {
    current: Option<Table>,
    storage: Box<dyn StorageBackend>,
    backups: BackupManager,
    mutator: RecordMutator,
    backup_on_commit: bool,
}

impl LedgerManager {
    pub fn new(storage: Box<dyn StorageBackend>, backups: BackupManager) -> Self {
        Self {
            current: None,
            storage,
            backups,
            mutator: RecordMutator::new(),
            backup_on_commit: true,
        }
    }

    /// Builds a manager for the JSON store described by `config`.
    pub fn from_config(config: &Config, base: &Path) -> Result<Self> {
        config.validate()?;
        let store_path = config.resolve_store_path(base);
        let storage = JsonLedgerStore::with_max_rows(store_path.clone(), config.max_rows);
        let backups = BackupManager::new(store_path, config.resolve_backup_dir(base))
            .with_retention(config.backup_retention);
        Ok(Self {
            mutator: RecordMutator::with_max_rows(config.max_rows),
            backup_on_commit: config.backup_on_commit,
            ..Self::new(Box::new(storage), backups)
        })
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn store_path(&self) -> PathBuf {
        self.storage.store_path().to_path_buf()
    }

    /// Loads the table, restoring the newest backup once if the store is
    /// unavailable.
    ///
    /// A store file that exists but cannot be read is never treated as a
    /// fresh start: without a backup the original `StoreUnavailable` error is
    /// returned. `NoBackupAvailable` means there is neither a store file nor a
    /// snapshot.
    pub fn open(&mut self) -> Result<OpenOutcome> {
        self.storage.invalidate();
        match self.storage.get_all() {
            Ok(table) => {
                self.current = Some(table);
                Ok(OpenOutcome::Loaded)
            }
            Err(err) if err.is_store_unavailable() => {
                tracing::warn!(error = %err, "store unavailable, restoring latest backup");
                let snapshot = match self.backups.restore() {
                    Ok(snapshot) => snapshot,
                    Err(LedgerError::NoBackupAvailable(_)) if self.store_path().exists() => {
                        tracing::error!(
                            path = %self.store_path().display(),
                            "store unreadable and no backup to restore"
                        );
                        return Err(err);
                    }
                    Err(other) => return Err(other),
                };
                self.storage.invalidate();
                self.current = Some(self.storage.get_all()?);
                Ok(OpenOutcome::Restored(snapshot))
            }
            Err(err) => Err(err),
        }
    }

    /// Starts from an empty table without touching the store file.
    pub fn start_empty(&mut self) {
        self.current = Some(Table::new());
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn table(&self) -> Result<&Table> {
        self.current.as_ref().ok_or_else(not_open)
    }

    pub fn table_mut(&mut self) -> Result<&mut Table> {
        self.current.as_mut().ok_or_else(not_open)
    }

    pub fn filter(&self, predicates: &PredicateSet) -> Result<Table> {
        query::filter(self.table()?, predicates)
    }

    pub fn insert(&mut self, record: Transaction) -> Result<RowIndex> {
        let mutator = self.mutator;
        mutator.insert(self.table_mut()?, record)
    }

    pub fn insert_columns(&mut self, columns: &Map<String, Value>) -> Result<RowIndex> {
        let mutator = self.mutator;
        mutator.insert_columns(self.table_mut()?, columns)
    }

    pub fn remove(&mut self, indices: &[RowIndex]) -> Result<usize> {
        let mutator = self.mutator;
        Ok(mutator.remove(self.table_mut()?, indices))
    }

    pub fn merge(&mut self, subset: &Table) -> Result<MergeReport> {
        let mutator = self.mutator;
        mutator.merge(self.table_mut()?, subset)
    }

    /// Takes a same-day backup of the file on disk, then saves the table.
    pub fn commit(&mut self) -> Result<Option<PathBuf>> {
        let table = self.current.as_ref().ok_or_else(not_open)?;
        let snapshot = if self.backup_on_commit {
            self.backups.backup()?
        } else {
            None
        };
        self.storage.save(table)?;
        Ok(snapshot)
    }

    pub fn backup(&self) -> Result<Option<PathBuf>> {
        self.backups.backup()
    }

    /// Restores the newest snapshot and reloads it as the current table.
    pub fn restore(&mut self) -> Result<Snapshot> {
        let snapshot = self.backups.restore()?;
        self.storage.invalidate();
        self.current = Some(self.storage.get_all()?);
        Ok(snapshot)
    }
}

fn not_open() -> LedgerError {
    LedgerError::unavailable(PathBuf::new(), "no ledger table loaded")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionType;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn record(value: f64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            TransactionType::Spending,
            "food",
            "USD",
        )
        .with_output("bank", value)
    }

    #[test]
    fn operations_require_open_table() {
        let dir = tempdir().expect("tempdir");
        let mut manager =
            LedgerManager::from_config(&Config::rooted_at(dir.path()), dir.path()).unwrap();
        assert!(manager.insert(record(1.0)).is_err());
        assert!(manager.commit().is_err());
    }

    #[test]
    fn open_falls_back_to_latest_backup() {
        let dir = tempdir().expect("tempdir");
        let config = Config::rooted_at(dir.path());
        let mut manager = LedgerManager::from_config(&config, dir.path()).unwrap();
        manager.start_empty();
        manager.insert(record(4.0)).unwrap();
        manager.commit().unwrap();
        manager.backup().unwrap().expect("snapshot written");
        fs::write(manager.store_path(), "{ not json").unwrap();

        let mut reopened = LedgerManager::from_config(&config, dir.path()).unwrap();
        let outcome = reopened.open().expect("open with fallback");
        assert!(matches!(outcome, OpenOutcome::Restored(_)));
        assert_eq!(reopened.table().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_store_without_backup_is_reported_and_kept() {
        let dir = tempdir().expect("tempdir");
        let mut manager =
            LedgerManager::from_config(&Config::rooted_at(dir.path()), dir.path()).unwrap();
        fs::create_dir_all(manager.store_path().parent().unwrap()).unwrap();
        fs::write(manager.store_path(), "{\"0\": {\"Date\"").unwrap();

        let err = manager.open().unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(!manager.is_open());
        assert_eq!(
            fs::read_to_string(manager.store_path()).unwrap(),
            "{\"0\": {\"Date\""
        );
    }

    #[test]
    fn store_over_row_limit_is_not_replaced_by_backup() {
        let dir = tempdir().expect("tempdir");
        let mut config = Config::rooted_at(dir.path());
        let mut manager = LedgerManager::from_config(&config, dir.path()).unwrap();
        manager.start_empty();
        manager.insert(record(1.0)).unwrap();
        manager.commit().unwrap();
        manager.backup().unwrap().expect("snapshot written");
        manager.insert(record(2.0)).unwrap();
        manager.insert(record(3.0)).unwrap();
        manager.commit().unwrap();
        let live = fs::read_to_string(manager.store_path()).unwrap();

        config.max_rows = 2;
        let mut limited = LedgerManager::from_config(&config, dir.path()).unwrap();
        assert!(matches!(limited.open(), Err(LedgerError::TableFull(2))));
        assert_eq!(fs::read_to_string(limited.store_path()).unwrap(), live);
        assert_eq!(limited.backups().list_snapshots().unwrap().len(), 1);
    }

    #[test]
    fn open_without_store_or_backup_fails() {
        let dir = tempdir().expect("tempdir");
        let mut manager =
            LedgerManager::from_config(&Config::rooted_at(dir.path()), dir.path()).unwrap();
        assert!(matches!(
            manager.open(),
            Err(LedgerError::NoBackupAvailable(_))
        ));
    }
}
