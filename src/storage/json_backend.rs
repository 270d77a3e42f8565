use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::DEFAULT_MAX_ROWS,
    errors::{LedgerError, Result},
    ledger::Table,
    utils::persistence::write_atomic,
};

use super::StorageBackend;

/// The transaction table persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
    max_rows: usize,
    cached: Option<Table>,
}

impl JsonLedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self::with_max_rows(path, DEFAULT_MAX_ROWS)
    }

    pub fn with_max_rows(path: PathBuf, max_rows: usize) -> Self {
        Self {
            path,
            max_rows: max_rows.max(1),
            cached: None,
        }
    }

    /// Store name used to prefix backup snapshots (the file stem).
    pub fn store_name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("database")
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }
}

impl StorageBackend for JsonLedgerStore {
    fn load(&self) -> Result<Table> {
        let table = load_table_from_path(&self.path)?;
        if table.len() > self.max_rows {
            tracing::warn!(
                path = %self.path.display(),
                rows = table.len(),
                limit = self.max_rows,
                "store exceeds the row limit"
            );
            return Err(LedgerError::TableFull(self.max_rows));
        }
        tracing::info!(path = %self.path.display(), rows = table.len(), "loaded ledger table");
        Ok(table)
    }

    fn save(&mut self, table: &Table) -> Result<()> {
        save_table_to_path(table, &self.path)?;
        tracing::info!(path = %self.path.display(), rows = table.len(), "saved ledger table");
        self.cached = Some(table.clone());
        Ok(())
    }

    fn get_all(&mut self) -> Result<Table> {
        if let Some(table) = &self.cached {
            return Ok(table.clone());
        }
        let table = self.load()?;
        self.cached = Some(table.clone());
        Ok(table)
    }

    fn invalidate(&mut self) {
        self.cached = None;
    }

    fn store_path(&self) -> &Path {
        &self.path
    }
}

/// Serializes `table` and atomically replaces the file at `path`.
pub fn save_table_to_path(table: &Table, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(table)?;
    write_atomic(path, json.as_bytes())
}

/// Reads a table from `path`; every failure maps to `StoreUnavailable`.
pub fn load_table_from_path(path: &Path) -> Result<Table> {
    let data = fs::read_to_string(path).map_err(|err| LedgerError::unavailable(path, err))?;
    serde_json::from_str(&data).map_err(|err| LedgerError::unavailable(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Transaction, TransactionType};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (JsonLedgerStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonLedgerStore::new(temp.path().join("data").join("database.json"));
        (store, temp)
    }

    fn sample_table() -> Table {
        vec![Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            TransactionType::Spending,
            "food",
            "USD",
        )
        .with_output("bank", 12.5)]
        .into_iter()
        .collect()
    }

    #[test]
    fn missing_file_is_store_unavailable() {
        let (store, _guard) = store_with_temp_dir();
        assert!(store.load().unwrap_err().is_store_unavailable());
    }

    #[test]
    fn wrong_shape_is_store_unavailable() {
        let (store, _guard) = store_with_temp_dir();
        fs::create_dir_all(store.store_path().parent().unwrap()).unwrap();
        fs::write(store.store_path(), "[1, 2, 3]").unwrap();
        assert!(store.load().unwrap_err().is_store_unavailable());
    }

    #[test]
    fn get_all_serves_cache_after_save() {
        let (mut store, _guard) = store_with_temp_dir();
        let table = sample_table();
        store.save(&table).expect("save table");
        fs::remove_file(store.store_path()).unwrap();

        assert_eq!(store.get_all().expect("cached table"), table);
        store.invalidate();
        assert!(store.get_all().is_err());
    }

    #[test]
    fn row_limit_applies_on_load() {
        let (mut store, _guard) = store_with_temp_dir();
        let mut table = sample_table();
        table.push(table.get(0).unwrap().clone());
        store.save(&table).unwrap();

        let limited = JsonLedgerStore::with_max_rows(store.store_path().to_path_buf(), 1);
        let err = limited.load().unwrap_err();
        assert!(matches!(err, LedgerError::TableFull(1)));
        assert!(!err.is_store_unavailable());
    }

    #[test]
    fn store_name_is_file_stem() {
        let (store, _guard) = store_with_temp_dir();
        assert_eq!(store.store_name(), "database");
    }
}
