#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use ifo_ledger::{
    config::Config, core::LedgerManager, ledger::Table, Transaction, TransactionType,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn test_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates an open, empty manager rooted in an isolated directory.
pub fn setup_test_env() -> (LedgerManager, PathBuf) {
    let base = test_dir();
    let mut manager =
        LedgerManager::from_config(&Config::rooted_at(&base), &base).expect("create manager");
    manager.start_empty();
    (manager, base)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn spending(on: NaiveDate, category: &str, amount: f64) -> Transaction {
    Transaction::new(on, TransactionType::Spending, category, "USD").with_output("Checking", amount)
}

/// Three spendings on 2024-01-01, 2024-01-15, and 2024-02-01.
pub fn january_table() -> Table {
    vec![
        spending(date(2024, 1, 1), "food", 10.0),
        spending(date(2024, 1, 15), "rent", 500.0),
        spending(date(2024, 2, 1), "food", 12.5),
    ]
    .into_iter()
    .collect()
}
