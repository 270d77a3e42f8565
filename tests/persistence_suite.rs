mod common;

use std::fs;

use common::{date, january_table, spending, test_dir};
use ifo_ledger::{
    errors::LedgerError,
    storage::json_backend::{load_table_from_path, save_table_to_path},
    utils::persistence::tmp_path,
    JsonLedgerStore, StorageBackend,
};

#[test]
fn save_then_load_round_trips_rows_and_indices() {
    let path = test_dir().join("data").join("database.json");
    let mut table = january_table();
    ifo_ledger::RecordMutator::new().remove(&mut table, &[1]);

    let mut store = JsonLedgerStore::new(path.clone());
    store.save(&table).expect("save");
    let loaded = JsonLedgerStore::new(path).load().expect("load");

    assert_eq!(loaded, table);
    assert_eq!(loaded.indices().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn dates_are_written_without_time_part() {
    let path = test_dir().join("database.json");
    save_table_to_path(&january_table(), &path).expect("save");

    let json = fs::read_to_string(&path).expect("read store");
    assert!(json.contains("\"Date\": \"2024-01-15\""));
    assert!(!json.contains("T00:00"));
}

#[test]
fn legacy_documents_with_timestamps_and_nulls_load() {
    let path = test_dir().join("database.json");
    fs::write(
        &path,
        r#"{
            "3": {"Date": "2023-12-31T00:00:00", "Type": "earning", "Category": "salary",
                  "Currency": "EUR", "Input Account": "Main saving", "Output Account": null,
                  "Input Value": 1500.0, "Output Value": null, "Description": null},
            "1": {"Date": "2024-01-02", "Type": "spending", "Category": "food",
                  "Currency": "EUR", "InputValue": 0, "OutputValue": 4.5}
        }"#,
    )
    .unwrap();

    let table = load_table_from_path(&path).expect("load legacy store");
    assert_eq!(table.indices().collect::<Vec<_>>(), vec![3, 1]);
    let first = table.get(3).unwrap();
    assert_eq!(first.date, date(2023, 12, 31));
    assert_eq!(first.input_account, "Main saving");
    assert_eq!(first.output_account, "");
    assert_eq!(first.output_value, 0.0);
    assert_eq!(table.next_index(), Some(4));
}

#[test]
fn missing_or_corrupt_store_is_unavailable() {
    let dir = test_dir();
    let missing = JsonLedgerStore::new(dir.join("absent.json")).load();
    assert!(matches!(missing, Err(LedgerError::StoreUnavailable { .. })));

    let corrupt = dir.join("corrupt.json");
    fs::write(&corrupt, "[1, 2").unwrap();
    let err = JsonLedgerStore::new(corrupt).load().unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn store_over_row_limit_reports_table_full() {
    let path = test_dir().join("database.json");
    save_table_to_path(&january_table(), &path).expect("save");
    let err = JsonLedgerStore::with_max_rows(path, 2).load().unwrap_err();
    assert!(matches!(err, LedgerError::TableFull(2)));
}

#[test]
fn atomic_save_failure_preserves_original_file() {
    let path = test_dir().join("database.json");
    let mut store = JsonLedgerStore::new(path.clone());
    store.save(&january_table()).expect("initial save");
    let original = fs::read_to_string(&path).expect("read original file");

    // A directory where the staging file should go makes File::create fail.
    fs::create_dir_all(tmp_path(&path)).unwrap();

    let bigger = vec![spending(date(2025, 1, 1), "misc", 1.0)]
        .into_iter()
        .collect();
    assert!(store.save(&bigger).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn get_all_serves_cache_until_invalidated() {
    let path = test_dir().join("database.json");
    let mut store = JsonLedgerStore::new(path.clone());
    store.save(&january_table()).expect("save");
    fs::write(&path, "{}").unwrap();

    assert_eq!(store.get_all().unwrap().len(), 3);
    store.invalidate();
    assert!(store.get_all().unwrap().is_empty());
}
