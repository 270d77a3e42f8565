mod common;

use common::{date, january_table, setup_test_env, spending};
use ifo_ledger::{
    errors::LedgerError,
    query::filter,
    MergeReport, PredicateSet, RecordMutator,
};
use serde_json::json;

#[test]
fn insert_then_remove_restores_original_table() {
    let original = january_table();
    let mut table = original.clone();
    let mutator = RecordMutator::new();

    let index = mutator
        .insert(&mut table, spending(date(2024, 3, 1), "travel", 80.0))
        .unwrap();
    assert_eq!(index, 3);
    assert_eq!(mutator.remove(&mut table, &[index]), 1);
    assert_eq!(table, original);
}

#[test]
fn removed_indices_are_not_reused() {
    let mut table = january_table();
    let mutator = RecordMutator::new();
    mutator.remove(&mut table, &[2]);
    let index = mutator
        .insert(&mut table, spending(date(2024, 3, 1), "travel", 80.0))
        .unwrap();
    assert_eq!(index, 3);
}

#[test]
fn remove_ignores_unknown_indices() {
    let mut table = january_table();
    assert_eq!(RecordMutator::new().remove(&mut table, &[7, 1, 99]), 1);
    assert_eq!(table.indices().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn merging_an_unchanged_filter_result_is_a_no_op() {
    let original = january_table();
    let mut table = original.clone();
    let subset = filter(&table, &PredicateSet::new().with("Category", "food")).unwrap();

    let report = RecordMutator::new().merge(&mut table, &subset).unwrap();
    assert_eq!(
        report,
        MergeReport {
            replaced: 2,
            appended: 0
        }
    );
    assert_eq!(table, original);
}

#[test]
fn merge_matches_rows_by_index_not_position() {
    let mut table = january_table();
    let mut subset = filter(&table, &PredicateSet::new().with("Category", "food")).unwrap();
    // Edit the second subset row, which is row 2 of the table.
    let edited = subset.indices().nth(1).unwrap();
    subset.get_mut(edited).unwrap().output_value = 99.0;

    RecordMutator::new().merge(&mut table, &subset).unwrap();
    assert_eq!(table.get(2).unwrap().output_value, 99.0);
    assert_eq!(table.get(1).unwrap().output_value, 500.0);
    assert_eq!(table.get(0).unwrap().output_value, 10.0);
}

#[test]
fn merge_appends_rows_missing_from_the_table() {
    let mut table = january_table();
    let subset = january_table();
    RecordMutator::new().remove(&mut table, &[1]);

    let report = RecordMutator::new().merge(&mut table, &subset).unwrap();
    assert_eq!(report.appended, 1);
    assert_eq!(table.indices().collect::<Vec<_>>(), vec![0, 2, 1]);
}

#[test]
fn invalid_subset_row_leaves_table_untouched() {
    let original = january_table();
    let mut table = original.clone();
    let mut subset = table.clone();
    subset.get_mut(0).unwrap().output_value = 1.0;
    subset.get_mut(2).unwrap().output_value = -5.0;

    let err = RecordMutator::new().merge(&mut table, &subset).unwrap_err();
    assert!(matches!(err, LedgerError::MalformedRecord(_)));
    assert_eq!(table, original);
}

#[test]
fn insert_columns_reports_missing_required_column() {
    let mut table = january_table();
    let columns = json!({
        "Date": "2024-05-01",
        "Type": "spending",
        "Category": "food",
        "InputValue": 0,
        "OutputValue": 3.5
    });
    let err = RecordMutator::new()
        .insert_columns(&mut table, columns.as_object().unwrap())
        .unwrap_err();
    assert!(matches!(err, LedgerError::MalformedRecord(message) if message.contains("Currency")));
    assert_eq!(table.len(), 3);
}

#[test]
fn insert_respects_row_limit() {
    let mut table = january_table();
    let err = RecordMutator::with_max_rows(3)
        .insert(&mut table, spending(date(2024, 6, 1), "misc", 1.0))
        .unwrap_err();
    assert!(matches!(err, LedgerError::TableFull(3)));
}

#[test]
fn manager_edits_survive_commit_and_reopen() {
    let (mut manager, base) = setup_test_env();
    manager.insert(spending(date(2024, 1, 1), "food", 10.0)).unwrap();
    manager.insert(spending(date(2024, 1, 2), "food", 11.0)).unwrap();
    manager.remove(&[0]).unwrap();
    manager.commit().unwrap();

    let config = ifo_ledger::config::Config::rooted_at(&base);
    let mut reopened = ifo_ledger::LedgerManager::from_config(&config, &base).unwrap();
    reopened.open().unwrap();
    assert_eq!(reopened.table().unwrap().indices().collect::<Vec<_>>(), vec![1]);
}
