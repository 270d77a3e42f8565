use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::errors::{LedgerError, Result};

use super::{
    table::{RowIndex, Table},
    transaction::Transaction,
};

/// Outcome of writing a subset back into a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub replaced: usize,
    pub appended: usize,
}

/// Insert, remove, and merge operations that keep row indices stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMutator {
    max_rows: Option<usize>,
}

impl RecordMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows: Some(max_rows),
        }
    }

    /// Appends `record`, returning the index assigned to it.
    ///
    /// The index is one past the highest index this table has ever held, so an
    /// index freed by [`RecordMutator::remove`] is never handed out again.
    pub fn insert(&self, table: &mut Table, record: Transaction) -> Result<RowIndex> {
        record.validate()?;
        self.ensure_capacity(table, 1)?;
        let index = table
            .push(record)
            .ok_or_else(|| LedgerError::TableFull(table.len()))?;
        tracing::debug!(index, rows = table.len(), "inserted record");
        Ok(index)
    }

    /// Like [`RecordMutator::insert`], from a loosely typed column map.
    pub fn insert_columns(&self, table: &mut Table, columns: &Map<String, Value>) -> Result<RowIndex> {
        let record = Transaction::from_columns(columns)?;
        self.insert(table, record)
    }

    /// Drops rows whose index is listed. Unknown indices are ignored.
    pub fn remove(&self, table: &mut Table, indices: &[RowIndex]) -> usize {
        let doomed: HashSet<RowIndex> = indices.iter().copied().collect();
        let removed = table.retain(|row| !doomed.contains(&row.index));
        tracing::debug!(requested = indices.len(), removed, "removed records");
        removed
    }

    /// Replaces rows of `table` by the rows of `subset` carrying the same index.
    ///
    /// Matching is by index, never by position. Subset rows whose index is not
    /// in `table` are appended under that index. Nothing is written unless
    /// every subset row is valid.
    pub fn merge(&self, table: &mut Table, subset: &Table) -> Result<MergeReport> {
        for row in subset {
            row.record.validate().map_err(|err| match err {
                LedgerError::MalformedRecord(message) => {
                    LedgerError::MalformedRecord(format!("row {}: {}", row.index, message))
                }
                other => other,
            })?;
        }
        let new_rows = subset
            .indices()
            .filter(|index| !table.contains(*index))
            .count();
        self.ensure_capacity(table, new_rows)?;

        let mut report = MergeReport::default();
        for row in subset {
            match table.get_mut(row.index) {
                Some(existing) => {
                    *existing = row.record.clone();
                    report.replaced += 1;
                }
                None => {
                    table.push_row(row.index, row.record.clone());
                    report.appended += 1;
                }
            }
        }
        tracing::debug!(
            replaced = report.replaced,
            appended = report.appended,
            "merged subset"
        );
        Ok(report)
    }

    fn ensure_capacity(&self, table: &Table, additional: usize) -> Result<()> {
        match self.max_rows {
            Some(limit) if table.len() + additional > limit => Err(LedgerError::TableFull(limit)),
            _ => Ok(()),
        }
    }
}
