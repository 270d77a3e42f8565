use crate::{
    errors::{LedgerError, Result},
    ledger::{AmountColumn, Column, Table},
};

use super::predicate::PredicateSet;

/// Returns the rows of `table` that satisfy every predicate, in table order
/// and with their original indices.
///
/// The whole predicate set is resolved before any row is looked at, so an
/// invalid entry fails the call without producing a partial result.
pub fn filter(table: &Table, predicates: &PredicateSet) -> Result<Table> {
    if predicates.is_empty() {
        return Ok(table.clone());
    }
    let compiled = predicates.compile()?;
    let mut result = table.derived();
    for row in table {
        if compiled.iter().all(|predicate| predicate.matches(&row.record)) {
            result.push_row(row.index, row.record.clone());
        }
    }
    tracing::debug!(
        predicates = compiled.len(),
        matched = result.len(),
        of = table.len(),
        "filtered table"
    );
    Ok(result)
}

/// Sum of an amount column; `0` for an empty table.
pub fn sum(table: &Table, column: AmountColumn) -> f64 {
    table.records().map(|record| record.amount(column)).sum()
}

/// [`sum`] addressed by column name.
pub fn sum_by_name(table: &Table, name: &str) -> Result<f64> {
    let column = Column::from_name(name)
        .ok_or_else(|| LedgerError::InvalidPredicate(format!("unknown column `{}`", name)))?;
    let amount = column.amount().ok_or_else(|| {
        LedgerError::InvalidPredicate(format!("column `{}` is not numeric", column))
    })?;
    Ok(sum(table, amount))
}
