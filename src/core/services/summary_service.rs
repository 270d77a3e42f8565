use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::ledger::{AccountKind, AccountSide, AmountColumn, Row, Table, Transaction};

/// Read models the dashboard derives from the transaction table.
pub struct SummaryService;

impl SummaryService {
    pub fn earliest_date(table: &Table) -> Option<NaiveDate> {
        table.records().map(|record| record.date).min()
    }

    pub fn last_transaction_date(table: &Table, currency: &str) -> Option<NaiveDate> {
        table
            .records()
            .filter(|record| record.currency == currency)
            .map(|record| record.date)
            .max()
    }

    /// Inflows minus outflows of `account` up to and including `until`.
    pub fn account_balance(table: &Table, account: &str, currency: &str, until: NaiveDate) -> f64 {
        Self::balance_where(table, currency, until, |record, side| {
            record.account(side) == account
        })
    }

    /// Combined balance of every account of `kind`.
    pub fn kind_balance(table: &Table, kind: AccountKind, currency: &str, until: NaiveDate) -> f64 {
        Self::balance_where(table, currency, until, |record, side| {
            record.account_kind(side) == Some(kind)
        })
    }

    fn balance_where<F>(table: &Table, currency: &str, until: NaiveDate, on_side: F) -> f64
    where
        F: Fn(&Transaction, AccountSide) -> bool,
    {
        table
            .records()
            .filter(|record| record.currency == currency && record.date <= until)
            .map(|record| {
                let mut delta = 0.0;
                if on_side(record, AccountSide::Input) {
                    delta += record.amount(AmountColumn::InputValue);
                }
                if on_side(record, AccountSide::Output) {
                    delta -= record.amount(AmountColumn::OutputValue);
                }
                delta
            })
            .sum()
    }

    /// Sorted distinct accounts of `kind` used with `currency`, either side.
    pub fn accounts(table: &Table, currency: &str, kind: AccountKind) -> Vec<String> {
        Self::account_usage(table, currency, kind)
            .into_keys()
            .map(str::to_string)
            .collect()
    }

    /// The account of `kind` that appears most often; ties go to the
    /// alphabetically first name.
    pub fn most_used_account(table: &Table, currency: &str, kind: AccountKind) -> Option<String> {
        let usage = Self::account_usage(table, currency, kind);
        let mut best: Option<(&str, usize)> = None;
        for (account, count) in usage {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((account, count));
            }
        }
        best.map(|(account, _)| account.to_string())
    }

    fn account_usage<'a>(
        table: &'a Table,
        currency: &str,
        kind: AccountKind,
    ) -> BTreeMap<&'a str, usize> {
        let mut usage = BTreeMap::new();
        for record in table.records().filter(|record| record.currency == currency) {
            for side in [AccountSide::Input, AccountSide::Output] {
                if record.account_kind(side) == Some(kind) {
                    *usage.entry(record.account(side)).or_insert(0) += 1;
                }
            }
        }
        usage
    }

    pub fn currencies(table: &Table) -> Vec<String> {
        table
            .records()
            .map(|record| record.currency.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted distinct years with one extra year appended for planning ahead.
    pub fn years(table: &Table) -> Vec<i32> {
        let mut years: Vec<i32> = table
            .records()
            .map(|record| record.date.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Some(&last) = years.last() {
            years.push(last + 1);
        }
        years
    }

    /// The last `count` rows, newest insertion first.
    pub fn recent(table: &Table, count: usize) -> Vec<&Row> {
        table.rows().iter().rev().take(count).collect()
    }

    pub fn amount_range(table: &Table, column: AmountColumn) -> Option<(f64, f64)> {
        table.records().map(|record| record.amount(column)).fold(None, |range, value| {
            Some(match range {
                None => (value, value),
                Some((low, high)) => (low.min(value), high.max(value)),
            })
        })
    }
}
