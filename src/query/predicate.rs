use std::fmt;

use chrono::NaiveDate;

use crate::{
    errors::{LedgerError, Result},
    ledger::{
        transaction::iso_date, AccountKind, AccountSide, AmountColumn, Column, Transaction,
        TransactionType,
    },
};

const START_DATE: &str = "StartDate";
const END_DATE: &str = "EndDate";
const MINIMUM: &str = "Minimum";
const MAXIMUM: &str = "Maximum";
const INPUT_ACCOUNT_TYPE: &str = "InputAccountType";
const OUTPUT_ACCOUNT_TYPE: &str = "OutputAccountType";

/// Comparison value of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl FilterValue {
    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FilterValue::Date(date) => Some(*date),
            FilterValue::Text(raw) => iso_date::parse(raw),
            FilterValue::Number(_) => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(value) => Some(*value),
            FilterValue::Text(raw) => raw.trim().parse().ok(),
            FilterValue::Date(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text),
            FilterValue::Number(value) => write!(f, "{}", value),
            FilterValue::Date(date) => write!(f, "{}", date.format(iso_date::FORMAT)),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

impl From<TransactionType> for FilterValue {
    fn from(value: TransactionType) -> Self {
        FilterValue::Text(value.as_str().to_string())
    }
}

/// Ordered mapping from column (or reserved key) to comparison value.
///
/// Every entry must hold for a row to pass; there is no disjunction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    entries: Vec<(String, FilterValue)>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`PredicateSet::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, keeping its original position if it was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Resolves every entry up front so rows are evaluated against parsed
    /// values. Fails on the first entry that does not make sense.
    pub fn compile(&self) -> Result<Vec<Predicate>> {
        self.entries
            .iter()
            .map(|(key, value)| Predicate::parse(key, value))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for PredicateSet
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PredicateSet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

/// A single resolved condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    OnOrAfter(NaiveDate),
    OnOrBefore(NaiveDate),
    AtLeast(AmountColumn, f64),
    AtMost(AmountColumn, f64),
    DescriptionContains(String),
    AccountKindIs(AccountSide, AccountKind),
    DateEquals(NaiveDate),
    AmountEquals(AmountColumn, f64),
    TextEquals(Column, String),
}

impl Predicate {
    fn parse(key: &str, value: &FilterValue) -> Result<Self> {
        let compact: String = key.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            START_DATE => return Ok(Predicate::OnOrAfter(require_date(key, value)?)),
            END_DATE => return Ok(Predicate::OnOrBefore(require_date(key, value)?)),
            INPUT_ACCOUNT_TYPE => {
                return Ok(Predicate::AccountKindIs(
                    AccountSide::Input,
                    require_kind(key, value)?,
                ))
            }
            OUTPUT_ACCOUNT_TYPE => {
                return Ok(Predicate::AccountKindIs(
                    AccountSide::Output,
                    require_kind(key, value)?,
                ))
            }
            _ => {}
        }

        if let Some(rest) = compact.strip_prefix(MINIMUM) {
            let column = require_amount_column(key, rest)?;
            return Ok(Predicate::AtLeast(column, require_number(key, value)?));
        }
        if let Some(rest) = compact.strip_prefix(MAXIMUM) {
            let column = require_amount_column(key, rest)?;
            return Ok(Predicate::AtMost(column, require_number(key, value)?));
        }

        let column = Column::from_name(&compact)
            .ok_or_else(|| LedgerError::InvalidPredicate(format!("unknown column `{}`", key)))?;
        Ok(match column {
            Column::Description => Predicate::DescriptionContains(value.to_string()),
            Column::Date => Predicate::DateEquals(require_date(key, value)?),
            Column::InputValue | Column::OutputValue => {
                let amount = column.amount().ok_or_else(|| {
                    LedgerError::InvalidPredicate(format!("`{}` is not numeric", key))
                })?;
                Predicate::AmountEquals(amount, require_number(key, value)?)
            }
            other => Predicate::TextEquals(other, value.to_string()),
        })
    }

    pub fn matches(&self, record: &Transaction) -> bool {
        match self {
            Predicate::OnOrAfter(date) => record.date >= *date,
            Predicate::OnOrBefore(date) => record.date <= *date,
            Predicate::AtLeast(column, bound) => record.amount(*column) >= *bound,
            Predicate::AtMost(column, bound) => record.amount(*column) <= *bound,
            Predicate::DescriptionContains(needle) => record.description.contains(needle.as_str()),
            Predicate::AccountKindIs(side, kind) => record.account_kind(*side) == Some(*kind),
            Predicate::DateEquals(date) => record.date == *date,
            Predicate::AmountEquals(column, value) => record.amount(*column) == *value,
            Predicate::TextEquals(column, value) => record.text(*column) == value.as_str(),
        }
    }
}

fn require_date(key: &str, value: &FilterValue) -> Result<NaiveDate> {
    value.as_date().ok_or_else(|| {
        LedgerError::InvalidPredicate(format!("`{}` expects a YYYY-MM-DD date, got `{}`", key, value))
    })
}

fn require_number(key: &str, value: &FilterValue) -> Result<f64> {
    value.as_number().ok_or_else(|| {
        LedgerError::InvalidPredicate(format!("`{}` expects a number, got `{}`", key, value))
    })
}

fn require_kind(key: &str, value: &FilterValue) -> Result<AccountKind> {
    AccountKind::parse(&value.to_string()).ok_or_else(|| {
        LedgerError::InvalidPredicate(format!(
            "`{}` expects `saving` or `checking`, got `{}`",
            key, value
        ))
    })
}

fn require_amount_column(key: &str, name: &str) -> Result<AmountColumn> {
    let column = Column::from_name(name)
        .ok_or_else(|| LedgerError::InvalidPredicate(format!("unknown column in `{}`", key)))?;
    column.amount().ok_or_else(|| {
        LedgerError::InvalidPredicate(format!(
            "`{}` is a range predicate on non-numeric column `{}`",
            key, column
        ))
    })
}
