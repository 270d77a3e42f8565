use std::{borrow::Cow, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{LedgerError, Result};

/// Substring that marks an account as a saving account.
pub const SAVING_MARKER: &str = "saving";

/// One financial event as stored in the ledger table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Date", with = "iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "Type")]
    pub kind: TransactionType,
    #[serde(rename = "Category", deserialize_with = "nullable_text")]
    pub category: String,
    #[serde(rename = "Currency", deserialize_with = "nullable_text")]
    pub currency: String,
    #[serde(
        rename = "InputAccount",
        alias = "Input Account",
        default,
        deserialize_with = "nullable_text"
    )]
    pub input_account: String,
    #[serde(
        rename = "OutputAccount",
        alias = "Output Account",
        default,
        deserialize_with = "nullable_text"
    )]
    pub output_account: String,
    #[serde(
        rename = "InputValue",
        alias = "Input Value",
        deserialize_with = "nullable_amount"
    )]
    pub input_value: f64,
    #[serde(
        rename = "OutputValue",
        alias = "Output Value",
        deserialize_with = "nullable_amount"
    )]
    pub output_value: f64,
    #[serde(rename = "Description", default, deserialize_with = "nullable_text")]
    pub description: String,
}

impl Transaction {
    /// Creates a record with empty accounts, zero amounts, and no description.
    pub fn new(
        date: NaiveDate,
        kind: TransactionType,
        category: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            date,
            kind,
            category: category.into(),
            currency: currency.into(),
            input_account: String::new(),
            output_account: String::new(),
            input_value: 0.0,
            output_value: 0.0,
            description: String::new(),
        }
    }

    /// Money flowing into `account`.
    pub fn with_input(mut self, account: impl Into<String>, value: f64) -> Self {
        self.input_account = account.into();
        self.input_value = value;
        self
    }

    /// Money flowing out of `account`.
    pub fn with_output(mut self, account: impl Into<String>, value: f64) -> Self {
        self.output_account = account.into();
        self.output_value = value;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builds a record from a column map, reporting the first missing column.
    pub fn from_columns(columns: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        for column in Column::REQUIRED {
            let present = columns
                .keys()
                .any(|key| Column::from_name(key) == Some(column));
            if !present {
                return Err(LedgerError::MalformedRecord(format!(
                    "missing required column `{}`",
                    column.name()
                )));
            }
        }
        let record: Transaction =
            serde_json::from_value(serde_json::Value::Object(normalize_keys(columns)))
                .map_err(|err| LedgerError::MalformedRecord(err.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Checks amount and currency constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for (column, value) in [
            (Column::InputValue, self.input_value),
            (Column::OutputValue, self.output_value),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::MalformedRecord(format!(
                    "`{}` must be a non-negative amount, got {}",
                    column.name(),
                    value
                )));
            }
        }
        if self.currency.trim().is_empty() {
            return Err(LedgerError::MalformedRecord(
                "`Currency` must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn amount(&self, column: AmountColumn) -> f64 {
        match column {
            AmountColumn::InputValue => self.input_value,
            AmountColumn::OutputValue => self.output_value,
        }
    }

    /// Textual value of a column, as compared by equality predicates.
    pub fn text(&self, column: Column) -> Cow<'_, str> {
        match column {
            Column::Date => Cow::Owned(self.date.format(iso_date::FORMAT).to_string()),
            Column::Type => Cow::Borrowed(self.kind.as_str()),
            Column::Category => Cow::Borrowed(&self.category),
            Column::Currency => Cow::Borrowed(&self.currency),
            Column::InputAccount => Cow::Borrowed(&self.input_account),
            Column::OutputAccount => Cow::Borrowed(&self.output_account),
            Column::InputValue => Cow::Owned(self.input_value.to_string()),
            Column::OutputValue => Cow::Owned(self.output_value.to_string()),
            Column::Description => Cow::Borrowed(&self.description),
        }
    }

    pub fn account(&self, side: AccountSide) -> &str {
        match side {
            AccountSide::Input => &self.input_account,
            AccountSide::Output => &self.output_account,
        }
    }

    /// Kind of the account on `side`, or `None` when that side is empty.
    pub fn account_kind(&self, side: AccountSide) -> Option<AccountKind> {
        let account = self.account(side);
        if account.is_empty() {
            None
        } else {
            Some(AccountKind::of(account))
        }
    }
}

fn normalize_keys(
    columns: &serde_json::Map<String, serde_json::Value>,
) -> serde_json::Map<String, serde_json::Value> {
    columns
        .iter()
        .map(|(key, value)| {
            let key = Column::from_name(key)
                .map(|column| column.name().to_string())
                .unwrap_or_else(|| key.clone());
            (key, value.clone())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Spending,
    Earning,
    Change,
    Investment,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Spending,
        TransactionType::Earning,
        TransactionType::Change,
        TransactionType::Investment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Spending => "spending",
            TransactionType::Earning => "earning",
            TransactionType::Change => "change",
            TransactionType::Investment => "investment",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self> {
        TransactionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| LedgerError::MalformedRecord(format!("unknown type `{}`", value)))
    }
}

/// Account classification inferred from the account name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Saving,
    Checking,
}

impl AccountKind {
    /// Any name containing `saving` (case-sensitive) is a saving account.
    pub fn of(account: &str) -> Self {
        if account.contains(SAVING_MARKER) {
            AccountKind::Saving
        } else {
            AccountKind::Checking
        }
    }

    /// Accepts `saving`/`checking` as well as the plural dashboard labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "saving" | "savings" | "saving accounts" => Some(AccountKind::Saving),
            "checking" | "checking accounts" => Some(AccountKind::Checking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountSide {
    Input,
    Output,
}

/// Columns of the transaction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    Type,
    Category,
    Currency,
    InputAccount,
    OutputAccount,
    InputValue,
    OutputValue,
    Description,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Date,
        Column::Type,
        Column::Category,
        Column::Currency,
        Column::InputAccount,
        Column::OutputAccount,
        Column::InputValue,
        Column::OutputValue,
        Column::Description,
    ];

    pub const REQUIRED: [Column; 6] = [
        Column::Date,
        Column::Type,
        Column::Category,
        Column::Currency,
        Column::InputValue,
        Column::OutputValue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Type => "Type",
            Column::Category => "Category",
            Column::Currency => "Currency",
            Column::InputAccount => "InputAccount",
            Column::OutputAccount => "OutputAccount",
            Column::InputValue => "InputValue",
            Column::OutputValue => "OutputValue",
            Column::Description => "Description",
        }
    }

    /// Resolves a column name, ignoring spaces so `Input Value` matches too.
    pub fn from_name(name: &str) -> Option<Self> {
        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        Column::ALL
            .into_iter()
            .find(|column| column.name() == compact)
    }

    pub fn amount(&self) -> Option<AmountColumn> {
        match self {
            Column::InputValue => Some(AmountColumn::InputValue),
            Column::OutputValue => Some(AmountColumn::OutputValue),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The numeric columns, the only ones that can be summed or range-filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmountColumn {
    InputValue,
    OutputValue,
}

impl AmountColumn {
    pub fn column(&self) -> Column {
        match self {
            AmountColumn::InputValue => Column::InputValue,
            AmountColumn::OutputValue => Column::OutputValue,
        }
    }
}

fn nullable_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// `YYYY-MM-DD` encoding used at rest.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    /// Parses `YYYY-MM-DD`, dropping a trailing `T..`/` ..` time component.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let date_part = match raw.get(10..11) {
            Some("T") | Some(" ") => &raw[..10],
            _ => raw,
        };
        NaiveDate::parse_from_str(date_part, FORMAT).ok()
    }

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date `{}`", raw)))
    }
}
