use std::{collections::HashMap, fmt};

use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::transaction::Transaction;

/// Stable identity of a row, independent of its position.
pub type RowIndex = u64;

/// A record together with the index it was assigned at insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: RowIndex,
    pub record: Transaction,
}

/// Ordered, index-addressed collection of transactions.
///
/// Rows keep insertion order. Each row carries an index that is never handed
/// out twice during the lifetime of the table (and of any subset derived from
/// it), so edited subsets can be merged back without aliasing new rows.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    positions: HashMap<RowIndex, usize>,
    /// `None` once `RowIndex::MAX` has been handed out.
    next_index: Option<RowIndex>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            positions: HashMap::new(),
            next_index: Some(0),
        }
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &Transaction> {
        self.rows.iter().map(|row| &row.record)
    }

    pub fn indices(&self) -> impl Iterator<Item = RowIndex> + '_ {
        self.rows.iter().map(|row| row.index)
    }

    pub fn get(&self, index: RowIndex) -> Option<&Transaction> {
        self.positions
            .get(&index)
            .map(|&position| &self.rows[position].record)
    }

    pub fn get_mut(&mut self, index: RowIndex) -> Option<&mut Transaction> {
        match self.positions.get(&index) {
            Some(&position) => Some(&mut self.rows[position].record),
            None => None,
        }
    }

    pub fn contains(&self, index: RowIndex) -> bool {
        self.positions.contains_key(&index)
    }

    pub fn max_index(&self) -> Option<RowIndex> {
        self.rows.iter().map(|row| row.index).max()
    }

    /// Index the next inserted row will receive, or `None` when the index
    /// space is used up.
    pub fn next_index(&self) -> Option<RowIndex> {
        self.next_index
    }

    /// Creates an empty table sharing this table's index watermark.
    pub(crate) fn derived(&self) -> Table {
        Table {
            rows: Vec::new(),
            positions: HashMap::new(),
            next_index: self.next_index,
        }
    }

    /// Appends a row under an explicit index, raising the watermark past it.
    ///
    /// Returns `false` without touching the table if the index is taken.
    pub(crate) fn push_row(&mut self, index: RowIndex, record: Transaction) -> bool {
        if self.positions.contains_key(&index) {
            return false;
        }
        self.positions.insert(index, self.rows.len());
        self.rows.push(Row { index, record });
        if let Some(next) = self.next_index {
            if index >= next {
                self.next_index = index.checked_add(1);
            }
        }
        true
    }

    /// Appends `record` under the next free index. Returns `None` without
    /// touching the table once the index space is used up.
    pub(crate) fn push(&mut self, record: Transaction) -> Option<RowIndex> {
        let index = self.next_index?;
        self.push_row(index, record).then_some(index)
    }

    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Row) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        let removed = before - self.rows.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.positions = self
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| (row.index, position))
            .collect();
    }
}

impl PartialEq for Table {
    /// Tables are equal when they hold the same rows in the same order; the
    /// watermark is bookkeeping and does not take part.
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl FromIterator<Transaction> for Table {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut table = Table::new();
        for record in iter {
            if table.push(record).is_none() {
                break;
            }
        }
        table
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for row in &self.rows {
            map.serialize_entry(&row.index.to_string(), &row.record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TableVisitor)
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = Table;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object keyed by row index")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Table, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut table = Table::new();
        while let Some(key) = access.next_key::<String>()? {
            let index: RowIndex = key
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("row key `{}` is not an index", key)))?;
            let record: Transaction = access.next_value()?;
            if !table.push_row(index, record) {
                return Err(de::Error::custom(format!("duplicate row index {}", index)));
            }
        }
        Ok(table)
    }
}
