//! Transaction table model and the operations that mutate it.

pub mod mutator;
pub mod table;
pub mod transaction;

pub use mutator::{MergeReport, RecordMutator};
pub use table::{Row, RowIndex, Table};
pub use transaction::{
    AccountKind, AccountSide, AmountColumn, Column, Transaction, TransactionType,
};
