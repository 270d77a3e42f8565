//! Conjunctive filtering and column aggregates over a [`Table`](crate::ledger::Table).

pub mod filter;
pub mod predicate;

pub use filter::{filter, sum, sum_by_name};
pub use predicate::{FilterValue, Predicate, PredicateSet};
