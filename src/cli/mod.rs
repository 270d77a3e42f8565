//! Line-oriented maintenance shell over a single ledger store.

mod handlers;
pub mod output;
pub mod registry;
mod shell;
pub mod shell_context;

use thiserror::Error;

use crate::errors::LedgerError;

pub use shell::run_cli;
pub use shell_context::{CliMode, CommandError, LoopControl, ShellContext};

/// Failures that end the shell session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("terminal error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
