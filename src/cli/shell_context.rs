use thiserror::Error;

use crate::{
    config::ConfigManager,
    core::{LedgerManager, OpenOutcome},
    errors::LedgerError,
};

use super::{handlers, output, registry::CommandRegistry, CliError};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// State shared by every command of one shell session.
pub struct ShellContext {
    pub mode: CliMode,
    pub manager: LedgerManager,
    pub registry: CommandRegistry,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let configs = ConfigManager::new();
        let config = configs.load()?;
        let mut manager = LedgerManager::from_config(&config, configs.base_dir())?;
        match manager.open() {
            Ok(OpenOutcome::Loaded) => {}
            Ok(OpenOutcome::Restored(snapshot)) => output::warning(format!(
                "Store was unavailable; restored backup from {}.",
                snapshot.date
            )),
            Err(LedgerError::NoBackupAvailable(_)) if !manager.store_path().exists() => {
                output::info("No ledger found. Starting with an empty ledger.");
                manager.start_empty();
            }
            Err(err) => return Err(err.into()),
        }

        let mut registry = CommandRegistry::new();
        for entry in handlers::definitions() {
            registry.register(entry);
        }

        Ok(Self {
            mode,
            manager,
            registry,
            running: true,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        let rows = self.manager.table().map(|table| table.len()).unwrap_or(0);
        format!("ifo [{} rows]> ", rows)
    }

    pub fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|entry| entry.handler) else {
            output::error(format!("Unknown command `{}`.", command));
            if let Some(best) = self.registry.suggest(command) {
                output::info(format!("Suggestion: `{}`?", best));
            }
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => output::error(message),
            CommandError::Ledger(err) => {
                output::error(&err);
                if err.is_store_unavailable() {
                    output::info("Run `restore` to recover the latest backup.");
                }
            }
        }
    }
}
