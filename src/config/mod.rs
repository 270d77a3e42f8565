use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    errors::{LedgerError, Result},
    utils::persistence::write_atomic,
};

const HOME_ENV: &str = "IFO_LEDGER_HOME";
const DEFAULT_DIR_NAME: &str = ".ifo_ledger";
const DATA_DIR: &str = "data";
const BACKUP_DIR: &str = "backup";
const STORE_FILE: &str = "database.json";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_MAX_ROWS: usize = 1_000_000;

/// Returns the application data directory, defaulting to `~/.ifo_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Store and backup settings. Relative paths resolve against the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    #[serde(default = "Config::default_max_rows")]
    pub max_rows: usize,
    /// Number of snapshots kept after a backup; `None` keeps all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention: Option<usize>,
    #[serde(default = "Config::default_backup_on_commit")]
    pub backup_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            backup_dir: None,
            max_rows: Self::default_max_rows(),
            backup_retention: None,
            backup_on_commit: Self::default_backup_on_commit(),
        }
    }
}

impl Config {
    pub fn default_max_rows() -> usize {
        DEFAULT_MAX_ROWS
    }

    pub fn default_backup_on_commit() -> bool {
        true
    }

    /// Config whose store and backups live under `base`.
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            store_path: Some(base.join(DATA_DIR).join(STORE_FILE)),
            backup_dir: Some(base.join(BACKUP_DIR)),
            ..Self::default()
        }
    }

    pub fn resolve_store_path(&self, base: &Path) -> PathBuf {
        match &self.store_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(DATA_DIR).join(STORE_FILE),
        }
    }

    pub fn resolve_backup_dir(&self, base: &Path) -> PathBuf {
        match &self.backup_dir {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(BACKUP_DIR),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            return Err(LedgerError::Config("`max_rows` must be at least 1".into()));
        }
        if self.backup_retention == Some(0) {
            return Err(LedgerError::Config(
                "`backup_retention` must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

/// Loads and saves [`Config`] as `config.json` in the data directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        let path = base.join(CONFIG_FILE);
        Self { base, path }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| LedgerError::Config(format!("{}: {}", self.path.display(), err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn persists_and_loads_config() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = Config {
            backup_retention: Some(7),
            max_rows: 500,
            ..Config::rooted_at(dir.path())
        };
        manager.save(&config).expect("save config");
        assert_eq!(manager.load().expect("load config"), config);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let config = Config {
            store_path: Some(PathBuf::from("ledger.json")),
            ..Config::default()
        };
        let base = Path::new("/srv/ifo");
        assert_eq!(config.resolve_store_path(base), base.join("ledger.json"));
        assert_eq!(config.resolve_backup_dir(base), base.join("backup"));
    }

    #[test]
    fn zero_retention_is_rejected() {
        let config = Config {
            backup_retention: Some(0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::Config(_))));
    }
}
