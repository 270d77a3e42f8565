use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};

use crate::{
    errors::{LedgerError, Result},
    utils::persistence::copy_atomic,
};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_DATE_FORMAT: &str = "%Y-%m-%d";

/// A dated snapshot of the store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// Daily snapshots of the store file named `<store-name>_<YYYY-MM-DD>.json`.
#[derive(Debug, Clone)]
pub struct BackupManager {
    store_path: PathBuf,
    backup_dir: PathBuf,
    retention: Option<usize>,
}

impl BackupManager {
    pub fn new(store_path: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            store_path,
            backup_dir,
            retention: None,
        }
    }

    /// Keeps at most `retention` snapshots after each backup.
    pub fn with_retention(mut self, retention: Option<usize>) -> Self {
        self.retention = retention.map(|keep| keep.max(1));
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn store_name(&self) -> &str {
        self.store_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("database")
    }

    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.backup_dir.join(format!(
            "{}_{}.{}",
            self.store_name(),
            date.format(BACKUP_DATE_FORMAT),
            BACKUP_EXTENSION
        ))
    }

    /// Snapshots the store file under today's date.
    pub fn backup(&self) -> Result<Option<PathBuf>> {
        self.backup_on(Local::now().date_naive())
    }

    /// Snapshots the store file under `date`, replacing a snapshot already
    /// taken that day. Returns `None` when there is no store file to copy.
    pub fn backup_on(&self, date: NaiveDate) -> Result<Option<PathBuf>> {
        if !self.store_path.exists() {
            tracing::info!(path = %self.store_path.display(), "no store file, skipping backup");
            return Ok(None);
        }
        fs::create_dir_all(&self.backup_dir)?;
        let target = self.snapshot_path(date);
        copy_atomic(&self.store_path, &target)?;
        tracing::info!(snapshot = %target.display(), "created backup");
        self.prune()?;
        Ok(Some(target))
    }

    /// Snapshots for this store, newest first. Foreign files are skipped.
    pub fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            match parse_snapshot_date(self.store_name(), file_name) {
                Some(date) => snapshots.push(Snapshot { date, path }),
                None => tracing::debug!(file = file_name, "ignoring non-snapshot file"),
            }
        }
        snapshots.sort_by_key(|snapshot| Reverse(snapshot.date));
        Ok(snapshots)
    }

    pub fn latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.list_snapshots()?.into_iter().next())
    }

    /// Moves the newest snapshot onto the store path, replacing the live file.
    pub fn restore(&self) -> Result<Snapshot> {
        let snapshot = self
            .latest()?
            .ok_or_else(|| LedgerError::NoBackupAvailable(self.backup_dir.clone()))?;
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Err(err) = fs::rename(&snapshot.path, &self.store_path) {
            tracing::warn!(error = %err, "rename failed, restoring through a staged copy");
            copy_atomic(&snapshot.path, &self.store_path)?;
            fs::remove_file(&snapshot.path)?;
        }
        tracing::info!(
            snapshot = %snapshot.path.display(),
            store = %self.store_path.display(),
            "restored backup"
        );
        Ok(snapshot)
    }

    fn prune(&self) -> Result<()> {
        let Some(keep) = self.retention else {
            return Ok(());
        };
        for stale in self.list_snapshots()?.into_iter().skip(keep) {
            tracing::debug!(snapshot = %stale.path.display(), "pruning backup");
            if let Err(err) = fs::remove_file(&stale.path) {
                tracing::warn!(
                    snapshot = %stale.path.display(),
                    error = %err,
                    "failed to prune backup"
                );
            }
        }
        Ok(())
    }
}

/// Extracts the date from `<store_name>_<YYYY-MM-DD>.json`.
fn parse_snapshot_date(store_name: &str, file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let date = stem.strip_prefix(store_name)?.strip_prefix('_')?;
    if date.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date, BACKUP_DATE_FORMAT).ok()
}
