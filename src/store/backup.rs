//! Point-in-time backups of the configuration file.
//!
//! Every save copies the current file to
//! `<backup_dir>/<file_name>.<UTC timestamp>.bak` before overwriting it.
//! Backups are never pruned here.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::observability::metrics;

/// Collisions beyond this many suffixes within one timestamp give up.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Location of a backup that was just written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHandle {
    path: PathBuf,
}

impl BackupHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Non-fatal failure to create a backup.
#[derive(Debug, Error)]
#[error("failed to back up {} to {}: {source}", source_path.display(), backup_dir.display())]
pub struct BackupWarning {
    pub source_path: PathBuf,
    pub backup_dir: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Result of a backup attempt.
#[derive(Debug)]
pub enum BackupOutcome {
    /// A new backup file was written.
    Created(BackupHandle),
    /// There was no configuration file to copy.
    Skipped,
    /// Copying failed; the save continues regardless.
    Failed(BackupWarning),
}

impl BackupOutcome {
    pub fn handle(&self) -> Option<&BackupHandle> {
        match self {
            BackupOutcome::Created(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn into_handle(self) -> Option<BackupHandle> {
        match self {
            BackupOutcome::Created(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Snapshot taken before the configuration file is overwritten.
pub trait ConfigBackup: Send + Sync {
    fn backup(&self) -> BoxFuture<'_, BackupOutcome>;
}

/// Creates append-only backups of one configuration file.
#[derive(Debug, Clone)]
pub struct BackupManager {
    source: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Back up `source` into `backup_dir`.
    pub fn new(source: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Back up `source` next to itself.
    pub fn alongside(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let backup_dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { source, backup_dir }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy the current configuration file to a new backup.
    pub async fn backup(&self) -> BackupOutcome {
        let contents = match fs::read(&self.source).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.source.display(), "No configuration file to back up");
                metrics::record_backup("skipped");
                return BackupOutcome::Skipped;
            }
            Err(e) => return self.failed(e),
        };

        match self.write_new(&contents).await {
            Ok(path) => {
                tracing::info!(backup = %path.display(), "Configuration backed up");
                metrics::record_backup("created");
                BackupOutcome::Created(BackupHandle { path })
            }
            Err(e) => self.failed(e),
        }
    }

    /// Existing backups of the managed file, oldest first.
    pub async fn list(&self) -> io::Result<Vec<PathBuf>> {
        let prefix = format!("{}.", self.file_name());
        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".bak") {
                backups.push(entry.path());
            }
        }
        // Timestamps sort lexicographically.
        backups.sort();
        Ok(backups)
    }

    async fn write_new(&self, contents: &[u8]) -> io::Result<PathBuf> {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string();
        let base = format!("{}.{}", self.file_name(), stamp);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{base}.bak")
            } else {
                format!("{base}-{attempt}.bak")
            };
            let path = self.backup_dir.join(name);

            let mut options = fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = match options.open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            file.write_all(contents).await?;
            file.sync_all().await?;
            return Ok(path);
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free backup name for {base}"),
        ))
    }

    fn failed(&self, source: io::Error) -> BackupOutcome {
        let warning = BackupWarning {
            source_path: self.source.clone(),
            backup_dir: self.backup_dir.clone(),
            source,
        };
        tracing::warn!(error = %warning, "Configuration backup failed, continuing without it");
        metrics::record_backup("failed");
        BackupOutcome::Failed(warning)
    }

    fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string())
    }
}

impl ConfigBackup for BackupManager {
    fn backup(&self) -> BoxFuture<'_, BackupOutcome> {
        BackupManager::backup(self).boxed()
    }
}
