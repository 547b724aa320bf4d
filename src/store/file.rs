//! On-disk configuration store.
//!
//! # Responsibilities
//! - Read and parse the configuration file on every call
//! - Persist new contents atomically (temp file, fsync, rename)
//! - Leave the previous file untouched when a write fails
//!
//! # Design Decisions
//! - The write runs on the blocking pool; once started it finishes even if
//!   the awaiting future is dropped
//! - The staging file is a `NamedTempFile`, deleted on drop unless persisted

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs;

use crate::store::error::StoreError;
use crate::store::model::Configuration;

/// Owner of the canonical configuration file path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    staging_dir: Option<PathBuf>,
}

impl ConfigStore {
    /// Create a store for the given configuration file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            staging_dir: None,
        }
    }

    /// Stage temporary files in `dir` instead of next to the config file.
    ///
    /// `dir` must be on the same filesystem as the config file, otherwise
    /// the final rename fails.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the configuration file.
    pub async fn read(&self) -> Result<Configuration, StoreError> {
        let bytes = fs::read(&self.path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                StoreError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Serialize `config` and replace the file contents atomically.
    pub async fn write(&self, config: &Configuration) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(config).map_err(StoreError::Serialize)?;
        let len = bytes.len();
        let path = self.path.clone();
        let staging_dir = self.staging_dir();

        let result = tokio::task::spawn_blocking(move || persist(&path, &staging_dir, &bytes))
            .await
            .unwrap_or_else(|e| Err(io::Error::other(e)));

        if let Err(source) = result {
            tracing::error!(
                path = %self.path.display(),
                error = %source,
                "Configuration write failed, previous file left intact"
            );
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!(path = %self.path.display(), bytes = len, "Configuration written");
        Ok(())
    }

    fn staging_dir(&self) -> PathBuf {
        match (&self.staging_dir, self.path.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Stage `bytes` next to `path`, fsync, then rename over `path`.
fn persist(path: &Path, staging_dir: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let mut staging = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(staging_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staging
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    persist_staged(staging, path)
}

fn persist_staged(staging: NamedTempFile, path: &Path) -> io::Result<()> {
    // On failure the returned NamedTempFile is dropped, which removes it.
    staging.persist(path).map(|_| ()).map_err(|e| e.error)
}
