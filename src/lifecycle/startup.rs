//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the home, plugins and backup directories
//! - Report what is already on disk before serving
//!
//! # Design Decisions
//! - Fail fast: a directory that cannot be created is fatal
//! - A missing configuration file is not fatal; reads report it per request

use std::io;

use crate::config::ConfigLocations;
use crate::store::BackupManager;

/// Create every directory the daemon writes into.
pub async fn prepare_directories(locations: &ConfigLocations) -> io::Result<()> {
    for dir in [&locations.home_dir, &locations.plugins_dir, &locations.backup_dir] {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}

/// Log the state of the managed configuration file and its backups.
pub async fn report_existing_state(locations: &ConfigLocations, backups: &BackupManager) {
    if tokio::fs::try_exists(&locations.config_file).await.unwrap_or(false) {
        tracing::info!(path = %locations.config_file.display(), "Managing configuration file");
    } else {
        tracing::warn!(
            path = %locations.config_file.display(),
            "Configuration file does not exist yet; it will be created on first save"
        );
    }

    match backups.list().await {
        Ok(existing) => tracing::info!(
            count = existing.len(),
            dir = %backups.backup_dir().display(),
            "Retained configuration backups"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not list configuration backups"),
    }

    if let Some(count) = read_reference_count(&locations.reference_count_file).await {
        tracing::info!(
            count,
            path = %locations.reference_count_file.display(),
            "Active router references"
        );
    }
}

/// Number recorded in the shared reference count file, if readable.
pub async fn read_reference_count(path: &std::path::Path) -> Option<u64> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    content.trim().parse().ok()
}
