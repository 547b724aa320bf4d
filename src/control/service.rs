//! Control service façade.

use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::control::registry::{TransformerDescriptor, TransformerRegistry};
use crate::control::restart::RestartCoordinator;
use crate::observability::metrics;
use crate::store::{BackupOutcome, ConfigBackup, ConfigStore, Configuration, StoreError};

pub const SAVE_OK_MESSAGE: &str = "Config saved successfully";

/// `{success, message}` reply for mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Read, save, list and restart operations behind one handle.
pub struct ControlService {
    store: ConfigStore,
    backups: Arc<dyn ConfigBackup>,
    registry: Arc<dyn TransformerRegistry>,
    restart: RestartCoordinator,
}

impl ControlService {
    pub fn new(
        store: ConfigStore,
        backups: Arc<dyn ConfigBackup>,
        registry: Arc<dyn TransformerRegistry>,
        restart: RestartCoordinator,
    ) -> Self {
        Self {
            store,
            backups,
            registry,
            restart,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn restart(&self) -> &RestartCoordinator {
        &self.restart
    }

    /// Current configuration, verbatim. Credentials are not redacted.
    pub async fn get_config(&self) -> Result<Configuration, StoreError> {
        let result = self.store.read().await;
        metrics::record_config_read(result.is_ok());
        result
    }

    /// Back up the current file, then persist `candidate`.
    ///
    /// The backup outcome never affects the result; write errors do. The
    /// save runs on its own task, so dropping the returned future does not
    /// interrupt it.
    pub async fn save_config(&self, candidate: &Configuration) -> Result<ActionResult, StoreError> {
        let store = self.store.clone();
        let backups = self.backups.clone();
        let candidate = candidate.clone();
        let task = tokio::spawn(async move { backup_then_write(&store, backups.as_ref(), &candidate).await });

        match task.await {
            Ok(result) => result.map(|()| ActionResult::ok(SAVE_OK_MESSAGE)),
            Err(e) => Err(StoreError::Write {
                path: self.store.path().to_path_buf(),
                source: io::Error::other(e),
            }),
        }
    }

    /// Transformers in registry order.
    pub fn list_transformers(&self) -> Vec<TransformerDescriptor> {
        self.registry
            .entries()
            .into_iter()
            .map(|(name, entry)| TransformerDescriptor {
                name,
                endpoint: entry.end_point,
            })
            .collect()
    }

    /// Acknowledge a restart; the command runs after the configured delay.
    pub fn request_restart(&self) -> ActionResult {
        self.restart.request_restart()
    }
}

async fn backup_then_write(
    store: &ConfigStore,
    backups: &dyn ConfigBackup,
    candidate: &Configuration,
) -> Result<(), StoreError> {
    match backups.backup().await {
        BackupOutcome::Created(handle) => {
            tracing::debug!(backup = %handle.path().display(), "Backup ready before save");
        }
        BackupOutcome::Skipped => {}
        BackupOutcome::Failed(warning) => {
            tracing::warn!(error = %warning, "Saving configuration without a backup");
        }
    }

    if let Err(e) = store.write(candidate).await {
        metrics::record_config_save(false);
        return Err(e);
    }

    metrics::record_config_save(true);
    tracing::info!(
        path = %store.path().display(),
        keys = candidate.len(),
        "Configuration saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::registry::{SharedRegistry, TransformerEntry};
    use crate::control::restart::{ProcessSpawner, RestartCommand};
    use crate::store::{BackupManager, BackupWarning};
    use futures_util::future::{BoxFuture, FutureExt};
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoopSpawner;

    impl ProcessSpawner for NoopSpawner {
        fn spawn_detached(&self, _command: &RestartCommand) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Fails every backup, remembering the file contents it saw.
    struct FailingBackup {
        source: PathBuf,
        seen: Mutex<Vec<Option<Vec<u8>>>>,
    }

    impl ConfigBackup for FailingBackup {
        fn backup(&self) -> BoxFuture<'_, BackupOutcome> {
            self.seen.lock().unwrap().push(std::fs::read(&self.source).ok());
            let warning = BackupWarning {
                source_path: self.source.clone(),
                backup_dir: PathBuf::from("/nonexistent"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            };
            futures_util::future::ready(BackupOutcome::Failed(warning)).boxed()
        }
    }

    fn service_with(dir: &Path, registry: SharedRegistry, backups: Arc<dyn ConfigBackup>) -> ControlService {
        let restart = RestartCoordinator::new(
            Arc::new(NoopSpawner),
            RestartCommand::new("router-control", ["restart"]),
            Duration::from_secs(1),
        );
        ControlService::new(
            ConfigStore::new(dir.join("config.json")),
            backups,
            Arc::new(registry),
            restart,
        )
    }

    fn service(dir: &Path) -> ControlService {
        service_with(
            dir,
            SharedRegistry::new(),
            Arc::new(BackupManager::alongside(dir.join("config.json"))),
        )
    }

    fn backups_of(dir: &Path) -> BackupManager {
        BackupManager::alongside(dir.join("config.json"))
    }

    fn config(value: serde_json::Value) -> Configuration {
        serde_json::from_value(value).unwrap()
    }

    fn leftover_temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[tokio::test]
    async fn test_get_config_returns_secrets_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path());
        let stored = config(json!({
            "APIKEY": "k",
            "Providers": [{ "name": "p", "api_key": "p" }]
        }));

        service.save_config(&stored).await.unwrap();
        let loaded = service.get_config().await.unwrap();

        assert_eq!(loaded, stored);
        assert_eq!(loaded.get("APIKEY"), Some(&json!("k")));
        assert_eq!(loaded.providers()[0].api_key, "p");
    }

    #[tokio::test]
    async fn test_get_config_propagates_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let err = service(temp_dir.path()).get_config().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_without_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path());

        let result = service.save_config(&config(json!({"LOG": false}))).await.unwrap();

        assert_eq!(result, ActionResult::ok("Config saved successfully"));
        assert!(backups_of(temp_dir.path()).list().await.unwrap().is_empty());
        assert_eq!(service.get_config().await.unwrap(), config(json!({"LOG": false})));
    }

    #[tokio::test]
    async fn test_save_backs_up_previous_contents_once() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path());
        let first = config(json!({"APIKEY": "old"}));
        let second = config(json!({"APIKEY": "new"}));

        service.save_config(&first).await.unwrap();
        let before = std::fs::read(service.store().path()).unwrap();
        service.save_config(&second).await.unwrap();

        let backups = backups_of(temp_dir.path()).list().await.unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read(&backups[0]).unwrap(), before);
        assert_eq!(service.get_config().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_save_succeeds_when_backup_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let service = service_with(
            temp_dir.path(),
            SharedRegistry::new(),
            Arc::new(BackupManager::new(temp_dir.path().join("config.json"), &blocker)),
        );

        service.save_config(&config(json!({"a": 1}))).await.unwrap();
        let result = service.save_config(&config(json!({"a": 2}))).await.unwrap();

        assert!(result.success);
        assert_eq!(service.get_config().await.unwrap(), config(json!({"a": 2})));
    }

    #[tokio::test]
    async fn test_failed_backup_attempted_once_before_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"a":"old"}"#).unwrap();
        let backup = Arc::new(FailingBackup {
            source: path.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let service = service_with(temp_dir.path(), SharedRegistry::new(), backup.clone());

        let result = service.save_config(&config(json!({"a": "new"}))).await.unwrap();

        assert!(result.success);
        assert_eq!(*backup.seen.lock().unwrap(), vec![Some(br#"{"a":"old"}"#.to_vec())]);
        assert_eq!(service.get_config().await.unwrap(), config(json!({"a": "new"})));
    }

    #[tokio::test]
    async fn test_save_propagates_write_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path());
        // A non-empty directory at the config path cannot be replaced.
        std::fs::create_dir(service.store().path()).unwrap();
        std::fs::write(service.store().path().join("x"), "").unwrap();

        let err = service.save_config(&config(json!({"a": 1}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_abandoned_saves_still_complete() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path());
        service.save_config(&config(json!({"v": "old"}))).await.unwrap();

        let next = config(json!({"v": "new"}));
        for i in 0..20u64 {
            let save = service.save_config(&next);
            let _ = tokio::time::timeout(Duration::from_micros(i * 20), save).await;
        }

        // Every abandoned save backs up once before writing.
        let backups = backups_of(temp_dir.path());
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let done = backups.list().await.unwrap().len() == 20
                && leftover_temp_files(temp_dir.path()) == 0
                && service.get_config().await.ok() == Some(config(json!({"v": "new"})));
            if done || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(service.get_config().await.unwrap(), config(json!({"v": "new"})));
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_list_transformers_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(service(temp_dir.path()).list_transformers().is_empty());
    }

    #[test]
    fn test_list_transformers_projects_entries_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SharedRegistry::new();
        registry.register("t1", TransformerEntry::with_endpoint("http://x"));
        registry.register("t2", TransformerEntry::default());
        let service = service_with(
            temp_dir.path(),
            registry,
            Arc::new(BackupManager::alongside(temp_dir.path().join("config.json"))),
        );

        assert_eq!(
            service.list_transformers(),
            vec![
                TransformerDescriptor { name: "t1".into(), endpoint: Some("http://x".into()) },
                TransformerDescriptor { name: "t2".into(), endpoint: None },
            ]
        );
    }
}
