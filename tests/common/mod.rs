//! Shared utilities for integration testing.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use router_control::config::ListenerConfig;
use router_control::control::{
    ControlService, ProcessSpawner, RestartCommand, RestartCoordinator, SharedRegistry,
};
use router_control::http::{HttpServer, StaticAssets};
use router_control::store::{BackupManager, ConfigStore};

/// Spawner that records commands instead of running them.
#[derive(Default)]
pub struct RecordingSpawner {
    calls: Mutex<Vec<RestartCommand>>,
}

impl RecordingSpawner {
    pub fn calls(&self) -> Vec<RestartCommand> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessSpawner for RecordingSpawner {
    fn spawn_detached(&self, command: &RestartCommand) -> std::io::Result<()> {
        self.calls.lock().unwrap().push(command.clone());
        Ok(())
    }
}

/// A daemon wired over a temporary home directory.
pub struct TestDaemon {
    pub service: Arc<ControlService>,
    pub backups: BackupManager,
    pub spawner: Arc<RecordingSpawner>,
    pub router: Router,
}

impl TestDaemon {
    pub fn new(home: &Path, registry: SharedRegistry, restart_delay: Duration) -> Self {
        let config_file = home.join("config.json");
        let spawner = Arc::new(RecordingSpawner::default());
        let restart = RestartCoordinator::new(
            spawner.clone(),
            RestartCommand::new("router-control", ["restart"]),
            restart_delay,
        );
        let service = Arc::new(ControlService::new(
            ConfigStore::new(&config_file),
            Arc::new(BackupManager::alongside(&config_file)),
            Arc::new(registry),
            restart,
        ));
        let ui = StaticAssets {
            root: home.join("dist"),
            max_age: Duration::from_secs(3600),
        };
        let router = HttpServer::new(&ListenerConfig::default(), service.clone(), Some(ui)).router();

        Self {
            service,
            backups: BackupManager::alongside(&config_file),
            spawner,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> Response<Body> {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.post_raw(uri, serde_json::to_vec(body).unwrap()).await
    }
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
