//! Control API routes, independent of the HTTP framework.
//!
//! | Method | Path              | Reply                          |
//! |--------|-------------------|--------------------------------|
//! | GET    | /api/config       | configuration, unredacted      |
//! | GET    | /api/transformers | `{transformers: [...]}`        |
//! | POST   | /api/config       | `{success, message}`           |
//! | POST   | /api/restart      | `{success, message}` at once   |
//! | GET    | /ui               | redirect to /ui/               |
//! | GET    | /ui/...           | static assets                  |

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::{json, Value};

use crate::control::{ControlError, ControlService};
use crate::store::Configuration;

pub const UI_PATH: &str = "/ui";
pub const UI_PREFIX: &str = "/ui/";

/// Request data handed to a handler.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    /// Parsed JSON body, `None` when the request had no body.
    pub body: Option<Value>,
}

/// What a handler asks the transport to send back.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    Json(Value),
    Redirect(String),
}

pub type ApiResult = Result<ApiReply, ControlError>;

pub type ApiHandler = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, ApiResult> + Send + Sync>;

/// Directory of static files served under a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAssets {
    pub root: PathBuf,
    pub max_age: Duration,
}

/// The routing capability the control API needs from a transport.
pub trait RouteRegistrar {
    fn get(&mut self, path: &str, handler: ApiHandler);
    fn post(&mut self, path: &str, handler: ApiHandler);
    fn serve_static(&mut self, prefix: &str, assets: StaticAssets);
}

/// Register the control API on `registrar`.
pub fn register_control_routes<R>(registrar: &mut R, service: Arc<ControlService>, ui: Option<StaticAssets>)
where
    R: RouteRegistrar + ?Sized,
{
    registrar.get("/api/config", handler(&service, get_config));
    registrar.get("/api/transformers", handler(&service, list_transformers));
    registrar.post("/api/config", handler(&service, save_config));
    registrar.post("/api/restart", handler(&service, restart));
    registrar.get(UI_PATH, redirect(UI_PREFIX));

    if let Some(assets) = ui {
        registrar.serve_static(UI_PREFIX, assets);
    }
}

fn handler<F, Fut>(service: &Arc<ControlService>, f: F) -> ApiHandler
where
    F: Fn(Arc<ControlService>, ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult> + Send + 'static,
{
    let service = service.clone();
    Arc::new(move |request: ApiRequest| f(service.clone(), request).boxed())
}

fn redirect(location: &'static str) -> ApiHandler {
    Arc::new(move |_: ApiRequest| {
        future::ready::<ApiResult>(Ok(ApiReply::Redirect(location.to_string()))).boxed()
    })
}

async fn get_config(service: Arc<ControlService>, _: ApiRequest) -> ApiResult {
    let config = service.get_config().await?;
    Ok(ApiReply::Json(config.into_value()))
}

async fn list_transformers(service: Arc<ControlService>, _: ApiRequest) -> ApiResult {
    Ok(ApiReply::Json(json!({ "transformers": service.list_transformers() })))
}

async fn save_config(service: Arc<ControlService>, request: ApiRequest) -> ApiResult {
    let candidate = parse_configuration(request.body)?;
    let result = service.save_config(&candidate).await?;
    Ok(ApiReply::Json(json!(result)))
}

async fn restart(service: Arc<ControlService>, _: ApiRequest) -> ApiResult {
    Ok(ApiReply::Json(json!(service.request_restart())))
}

fn parse_configuration(body: Option<Value>) -> Result<Configuration, ControlError> {
    let body = body.ok_or_else(|| ControlError::InvalidBody("missing configuration body".into()))?;
    Configuration::try_from(body)
        .map_err(|_| ControlError::InvalidBody("configuration must be a JSON object".into()))
}
