//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Adapt the `RouteRegistrar` capability onto an axum `Router`
//! - Serve static UI assets with a `Cache-Control` header
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind the router to a listener with graceful shutdown

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path as UrlPath, Request},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::control::{ControlError, ControlService};
use crate::http::routes::{register_control_routes, ApiHandler, ApiReply, ApiRequest, RouteRegistrar, StaticAssets};

/// Builds an axum `Router` from registered control routes.
#[derive(Default)]
pub struct AxumRegistrar {
    routes: BTreeMap<String, MethodRouter>,
    assets: Vec<(String, StaticAssets)>,
}

impl AxumRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish registration.
    pub fn into_router(self) -> Router {
        let mut router = Router::new();
        for (path, method_router) in self.routes {
            router = router.route(&path, method_router);
        }
        for (prefix, assets) in self.assets {
            router = router.merge(static_router(&prefix, &assets));
        }
        router
    }

    fn add(&mut self, path: &str, attach: impl FnOnce(MethodRouter) -> MethodRouter) {
        let existing = self.routes.remove(path).unwrap_or_else(MethodRouter::new);
        self.routes.insert(path.to_string(), attach(existing));
    }
}

impl RouteRegistrar for AxumRegistrar {
    fn get(&mut self, path: &str, handler: ApiHandler) {
        // GET bodies are ignored.
        self.add(path, |route| route.get(move || dispatch(handler.clone(), Bytes::new())));
    }

    fn post(&mut self, path: &str, handler: ApiHandler) {
        self.add(path, |route| route.post(move |body: Bytes| dispatch(handler.clone(), body)));
    }

    fn serve_static(&mut self, prefix: &str, assets: StaticAssets) {
        self.assets.push((prefix.to_string(), assets));
    }
}

/// Decode the body, run the handler, encode the reply.
async fn dispatch(handler: ApiHandler, body: Bytes) -> Response {
    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => return ControlError::InvalidBody(e.to_string()).into_response(),
        }
    };

    match handler(ApiRequest { body }).await {
        Ok(ApiReply::Json(value)) => Json(value).into_response(),
        Ok(ApiReply::Redirect(location)) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(e) => e.into_response(),
    }
}

fn static_router(prefix: &str, assets: &StaticAssets) -> Router {
    let base = prefix.trim_end_matches('/');
    let dir = ServeDir::new(&assets.root);
    let index_dir = dir.clone();
    let cache_control = HeaderValue::try_from(format!("public, max-age={}", assets.max_age.as_secs()))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"));

    Router::new()
        .route(
            &format!("{base}/"),
            get(move |request: Request| serve_asset(index_dir.clone(), String::new(), request)),
        )
        .route(
            &format!("{base}/{{*path}}"),
            get(move |UrlPath(path): UrlPath<String>, request: Request| {
                serve_asset(dir.clone(), path, request)
            }),
        )
        .layer(SetResponseHeaderLayer::if_not_present(header::CACHE_CONTROL, cache_control))
}

/// Serve `relative` from `dir`, ignoring the mount prefix.
async fn serve_asset(dir: ServeDir, relative: String, mut request: Request) -> Response {
    match format!("/{relative}").parse() {
        Ok(uri) => *request.uri_mut() = uri,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    }
    match dir.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// HTTP server for the control daemon.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server exposing `service`, plus UI assets when given.
    pub fn new(listener: &ListenerConfig, service: Arc<ControlService>, ui: Option<StaticAssets>) -> Self {
        let mut registrar = AxumRegistrar::new();
        register_control_routes(&mut registrar, service, ui);
        let router = Self::build_router(listener, registrar.into_router());
        Self { router }
    }

    /// Wrap the routes with all middleware layers.
    #[allow(deprecated)]
    fn build_router(listener: &ListenerConfig, routes: Router) -> Router {
        routes
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(listener.request_timeout_secs)))
            .layer(RequestBodyLimitLayer::new(listener.max_body_bytes))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
