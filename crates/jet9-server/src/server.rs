//! `Jet9Server`: axum listener over a built route table.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use jet9_core::ResponseEnvelope;
use jet9_rpc::{Dispatcher, Route, RouteTable};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;

/// Paths the server serves itself; no subsystem may use them.
pub const RESERVED_PATHS: &[&str] = &["health", "metrics"];

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Served routes.
    pub routes: Arc<RouteTable>,
    /// Request dispatcher.
    pub dispatcher: Dispatcher,
    /// When the server was created.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`.
    pub metrics: Option<PrometheusHandle>,
}

/// The jet9 server.
///
/// Construction does no I/O. [`router`](Self::router) can be driven directly
/// (e.g. with `tower::ServiceExt::oneshot`); [`listen`](Self::listen) binds
/// the configured address and serves it.
pub struct Jet9Server {
    config: ServerConfig,
    routes: Arc<RouteTable>,
    dispatcher: Dispatcher,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl Jet9Server {
    /// Create a server over `routes`.
    pub fn new(config: ServerConfig, routes: RouteTable) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.handler_timeout()),
            config,
            routes: Arc::new(routes),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Serve Prometheus metrics from `handle` at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the axum router: one `POST` route per subsystem (with and
    /// without a trailing slash), `/health`, and `/metrics` when enabled.
    pub fn router(&self) -> Router {
        let state = AppState {
            routes: self.routes.clone(),
            dispatcher: self.dispatcher,
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        let mut router = Router::new().route("/health", get(health_handler));
        if self.metrics.is_some() {
            router = router.route("/metrics", get(metrics_handler));
        }

        for route in self.routes.routes() {
            if RESERVED_PATHS.iter().any(|path| *path == route.subsystem()) {
                error!(
                    subsystem = route.subsystem(),
                    module = route.module(),
                    "subsystem shadows a built-in path, not served"
                );
                continue;
            }
            let endpoint = Arc::new(route.clone());
            let handler = post(move |State(state): State<AppState>, body: Bytes| {
                let endpoint = Arc::clone(&endpoint);
                async move { subsystem_handler(&state, &endpoint, &body).await }
            });
            router = router
                .route(route.pattern(), handler.clone())
                .route(&route.slash_pattern(), handler);
        }

        router
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until shutdown is signalled.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let token = self.shutdown.token();
        info!(%local_addr, routes = self.routes.len(), "jet9 server listening");

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(err) = result {
                error!(error = %err, "server stopped with error");
            }
        });

        Ok((local_addr, handle))
    }

    /// Shutdown coordinator for the serve task.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Served routes.
    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }
}

/// POST /{subsystem}
///
/// The HTTP status is always `200`; the protocol status is in the body.
async fn subsystem_handler(state: &AppState, route: &Route, body: &Bytes) -> Json<ResponseEnvelope> {
    Json(state.dispatcher.dispatch(route, body).await)
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let subsystems = state
        .routes
        .subsystems()
        .into_iter()
        .map(str::to_owned)
        .collect();
    Json(health::health_check(state.start_time, subsystems))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            crate::metrics::render(handle),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
