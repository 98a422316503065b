use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use cqlbridge_core::ResultProjector;
use cqlbridge_service::{
    CqlEvaluateService, DynEvaluator, FhirConnection, FhirLibraryProvider, LibraryCache,
    LibrarySourceLoader, RemoteEvaluator,
};
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, handlers, operations::OperationRegistry};

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub cql: Arc<CqlEvaluateService>,
    pub operations: Arc<OperationRegistry>,
}

impl AppState {
    pub fn new(cql: CqlEvaluateService, operations: OperationRegistry) -> Self {
        Self {
            cql: Arc::new(cql),
            operations: Arc::new(operations),
        }
    }

    /// Wire the evaluate service against the configured FHIR server.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let connection = FhirConnection::from_config(&cfg.fhir)?;

        let mut loader = LibrarySourceLoader::new().with_directories(cfg.cql.library_paths.clone());
        if cfg.cql.server_libraries {
            loader = loader.with_provider(Arc::new(FhirLibraryProvider::new(connection.clone())));
        }

        let evaluator: DynEvaluator = Arc::new(RemoteEvaluator::new(connection));
        let service = CqlEvaluateService::new(
            evaluator,
            loader,
            Arc::new(LibraryCache::new(cfg.cql.cache_capacity)),
            Arc::new(ResultProjector::json()),
            cfg.cql.clone(),
        );

        tracing::info!(
            fhir.url = %cfg.fhir.url,
            library_paths = ?cfg.cql.library_paths,
            server_libraries = cfg.cql.server_libraries,
            "CQL evaluate service configured"
        );

        Ok(Self::new(service, OperationRegistry::with_defaults()))
    }
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/", post(handlers::app_operation))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status().as_u16();
                        span.record("http.status_code", tracing::field::display(status));
                        tracing::info!(
                            http.status = %status,
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    state: Option<AppState>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            state: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use prepared state instead of wiring it from the config
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> anyhow::Result<CqlBridgeServer> {
        let state = match self.state {
            Some(state) => state,
            None => AppState::from_config(&self.config)?,
        };
        let app = build_app(state, &self.config);

        Ok(CqlBridgeServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CqlBridgeServer {
    addr: SocketAddr,
    app: Router,
}

impl CqlBridgeServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
