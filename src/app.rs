//! Application bootstrap: middleware, route table, store connection, listener.
//!
//! Startup runs in strict order and stops at the first failure, so a dead database
//! means the listener is never opened.

use crate::config::AppConfig;
use crate::error::StartupError;
use crate::handlers::fallback::panic_response;
use crate::resources::ResourceRegistry;
use crate::routes::app_routes;
use crate::shutdown::{Outcome, Shutdown};
use crate::state::AppState;
use crate::store;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct HttpOptions {
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions {
            cors_origins: Vec::new(),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl From<&AppConfig> for HttpOptions {
    fn from(config: &AppConfig) -> Self {
        HttpOptions {
            cors_origins: config.cors_origins.clone(),
            body_limit_bytes: config.body_limit_bytes,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Route table wrapped in body limit, CORS, panic catching and request tracing.
/// Needs `with_state` before it can serve. The body limit is enforced by the `Json`
/// extractor, so an oversized body is a rejection the handler turns into an envelope.
pub fn router(registry: &ResourceRegistry, options: &HttpOptions) -> Router<AppState> {
    app_routes(registry)
        .layer(DefaultBodyLimit::max(options.body_limit_bytes))
        .layer(cors_layer(&options.cors_origins))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// A fully started application, bound but not yet serving.
pub struct Server {
    listener: TcpListener,
    app: Router,
    state: AppState,
}

impl Server {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until shutdown, release the store, and report how the process ended.
    pub async fn serve(self, shutdown: Shutdown) -> Outcome {
        let outcome = shutdown.serve(self.listener, self.app).await;
        self.state.store.close().await;
        shutdown.terminate();
        outcome
    }
}

/// Middleware and routes, then the store, then the listener.
pub async fn bootstrap(config: &AppConfig, registry: ResourceRegistry) -> Result<Server, StartupError> {
    let routes = router(&registry, &HttpOptions::from(config));

    let store = store::connect(config).await?;
    let state = AppState::new(store, registry, config.environment);
    if let Err(e) = state.ensure_collections().await {
        state.store.close().await;
        return Err(e.into());
    }

    let addr = config.listen_addr();
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(source) => {
            state.store.close().await;
            return Err(StartupError::Bind { addr, source });
        }
    };
    tracing::info!(addr = %listener.local_addr().unwrap_or(addr), env = ?config.environment, "listening");

    Ok(Server {
        listener,
        app: routes.with_state(state.clone()),
        state,
    })
}

/// Start the default resources and run until a signal or fault. The caller keeps a
/// clone of `shutdown` to report faults from outside the server.
pub async fn run(config: AppConfig, shutdown: Shutdown) -> Result<Outcome, StartupError> {
    let registry = ResourceRegistry::with_defaults()?;
    let server = bootstrap(&config, registry).await?;
    shutdown.listen_for_signals();
    Ok(server.serve(shutdown).await)
}
