use std::{io, sync::Arc, time::Duration};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod repl;

use domain::{
    dispatcher::Dispatcher, registry::ToolRegistry, session::SessionStore,
    tools::register_builtin_tools,
};
use errors::RegistryError;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct AppState {
    pub api_token: Option<Arc<str>>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(api_token: Option<String>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            api_token: api_token.map(Arc::<str>::from),
            dispatcher,
        }
    }
}

/// Registers the built-in tools and freezes the registry. A registration
/// failure means the server must not start.
pub fn build_dispatcher(tool_timeout: Duration) -> Result<Dispatcher, RegistryError> {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry)?;

    Ok(Dispatcher::new(
        Arc::new(registry),
        Arc::new(SessionStore::new()),
        tool_timeout,
    ))
}

/// Stops a background server task. A server that already exited with an
/// error has that error logged and returned instead of being discarded.
pub async fn shutdown_server(server: JoinHandle<io::Result<()>>) -> io::Result<()> {
    if !server.is_finished() {
        server.abort();
        return Ok(());
    }

    match server.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "server exited with an error");
            Err(err)
        }
        Err(err) => {
            tracing::error!(error = %err, "server task failed");
            Err(io::Error::other(err))
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route_layer(middleware::from_fn(http::identity::resolve_client_identity))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
