//! HTTP surface of the relay.
//!
//! - `GET /topics/{platform}/{topic}` - resolve, fetch, parse, return JSON
//! - `GET /topics` and `GET /topics/{platform}` - registry discovery
//!
//! Every response passes through the CORS middleware, and `OPTIONS` is
//! answered there with 204. Requests share nothing mutable: the registry is
//! behind an `Arc` and the fetcher's client pool is internally synchronized.

mod error;
mod handlers;
mod middleware;

use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::feed::FeedFetcher;
use crate::registry::Registry;

pub use error::{RelayError, RelayResult, UPSTREAM_FAILURE_MESSAGE};

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub fetcher: FeedFetcher,
}

impl AppState {
    pub fn new(registry: Registry, fetcher: FeedFetcher) -> Self {
        Self {
            registry: Arc::new(registry),
            fetcher,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/topics", get(handlers::list_platforms))
        .route("/topics/{platform}", get(handlers::list_topics))
        .route("/topics/{platform}/{topic}", get(handlers::get_topic_feed))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::cors))
        .layer(axum::middleware::from_fn(middleware::log_request))
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
///
/// A client that disconnects mid-request drops its handler future, which
/// cancels the upstream fetch with it.
pub async fn run<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
