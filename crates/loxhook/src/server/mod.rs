//! HTTP front end.
//!
//! Routes virtual input requests through rate limiting, control lookup,
//! authorization and translation, then forwards them to the Miniserver.

mod error;
mod handler;
mod state;


use std::net::SocketAddr;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dvi/:control/:command", get(handler::dvi).post(handler::dvi))
        .route("/healthz", get(handler::healthz))
        .fallback(handler::not_found)
        .layer(middleware::from_fn(handler::access_log))
        .with_state(state)
}

/// Serve until ctrl-c, then drain in-flight requests.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until killed.
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
