//! HTTP/JSON boundary.
//!
//! This module builds the axum router over an [`Engine`] and runs it with
//! graceful shutdown. One route per engine operation; handlers own nothing but
//! (de)serialization. The engine handle is passed in explicitly as router
//! state, never through ambient globals.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::sync::oneshot;

use crate::{Engine, Result};

pub mod auth;
pub mod errors;
pub mod handlers;

pub use auth::API_KEY_HEADER;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<Engine>,
    pub api_key: Option<String>,
}

/// Build the API router.
///
/// Every route except the health check passes through the API-key middleware;
/// with no key configured the middleware is a pass-through.
pub fn router(engine: Arc<Engine>, api_key: Option<String>) -> Router {
    let state = ApiState { engine, api_key };

    let protected = Router::new()
        .route("/set", post(handlers::set))
        .route("/get", post(handlers::get))
        .route("/get_partial", post(handlers::get_partial))
        .route("/delete", post(handlers::delete))
        .route("/batch_set", post(handlers::batch_set))
        .route("/transaction", post(handlers::transaction))
        .route("/clear_prefix", post(handlers::clear_prefix))
        .route("/drop_database", post(handlers::drop_database))
        .route("/query/ast", post(handlers::query_ast))
        .route("/query/radius", post(handlers::query_radius))
        .route("/query/box", post(handlers::query_box))
        .route("/export", get(handlers::export))
        .route("/import", post(handlers::import))
        .route("/events", get(handlers::events))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::health))
        .merge(protected)
        .with_state(state)
}

/// A running server and the handles to stop it.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// The address the server actually bound (useful with port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

/// Bind `addr` and serve the API in a background task.
pub async fn spawn(
    engine: Arc<Engine>,
    addr: SocketAddr,
    api_key: Option<String>,
) -> Result<ServerHandle> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let app = router(engine, api_key);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!("server error: {e}");
        }
    });

    tracing::info!(%local_addr, "listening");
    Ok(ServerHandle {
        addr: local_addr,
        shutdown_tx,
        task,
    })
}
