pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use snip_core::FileStore;
use tokio::sync::broadcast;
use utoipa_swagger_ui::SwaggerUi;

use crate::runner::Runner;

#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<FileStore>,
    pub runner: Arc<Runner>,
}

impl HttpState {
    pub fn new(store: Arc<FileStore>, runner: Arc<Runner>) -> Self {
        Self { store, runner }
    }
}

/// Full application router: API under `/api`, Swagger UI at `/api/docs`.
pub fn app(state: HttpState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", api::openapi()))
        .nest("/api", api::router())
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    app: Router,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {addr}: {e}"))?;
    tracing::info!("HTTP server listening on http://{}", addr);
    let mut shutdown_rx = shutdown_tx.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| format!("serve {addr}: {e}"))
}
