//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the axum Router with both routes
//! - Wire up middleware (tracing, request ID)
//! - Serve the index page
//! - Hand archive requests to the streaming pipeline

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::archive::{open_delivery, ArchiveError, ArchiveId};
use crate::config::schema::ServerConfig;
use crate::http::request::MakeRequestUuid;

/// Application state injected into handlers.
///
/// Everything in here is read-only; concurrent sessions share nothing else.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

/// HTTP server for the delivery service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState {
            config: Arc::new(config),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/archive/{archive_hash}/", get(archive_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /` — the fixed index page.
async fn index_handler(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(&state.config.delivery.index_path).await {
        Ok(contents) => Html(contents).into_response(),
        Err(error) => {
            tracing::error!(
                path = %state.config.delivery.index_path.display(),
                error = %error,
                "Failed to read index page"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "index page unavailable").into_response()
        }
    }
}

/// `GET /archive/{archive_hash}/` — the streamed ZIP download.
///
/// Sanitization, the existence check, and header construction all happen
/// before the body stream starts, so every error here is a clean status.
async fn archive_handler(
    State(state): State<AppState>,
    Path(archive_hash): Path<String>,
    uri: Uri,
) -> Result<Response, ArchiveError> {
    let id = ArchiveId::parse(&archive_hash)?;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}.zip\"", id))
        .map_err(|_| ArchiveError::InvalidIdentifier(archive_hash.clone()))?;

    let body = open_delivery(&state.config, &id, uri.path()).await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/zip"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
