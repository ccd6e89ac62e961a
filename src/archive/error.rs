//! Archive pipeline error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures decided before any response bytes are sent.
///
/// Everything after response initiation can only truncate the body, so it
/// is reported through logs rather than through this type.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Identifier failed sanitization (separators, traversal, leading dash).
    #[error("invalid archive identifier {0:?}")]
    InvalidIdentifier(String),

    /// No directory with this name under the source root.
    #[error("no archive named {0:?}")]
    NotFound(String),

    /// The archiver process could not be started.
    #[error("failed to start archiver: {0}")]
    Spawn(#[source] std::io::Error),
}

impl IntoResponse for ArchiveError {
    fn into_response(self) -> Response {
        let status = match &self {
            ArchiveError::InvalidIdentifier(id) => {
                tracing::warn!(identifier = %id, "Rejected unsafe archive identifier");
                StatusCode::BAD_REQUEST
            }
            ArchiveError::NotFound(id) => {
                tracing::debug!(identifier = %id, "Archive directory not found");
                StatusCode::NOT_FOUND
            }
            ArchiveError::Spawn(error) => {
                tracing::error!(error = %error, "Failed to start archiver");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
