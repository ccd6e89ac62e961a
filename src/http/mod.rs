//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, route dispatch)
//!     → request.rs (stamp x-request-id)
//!     → GET /             → index page
//!     → GET /archive/{id}/ → archive streaming pipeline
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
