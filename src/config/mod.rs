//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags + optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc to all request handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow running with no flags at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::DeliveryConfig;
pub use schema::ListenerConfig;
pub use schema::ServerConfig;
