//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the source root actually exists on disk
//! - Validate the bind address and archiver program name
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over `ServerConfig` plus the filesystem
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::schema::ServerConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Bind address does not parse as `host:port`.
    InvalidBindAddress(String),
    /// Source root does not exist.
    SourceRootMissing(PathBuf),
    /// Source root exists but is not a directory.
    SourceRootNotDirectory(PathBuf),
    /// Archiver program name is empty.
    ArchiverEmpty,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "invalid bind address {:?}", addr)
            }
            ValidationError::SourceRootMissing(path) => {
                write!(f, "source root {:?} does not exist", path)
            }
            ValidationError::SourceRootNotDirectory(path) => {
                write!(f, "source root {:?} is not a directory", path)
            }
            ValidationError::ArchiverEmpty => write!(f, "archiver program name is empty"),
        }
    }
}

/// Validate a configuration, collecting every semantic error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match std::fs::metadata(&config.delivery.source_root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => errors.push(ValidationError::SourceRootNotDirectory(
            config.delivery.source_root.clone(),
        )),
        Err(_) => errors.push(ValidationError::SourceRootMissing(
            config.delivery.source_root.clone(),
        )),
    }

    if config.delivery.archiver.is_empty() {
        errors.push(ValidationError::ArchiverEmpty);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
