//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the delivery service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Archive delivery settings.
    pub delivery: DeliveryConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Archive delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Directory whose subdirectories can be requested as archives.
    pub source_root: PathBuf,

    /// Insert a fixed one-second pause between relayed chunks.
    ///
    /// Exists purely to make bandwidth-limited behavior observable while
    /// debugging, not for production rate limiting.
    pub throttle: bool,

    /// HTML file served for `GET /`.
    pub index_path: PathBuf,

    /// Archiver program invoked to produce the ZIP stream.
    pub archiver: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("test_photos"),
            throttle: false,
            index_path: PathBuf::from("index.html"),
            archiver: "zip".to_string(),
        }
    }
}
