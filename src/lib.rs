//! On-the-fly ZIP delivery over HTTP.

pub mod archive;
pub mod config;
pub mod http;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
