//! Archive streaming pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! GET /archive/{id}/ request
//!     → identifier.rs (sanitize the untrusted segment)
//!     → pipeline.rs (existence check, 404 decided before any bytes)
//!     → command.rs (argv [zip, -r, -, id], cwd = source root)
//!     → relay loop (≤1 MB chunks, child stdout → response body)
//!     → Completed | Aborted | Failed
//! ```
//!
//! # Design Decisions
//! - Every pre-stream failure maps to a clean HTTP status; once the body
//!   stream starts, failures can only truncate it
//! - The session task owns the child exclusively and reaps it on every
//!   exit path, so a disconnect never leaves a zombie behind
//! - Completion is defined by stdout closing; the exit status is still
//!   checked afterwards and logged when nonzero

pub mod command;
pub mod error;
pub mod identifier;
pub mod pipeline;

pub use error::ArchiveError;
pub use identifier::ArchiveId;
pub use pipeline::{open_delivery, RelayOutcome, CHUNK_SIZE, THROTTLE_DELAY};
