//! The streaming session: spawn, relay, cancellation, cleanup.
//!
//! # Data Flow
//! ```text
//! open_delivery
//!     → existence check (404 while headers can still change)
//!     → spawn archiver (stdout piped, stderr drained to logs)
//!     → session task: read ≤ CHUNK_SIZE → send to body channel → [sleep]
//!     → body: channel receiver wrapped as a Stream for axum
//! ```
//!
//! Client disconnect drops the body stream, which closes the channel; the
//! session observes that at its next suspension point, kills the child,
//! reaps it, and logs the interrupted transfer.

use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use futures_util::Stream;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::mpsc;

use crate::archive::command::archive_command;
use crate::archive::error::ArchiveError;
use crate::archive::identifier::ArchiveId;
use crate::config::schema::ServerConfig;

/// Upper bound on a single read from the archiver's stdout.
pub const CHUNK_SIZE: usize = 1_000_000;

/// Pause inserted after each chunk when throttling is enabled.
pub const THROTTLE_DELAY: Duration = Duration::from_secs(1);

/// Terminal state of one streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The archiver's stdout closed and it exited cleanly.
    Completed,
    /// The client went away mid-stream; the child was killed and reaped.
    Aborted,
    /// Stdout read failure or a nonzero exit after the stream closed.
    Failed,
}

/// Validate the identifier against the source root and start streaming.
///
/// Returns the response body on success; the caller owns the headers. All
/// errors here surface before the first body byte, so they still map to
/// clean HTTP statuses.
pub async fn open_delivery(
    config: &ServerConfig,
    id: &ArchiveId,
    request_path: &str,
) -> Result<Body, ArchiveError> {
    let directory = config.delivery.source_root.join(id.as_str());
    let is_dir = tokio::fs::metadata(&directory)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ArchiveError::NotFound(id.to_string()));
    }

    let mut child = archive_command(config, id)
        .spawn()
        .map_err(ArchiveError::Spawn)?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ArchiveError::Spawn(io::Error::other("archiver stdout was not captured")))?;
    if let Some(stderr) = child.stderr.take() {
        // Drain stderr so a chatty archiver can't deadlock on a full pipe.
        tokio::spawn(drain_stderr(stderr, request_path.to_string()));
    }

    let (tx, rx) = mpsc::channel(1);
    let session = StreamingSession {
        child,
        stdout,
        tx,
        throttle: config.delivery.throttle,
        request_path: request_path.to_string(),
    };
    tokio::spawn(session.relay());

    Ok(Body::from_stream(DeliveryBody { rx }))
}

/// Per-request state; exclusively owns the child for its whole lifetime.
struct StreamingSession {
    child: Child,
    stdout: ChildStdout,
    tx: mpsc::Sender<Bytes>,
    throttle: bool,
    request_path: String,
}

impl StreamingSession {
    /// The relay loop, run to a terminal outcome on its own task.
    ///
    /// Bytes are forwarded strictly in stdout order, one bounded chunk per
    /// iteration. A closed channel means the client disconnected; it can
    /// surface while parked in the read, in the send, or in the throttle
    /// pause, and all three funnel into the same abort path.
    async fn relay(self) -> RelayOutcome {
        let Self {
            mut child,
            mut stdout,
            tx,
            throttle,
            request_path,
        } = self;

        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let read = tokio::select! {
                read = stdout.read(&mut buf) => read,
                () = tx.closed() => return abort(child, &request_path).await,
            };
            let n = match read {
                Ok(0) => break,
                Ok(n) => n,
                Err(error) => {
                    tracing::warn!(
                        path = %request_path,
                        error = %error,
                        "Archiver output read failed"
                    );
                    kill_and_reap(&mut child).await;
                    return RelayOutcome::Failed;
                }
            };
            if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                return abort(child, &request_path).await;
            }
            if throttle {
                tokio::select! {
                    () = tokio::time::sleep(THROTTLE_DELAY) => {}
                    () = tx.closed() => return abort(child, &request_path).await,
                }
            }
        }

        // Stdout closed cleanly: the delivery itself is done, but a nonzero
        // exit still gets flagged in the logs (it cannot change the
        // already-sent status).
        match child.wait().await {
            Ok(status) if status.success() => {
                tracing::info!(path = %request_path, "Load success");
                RelayOutcome::Completed
            }
            Ok(status) => {
                tracing::warn!(
                    path = %request_path,
                    %status,
                    "Archiver exited with failure after its output closed"
                );
                RelayOutcome::Failed
            }
            Err(error) => {
                tracing::warn!(path = %request_path, error = %error, "Failed to reap archiver");
                RelayOutcome::Failed
            }
        }
    }
}

/// Cancellation path: log, kill, reap. Never leaves a zombie.
async fn abort(mut child: Child, request_path: &str) -> RelayOutcome {
    tracing::warn!(path = %request_path, "Load interrupted");
    kill_and_reap(&mut child).await;
    RelayOutcome::Aborted
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(error) = child.start_kill() {
        tracing::warn!(error = %error, "Failed to signal archiver");
    }
    if let Err(error) = child.wait().await {
        tracing::warn!(error = %error, "Failed to reap archiver");
    }
}

async fn drain_stderr(stderr: ChildStderr, request_path: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(path = %request_path, line = %line, "Archiver stderr");
    }
}

/// Adapts the relay channel into a `Stream` for the response body.
///
/// Dropping this (axum does so when the client goes away) closes the
/// channel, which the relay loop observes as cancellation.
struct DeliveryBody {
    rx: mpsc::Receiver<Bytes>,
}

impl Stream for DeliveryBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx).map(|chunk| chunk.map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Stdio;
    use std::time::Instant;
    use tokio::process::Command;

    fn spawn_sh(script: &str) -> Child {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(script);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);
        cmd.spawn().unwrap()
    }

    fn session(mut child: Child, throttle: bool) -> (StreamingSession, mpsc::Receiver<Bytes>) {
        let stdout = child.stdout.take().unwrap();
        let (tx, rx) = mpsc::channel(1);
        let session = StreamingSession {
            child,
            stdout,
            tx,
            throttle,
            request_path: "/archive/test/".to_string(),
        };
        (session, rx)
    }

    async fn collect(mut rx: mpsc::Receiver<Bytes>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = rx.recv().await {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_relay_completes_in_order() {
        let (session, rx) = session(spawn_sh("printf alpha; printf beta"), false);
        let relay = tokio::spawn(session.relay());

        assert_eq!(collect(rx).await, b"alphabeta");
        assert_eq!(relay.await.unwrap(), RelayOutcome::Completed);
    }

    #[tokio::test]
    async fn test_relay_preserves_large_output() {
        // More than two chunks' worth of stdout.
        let (session, rx) = session(spawn_sh("head -c 2500000 /dev/zero"), false);
        let relay = tokio::spawn(session.relay());

        let bytes = collect(rx).await;
        assert_eq!(bytes.len(), 2_500_000);
        assert!(bytes.iter().all(|&b| b == 0));
        assert_eq!(relay.await.unwrap(), RelayOutcome::Completed);
    }

    #[tokio::test]
    async fn test_relay_flags_nonzero_exit() {
        let (session, rx) = session(spawn_sh("printf data; exit 3"), false);
        let relay = tokio::spawn(session.relay());

        // The bytes produced before the failure are still delivered.
        assert_eq!(collect(rx).await, b"data");
        assert_eq!(relay.await.unwrap(), RelayOutcome::Failed);
    }

    #[tokio::test]
    async fn test_relay_aborts_and_reaps_on_disconnect() {
        let child = spawn_sh("printf head; exec sleep 30");
        let pid = child.id().unwrap();
        let (session, mut rx) = session(child, false);
        let relay = tokio::spawn(session.relay());

        let first = rx.recv().await.unwrap();
        assert_eq!(&first[..], b"head");
        drop(rx); // client disconnect

        assert_eq!(relay.await.unwrap(), RelayOutcome::Aborted);
        // Reaped, not a zombie: the pid entry is gone entirely.
        assert!(!Path::new(&format!("/proc/{pid}")).exists());
    }

    #[tokio::test]
    async fn test_disconnect_during_throttle_pause_aborts() {
        let child = spawn_sh("printf head; exec sleep 30");
        let pid = child.id().unwrap();
        let (session, mut rx) = session(child, true);
        let relay = tokio::spawn(session.relay());

        let first = rx.recv().await.unwrap();
        assert_eq!(&first[..], b"head");
        let dropped_at = Instant::now();
        drop(rx);

        assert_eq!(relay.await.unwrap(), RelayOutcome::Aborted);
        // The abort happened inside the throttle pause, not 30s later.
        assert!(dropped_at.elapsed() < Duration::from_secs(5));
        assert!(!Path::new(&format!("/proc/{pid}")).exists());
    }

    #[tokio::test]
    async fn test_throttle_delays_each_chunk() {
        let (session, rx) = session(spawn_sh("printf chunk"), true);
        let start = Instant::now();
        let relay = tokio::spawn(session.relay());

        assert_eq!(collect(rx).await, b"chunk");
        assert_eq!(relay.await.unwrap(), RelayOutcome::Completed);
        assert!(start.elapsed() >= THROTTLE_DELAY);
    }

    #[tokio::test]
    async fn test_no_delay_when_throttle_disabled() {
        let (session, rx) = session(spawn_sh("printf chunk"), false);
        let start = Instant::now();
        let relay = tokio::spawn(session.relay());

        assert_eq!(collect(rx).await, b"chunk");
        assert_eq!(relay.await.unwrap(), RelayOutcome::Completed);
        assert!(start.elapsed() < THROTTLE_DELAY);
    }
}
