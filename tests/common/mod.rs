//! Shared fixtures for integration tests.
//!
//! Tests run against a stub archiver script instead of zip(1), so they
//! exercise the delivery pipeline without requiring the real tool. The stub
//! receives the same argv shape (`-r - <id>`) with the source root as its
//! working directory.

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zipstream::{HttpServer, ServerConfig};

/// A disposable source root plus a stub archiver.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(fixture.source_root()).unwrap();
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_root(&self) -> PathBuf {
        self.root().join("files")
    }

    /// Create one archive directory containing `payload.bin`.
    pub fn add_archive_dir(&self, name: &str, payload: &[u8]) {
        let dir = self.source_root().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("payload.bin"), payload).unwrap();
    }

    /// Install a stub archiver running the given shell body.
    ///
    /// The identifier arrives as `$3` and the working directory is the
    /// source root. Every invocation is appended to `invocations.log` so
    /// tests can assert whether a child was spawned at all.
    pub fn install_stub_archiver(&self, body: &str) -> PathBuf {
        let path = self.root().join("stub-archiver.sh");
        let script = format!("#!/bin/sh\necho \"$3\" >> invocations.log\n{body}\n");
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    pub fn invocations(&self) -> Vec<String> {
        match std::fs::read_to_string(self.source_root().join("invocations.log")) {
            Ok(log) => log.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn write_index(&self, html: &str) {
        std::fs::write(self.root().join("index.html"), html).unwrap();
    }

    /// Config pointing at this fixture's source root and stub archiver.
    pub fn config(&self, archiver: &Path) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.delivery.source_root = self.source_root();
        config.delivery.archiver = archiver.to_string_lossy().into_owned();
        config.delivery.index_path = self.root().join("index.html");
        config
    }
}

/// Start the server on an ephemeral port and return its address.
pub async fn start_server(config: ServerConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}
