//! Archiver process invocation.

use std::process::Stdio;

use tokio::process::Command;

use crate::archive::identifier::ArchiveId;
use crate::config::schema::ServerConfig;

/// Build the archiver invocation for one identifier.
///
/// Equivalent to running `zip -r - <id>` from the source root: the archive
/// is written to stdout and the identifier is passed as a single argv
/// element, never through a shell.
pub fn archive_command(config: &ServerConfig, id: &ArchiveId) -> Command {
    let mut cmd = Command::new(&config.delivery.archiver);
    cmd.arg("-r").arg("-").arg(id.as_str());
    cmd.current_dir(&config.delivery.source_root);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    // Backstop for runtime teardown; every normal exit path reaps the
    // child explicitly in the relay loop.
    cmd.kill_on_drop(true);
    cmd
}
