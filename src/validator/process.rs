//! Subprocess runner
//!
//! Spawns the validator with stdout and stderr sharing one pipe and waits for
//! it, giving up early when the shutdown token fires.

use std::io::Read;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Result, SidecarError};
use crate::server::Shutdown;

/// Exit status and merged stdout/stderr of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub output: Vec<u8>,
}

/// Run `argv` to completion, or until `shutdown` is triggered.
///
/// The child is killed if the shutdown token fires or if the returned future
/// is dropped before the process exits.
pub async fn run_merged(argv: &[String], shutdown: &Shutdown) -> Result<CommandOutput> {
    let (program, args) = argv.split_first().ok_or_else(|| SidecarError::InvalidTemplate {
        reason: "template is blank".to_string(),
    })?;

    let (mut reader, writer) = std::io::pipe()?;
    let writer_err = writer.try_clone()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_err)
        .kill_on_drop(true);

    let spawned = command.spawn();
    // The command still holds our copies of the write end; the reader only
    // sees EOF once they are gone.
    drop(command);
    let mut child = spawned.map_err(|source| SidecarError::Spawn {
        program: program.clone(),
        source,
    })?;

    let collector = tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map(|_| buf)
    });

    let waited = tokio::select! {
        biased;
        () = shutdown.wait() => None,
        status = child.wait() => Some(status),
    };

    let Some(status) = waited else {
        if let Err(e) = child.kill().await {
            crate::logger::log_warning(&format!("Failed to kill interrupted command '{program}': {e}"));
        }
        return Err(SidecarError::Interrupted);
    };
    let status = status?;

    let output = collector.await.map_err(std::io::Error::other)??;

    Ok(CommandOutput {
        code: status.code(),
        success: status.success(),
        output,
    })
}
