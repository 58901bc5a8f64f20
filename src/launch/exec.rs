//! Detached process execution with bounded error detection
//!
//! Children are spawned detached from the launcher's lifecycle so GUI
//! programs survive it, but spawn failures and instant crashes must still
//! surface synchronously. The compromise: watch the child for a short
//! window, then let go.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use super::LaunchError;

/// How long a freshly spawned child is observed before being detached.
pub const OBSERVE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Default, Clone)]
pub struct ExecOptions {
    pub cwd: Option<PathBuf>,
}

/// Tokenize a raw argument string: whitespace-separated, with single- and
/// double-quote grouping. Quotes are consumed, and there is no escape
/// processing beyond the grouping itself.
pub fn parse_arguments(arg_string: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote_char: Option<char> = None;

    for ch in arg_string.chars() {
        match quote_char {
            None if ch == '"' || ch == '\'' => quote_char = Some(ch),
            None if ch == ' ' => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            Some(q) if ch == q => quote_char = None,
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Spawn `command` detached and observe it for [`OBSERVE_WINDOW`].
///
/// Outcomes:
/// - spawn failure -> [`LaunchError::SpawnFailed`], immediately;
/// - non-zero exit inside the window -> [`LaunchError::NonZeroExit`] with
///   captured stderr;
/// - zero exit (or signal termination) inside the window -> success;
/// - window elapses with the child still running -> success, and the
///   child keeps running on its own.
pub async fn exec_detached(
    command: &str,
    args: &[String],
    options: &ExecOptions,
) -> Result<(), LaunchError> {
    let mut cmd = std::process::Command::new(command);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    // Own process group so the child outlives us and never receives our
    // terminal signals.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = tokio::process::Command::from(cmd)
        .kill_on_drop(false)
        .spawn()
        .map_err(|source| LaunchError::SpawnFailed {
            command: command.to_string(),
            source,
        })?;

    // Drain stderr on a separate task. On detach the task is left
    // running, keeping the pipe open so a chatty child never blocks on a
    // full buffer.
    let stderr = child.stderr.take();
    let drain = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    tokio::select! {
        status = child.wait() => match status {
            // Signal termination carries no exit code; treated as settled
            // success like a zero exit.
            Ok(status) if status.code().is_none_or(|code| code == 0) => Ok(()),
            Ok(status) => {
                let stderr = drain.await.unwrap_or_default();
                Err(LaunchError::non_zero_exit(
                    status.code().unwrap_or(-1),
                    &stderr,
                ))
            }
            Err(source) => Err(LaunchError::SpawnFailed {
                command: command.to_string(),
                source,
            }),
        },
        _ = tokio::time::sleep(OBSERVE_WINDOW) => {
            // Detach: drop our handle, leave the child running.
            Ok(())
        }
    }
}
