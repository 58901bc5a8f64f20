//! Out-of-process PowerShell execution
//!
//! Windows icon extraction and elevation both go through PowerShell.
//! Scripts run sandboxed from the caller's point of view: bounded by a
//! timeout, output captured, any failure collapsed to None.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const PS_TIMEOUT: Duration = Duration::from_secs(15);

/// Run a PowerShell script and return its trimmed stdout. Non-zero exit,
/// timeout, or empty output all yield None; icon lookups treat that as
/// "strategy failed", never as a hard error.
pub async fn run_powershell(script: &str) -> Option<String> {
    run_powershell_with_timeout(script, PS_TIMEOUT).await
}

/// Same, with an explicit deadline for scripts known to run long
/// (enumerating the Start Apps list can take a while on a cold system).
pub async fn run_powershell_with_timeout(script: &str, timeout: Duration) -> Option<String> {
    // UTF-8 prologue so non-ASCII app names survive the pipe.
    let wrapped = format!(
        "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; {script}"
    );

    let result = tokio::time::timeout(
        timeout,
        Command::new("powershell.exe")
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                &wrapped,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output(),
    )
    .await;

    let output = result.ok()?.ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() { None } else { Some(stdout) }
}

/// Escape a string for interpolation inside a single-quoted PowerShell
/// string literal.
pub fn escape_ps(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_single_quotes() {
        assert_eq!(escape_ps("plain"), "plain");
        assert_eq!(escape_ps("it's"), "it''s");
        assert_eq!(escape_ps("''"), "''''");
    }
}
