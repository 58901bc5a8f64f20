//! Windows launch dispatch
//!
//! Regular launches go through `cmd /c start`, which resolves file
//! associations, shell: URIs and AppsFolder AppIDs alike. Elevated
//! launches use PowerShell's `Start-Process -Verb RunAs` and are awaited
//! rather than detached, so a declined UAC prompt is reported.

use std::process::Stdio;

use super::classify::LaunchIntent;
use super::exec::{exec_detached, ExecOptions};
use super::LaunchError;
use crate::common::powershell::escape_ps;
use crate::profile::KeyConfig;

pub async fn launch(
    key: &KeyConfig,
    _intent: &LaunchIntent,
    args: &[String],
    options: &ExecOptions,
) -> Result<(), LaunchError> {
    if key.run_as_admin {
        return launch_as_admin(&key.file_path, args, options).await;
    }

    // The empty quoted token is the window title `start` expects; without
    // it a quoted path would be consumed as the title.
    let mut start_args = vec![
        "/c".to_string(),
        "start".to_string(),
        String::new(),
        key.file_path.clone(),
    ];
    start_args.extend_from_slice(args);
    exec_detached("cmd", &start_args, options).await
}

async fn launch_as_admin(
    file_path: &str,
    args: &[String],
    options: &ExecOptions,
) -> Result<(), LaunchError> {
    let mut script = format!("Start-Process -FilePath '{}'", escape_ps(file_path));
    if !args.is_empty() {
        let list = args
            .iter()
            .map(|arg| format!("'{}'", escape_ps(arg)))
            .collect::<Vec<_>>()
            .join(",");
        script.push_str(&format!(" -ArgumentList {list}"));
    }
    if let Some(cwd) = &options.cwd {
        script.push_str(&format!(
            " -WorkingDirectory '{}'",
            escape_ps(&cwd.to_string_lossy())
        ));
    }
    script.push_str(" -Verb RunAs");

    let mut child = tokio::process::Command::new("powershell.exe")
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LaunchError::SpawnFailed {
            command: "powershell.exe".to_string(),
            source,
        })?;

    // Awaited in full: the PowerShell process only outlives the UAC
    // prompt, not the elevated child.
    let status = child.wait().await.map_err(|source| LaunchError::SpawnFailed {
        command: "powershell.exe".to_string(),
        source,
    })?;

    match status.code() {
        None | Some(0) => Ok(()),
        Some(code) => Err(LaunchError::ElevationFailed { code }),
    }
}
