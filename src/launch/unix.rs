//! macOS and Linux launch dispatch
//!
//! Both platforms route default-handler targets through the system
//! opener (`open` / `xdg-open`) and run commands and executables
//! directly.

use std::path::Path;

use super::classify::LaunchIntent;
use super::exec::{exec_detached, ExecOptions};
use super::LaunchError;
use crate::profile::KeyConfig;

pub async fn launch_mac(
    key: &KeyConfig,
    intent: &LaunchIntent,
    args: &[String],
    options: &ExecOptions,
) -> Result<(), LaunchError> {
    match intent {
        LaunchIntent::Url(target) | LaunchIntent::OpenWithDefault(target) => {
            let mut open_args = vec![target.clone()];
            open_args.extend_from_slice(args);
            exec_detached("open", &open_args, options).await
        }
        LaunchIntent::AppBundle(bundle) => {
            let mut open_args = vec!["-a".to_string(), bundle.clone()];
            if !args.is_empty() {
                open_args.push("--args".to_string());
                open_args.extend_from_slice(args);
            }
            exec_detached("open", &open_args, options).await
        }
        // Direct spawn, never through a shell: scriptable interpreters
        // like osascript must receive their arguments verbatim.
        LaunchIntent::PathCommand(command) => exec_detached(command, args, options).await,
        LaunchIntent::ExecutableFile(path) => exec_detached(path, args, options).await,
        _ => {
            let mut open_args = vec![key.file_path.clone()];
            open_args.extend_from_slice(args);
            exec_detached("open", &open_args, options).await
        }
    }
}

pub async fn launch_linux(
    key: &KeyConfig,
    intent: &LaunchIntent,
    args: &[String],
    options: &ExecOptions,
) -> Result<(), LaunchError> {
    match intent {
        LaunchIntent::Url(target) | LaunchIntent::OpenWithDefault(target) => {
            let mut open_args = vec![target.clone()];
            open_args.extend_from_slice(args);
            exec_detached("xdg-open", &open_args, options).await
        }
        LaunchIntent::DesktopEntry(path) => {
            // gtk-launch takes the desktop id, not the file path.
            let id = desktop_entry_id(path);
            let mut launch_args = vec![id];
            launch_args.extend_from_slice(args);
            exec_detached("gtk-launch", &launch_args, options).await
        }
        LaunchIntent::PathCommand(command) => exec_detached(command, args, options).await,
        LaunchIntent::ExecutableFile(path) => exec_detached(path, args, options).await,
        _ => {
            let mut open_args = vec![key.file_path.clone()];
            open_args.extend_from_slice(args);
            exec_detached("xdg-open", &open_args, options).await
        }
    }
}

fn desktop_entry_id(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
        .trim_end_matches(".desktop")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_id_strips_directory_and_extension() {
        assert_eq!(
            desktop_entry_id("/usr/share/applications/org.gnome.Calculator.desktop"),
            "org.gnome.Calculator"
        );
        assert_eq!(desktop_entry_id("firefox.desktop"), "firefox");
        assert_eq!(desktop_entry_id("plain"), "plain");
    }
}
