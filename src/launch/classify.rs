//! Launch target classification
//!
//! Maps a raw target string to a typed launch intent. Classification is
//! total: there is a fallback at every branch, so it can never fail. The
//! only state it touches is the process-lifetime PATH-existence memo; all
//! launch I/O happens later, during intent execution.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::common::win_app_id;
use crate::platform::Platform;
use crate::profile::KeyConfig;

static URL_SCHEME: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").unwrap());

/// True for any `scheme://...` string.
pub fn is_url(s: &str) -> bool {
    URL_SCHEME.is_match(s)
}

/// How a target should be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchIntent {
    /// `scheme://...` — hand to the OS default handler.
    Url(String),
    /// macOS `.app` bundle.
    AppBundle(String),
    /// Linux `.desktop` file.
    DesktopEntry(String),
    /// Windows packaged app (`PackageFamilyName!AppId`).
    UwpApp { app_id: String },
    /// Windows Win32 app registered under a shell AppID (CLSID paths
    /// included).
    ShellApp { app_id: String },
    /// Bare command name found on PATH.
    PathCommand(String),
    /// Path to a file with execute permission (tilde already expanded).
    ExecutableFile(String),
    /// Everything else — open with the default handler.
    OpenWithDefault(String),
}

/// Process-lifetime memo of "does this command exist in PATH". Avoids
/// re-walking PATH for the same name within a session.
#[derive(Default)]
pub struct CommandCache {
    entries: HashMap<String, bool>,
}

static COMMAND_NAME: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[\w][\w.-]*$").unwrap());

impl CommandCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&mut self, cmd: &str) -> bool {
        // Only plausible command names get as far as a PATH walk.
        if cmd.len() > 256 || !COMMAND_NAME.is_match(cmd) {
            return false;
        }

        if let Some(&known) = self.entries.get(cmd) {
            return known;
        }

        let found = which::which(cmd).is_ok();
        self.entries.insert(cmd.to_string(), found);
        found
    }
}

/// Syntactic path test: only `/`, `./`, `../` and `~/` prefixes count.
/// Bare relative names are PATH commands by convention, even when a
/// same-named file exists in the current directory — this asymmetry is
/// what disambiguates "run from PATH" from "open this file".
pub fn looks_like_path(s: &str) -> bool {
    s.starts_with('/') || s.starts_with("./") || s.starts_with("../") || s.starts_with("~/")
}

/// Whether the path points at a regular file with execute permission.
pub fn is_executable_file(path: &str) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

/// Classify a key's target. First match wins; the final arm guarantees a
/// definite intent for any input.
pub fn classify(platform: Platform, key: &KeyConfig, commands: &mut CommandCache) -> LaunchIntent {
    let file_path = key.file_path.as_str();

    // 1. URLs beat everything, regardless of other fields.
    if is_url(file_path) {
        return LaunchIntent::Url(file_path.to_string());
    }

    // 2. Platform-special containers.
    match platform {
        Platform::MacOs => {
            if file_path.ends_with(".app") {
                return LaunchIntent::AppBundle(file_path.to_string());
            }
        }
        Platform::Linux => {
            if file_path.ends_with(".desktop") {
                return LaunchIntent::DesktopEntry(file_path.to_string());
            }
        }
        Platform::Windows => {
            let app_id = win_app_id::parse_app_user_model_id(file_path).or_else(|| {
                win_app_id::parse_app_user_model_id(key.arguments.as_deref().unwrap_or(""))
            });
            if let Some(app_id) = app_id {
                if win_app_id::is_uwp_app_id(&app_id) {
                    return LaunchIntent::UwpApp { app_id };
                }
                return LaunchIntent::ShellApp { app_id };
            }
        }
    }

    // 3. Bare command resolvable via PATH.
    if commands.exists(file_path) {
        return LaunchIntent::PathCommand(file_path.to_string());
    }

    // 4./5. Path-like strings: executable or not.
    if looks_like_path(file_path) {
        let expanded = shellexpand::tilde(file_path).into_owned();
        if is_executable_file(&expanded) {
            return LaunchIntent::ExecutableFile(expanded);
        }
        return LaunchIntent::OpenWithDefault(expanded);
    }

    // 6. Final fallback.
    LaunchIntent::OpenWithDefault(file_path.to_string())
}
