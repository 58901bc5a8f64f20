//! Program launching
//!
//! Classifies a key's target, then dispatches to the platform launcher.
//! Everything spawns detached; failures that happen within the first
//! half-second still surface as errors.

pub mod classify;
pub mod exec;
pub mod unix;
pub mod win;

use thiserror::Error;

use crate::platform::Platform;
use crate::profile::KeyConfig;
use classify::{classify, CommandCache, LaunchIntent};
use exec::{parse_arguments, ExecOptions};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", display_exit(*.code, .stderr))]
    NonZeroExit { code: i32, stderr: String },

    #[error("running packaged (UWP) apps as administrator is not supported")]
    UnsupportedCombination,

    #[error("elevation request failed with code {code}")]
    ElevationFailed { code: i32 },
}

impl LaunchError {
    fn non_zero_exit(code: i32, stderr: &str) -> Self {
        LaunchError::NonZeroExit {
            code,
            stderr: stderr.trim().to_string(),
        }
    }
}

fn display_exit(code: i32, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("Command exited with code {code}")
    } else {
        stderr.to_string()
    }
}

/// Launches key targets. Holds the PATH lookup cache so repeated launches
/// of bare commands skip the filesystem walk.
pub struct Launcher {
    platform: Platform,
    commands: CommandCache,
}

impl Launcher {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            commands: CommandCache::new(),
        }
    }

    pub async fn launch(&mut self, key: &KeyConfig) -> Result<(), LaunchError> {
        let intent = classify(self.platform, key, &mut self.commands);

        // Elevation cannot be combined with the UWP activation path; fail
        // before anything is spawned.
        if key.run_as_admin && matches!(intent, LaunchIntent::UwpApp { .. }) {
            return Err(LaunchError::UnsupportedCombination);
        }

        let args = key
            .arguments
            .as_deref()
            .map(parse_arguments)
            .unwrap_or_default();
        let options = ExecOptions {
            cwd: key
                .working_directory
                .as_ref()
                .filter(|dir| !dir.is_empty())
                .map(|dir| shellexpand::tilde(dir).into_owned().into()),
        };

        match self.platform {
            Platform::MacOs => unix::launch_mac(key, &intent, &args, &options).await,
            Platform::Linux => unix::launch_linux(key, &intent, &args, &options).await,
            Platform::Windows => win::launch(key, &intent, &args, &options).await,
        }
    }
}
