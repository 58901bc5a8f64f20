/// Operating system the launcher is running on.
///
/// Detected once at startup and passed into the icon and launch subsystems,
/// so each per-OS implementation can be exercised in tests by injecting a
/// fixed tag instead of branching on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// Detect the host platform. Anything that is not macOS or Windows is
    /// treated as Linux (the freedesktop conventions cover the BSDs too).
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}
