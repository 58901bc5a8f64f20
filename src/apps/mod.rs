//! Installed-application enumeration
//!
//! Scans the platform's application registry (Linux `.desktop` dirs, the
//! macOS Applications folders, the Windows Start Apps list) into
//! `{ label, filePath }` entries the grid can bind keys to. Scans are
//! slow, so results are cached as JSON on disk: a warm cache is returned
//! immediately and refreshed in the background.

pub mod linux;
pub mod mac;
pub mod win;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::common::paths;
use crate::platform::Platform;

/// One launchable application as discovered on the system. `file_path`
/// is in the same form the launcher's classifier accepts (a `.desktop`
/// path, an `.app` bundle, or a `shell:AppsFolder` AppID).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledApp {
    pub label: String,
    pub file_path: String,
}

static REFRESH_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

pub struct AppCatalog {
    platform: Platform,
    cache_path: PathBuf,
}

impl AppCatalog {
    pub fn new(platform: Platform, cache_path: PathBuf) -> Self {
        Self {
            platform,
            cache_path,
        }
    }

    pub fn open_default(platform: Platform) -> anyhow::Result<Self> {
        Ok(Self::new(platform, paths::installed_apps_cache_path()?))
    }

    /// List installed applications. A readable cache is returned as-is
    /// with a background rescan kicked off; otherwise the scan runs in
    /// the foreground and seeds the cache.
    pub async fn list(&self) -> Vec<InstalledApp> {
        if let Some(cached) = self.read_cache() {
            self.spawn_refresh();
            return cached;
        }

        self.refresh().await
    }

    /// Scan now, ignoring any cached list, and write the result through.
    pub async fn refresh(&self) -> Vec<InstalledApp> {
        let apps = scan(self.platform).await;
        self.write_cache(&apps);
        apps
    }

    fn read_cache(&self) -> Option<Vec<InstalledApp>> {
        if !self.cache_path.exists() {
            return None;
        }
        let data = match std::fs::read_to_string(&self.cache_path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Warning: failed to read apps cache: {e}");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(apps) => Some(apps),
            Err(e) => {
                eprintln!("Warning: failed to parse apps cache: {e}");
                None
            }
        }
    }

    fn write_cache(&self, apps: &[InstalledApp]) {
        let write = || -> anyhow::Result<()> {
            if let Some(parent) = self.cache_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(apps)?;
            std::fs::write(&self.cache_path, json)?;
            Ok(())
        };
        if let Err(e) = write() {
            eprintln!("Warning: failed to write apps cache: {e}");
        }
    }

    /// At most one background rescan per process; callers keep the stale
    /// list until the next `list`.
    fn spawn_refresh(&self) {
        if REFRESH_IN_PROGRESS.swap(true, Ordering::SeqCst) {
            return;
        }

        let catalog = AppCatalog::new(self.platform, self.cache_path.clone());
        tokio::spawn(async move {
            catalog.refresh().await;
            REFRESH_IN_PROGRESS.store(false, Ordering::SeqCst);
        });
    }
}

async fn scan(platform: Platform) -> Vec<InstalledApp> {
    match platform {
        Platform::MacOs => mac::list_apps(),
        Platform::Windows => win::list_apps().await,
        Platform::Linux => linux::list_apps(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(label: &str, file_path: &str) -> InstalledApp {
        InstalledApp {
            label: label.to_string(),
            file_path: file_path.to_string(),
        }
    }

    #[test]
    fn cache_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AppCatalog::new(
            Platform::Linux,
            dir.path().join("caches/installed-apps.json"),
        );

        let apps = vec![
            app("Firefox", "/usr/share/applications/firefox.desktop"),
            app("Terminal", "shell:AppsFolder\\Pkg!App"),
        ];
        catalog.write_cache(&apps);
        assert_eq!(catalog.read_cache().unwrap(), apps);
    }

    #[test]
    fn missing_or_corrupt_cache_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed-apps.json");
        let catalog = AppCatalog::new(Platform::Linux, path.clone());

        assert!(catalog.read_cache().is_none());

        std::fs::write(&path, b"not json").unwrap();
        assert!(catalog.read_cache().is_none());
    }

    #[test]
    fn cache_uses_camel_case_field_names() {
        let json = serde_json::to_string(&app("X", "/x")).unwrap();
        assert!(json.contains("\"filePath\""));
    }

    #[tokio::test]
    async fn warm_cache_is_returned_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AppCatalog::new(
            // macOS scan finds nothing on this host, so a background
            // refresh cannot interfere with the assertion.
            Platform::MacOs,
            dir.path().join("installed-apps.json"),
        );

        let apps = vec![app("Safari", "/Applications/Safari.app")];
        catalog.write_cache(&apps);
        assert_eq!(catalog.list().await, apps);
    }
}
