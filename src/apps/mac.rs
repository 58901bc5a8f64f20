//! macOS application scan
//!
//! Lists `.app` bundles across the system and user Applications folders.

use std::path::PathBuf;

use super::InstalledApp;

fn app_dirs() -> Vec<PathBuf> {
    let home = dirs::home_dir().unwrap_or_default();
    vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications"),
        PathBuf::from("/System/Applications/Utilities"),
        PathBuf::from("/System/Library/CoreServices"),
        home.join("Applications"),
    ]
}

pub fn list_apps() -> Vec<InstalledApp> {
    scan_dirs(&app_dirs())
}

pub(crate) fn scan_dirs(dirs: &[PathBuf]) -> Vec<InstalledApp> {
    let mut results = Vec::new();

    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(label) = name.strip_suffix(".app") {
                results.push(InstalledApp {
                    label: label.to_string(),
                    file_path: entry.path().to_string_lossy().into_owned(),
                });
            }
        }
    }

    results.sort_by(|a, b| a.label.cmp(&b.label));
    results
}
