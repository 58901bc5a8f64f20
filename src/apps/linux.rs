//! Linux application scan
//!
//! Reads every `.desktop` entry across the standard application
//! directories (system, user, Flatpak and Snap exports). Entries hidden
//! from menus (`NoDisplay`/`Hidden`) and entries with no `Exec` line are
//! skipped; duplicate filenames keep the first directory's copy, matching
//! the desktop's own precedence.

use freedesktop_file_parser::EntryType;
use std::collections::HashSet;
use std::path::PathBuf;

use super::InstalledApp;

fn desktop_dirs() -> Vec<PathBuf> {
    let home = dirs::home_dir().unwrap_or_default();
    vec![
        PathBuf::from("/usr/share/applications"),
        PathBuf::from("/usr/local/share/applications"),
        home.join(".local/share/applications"),
        PathBuf::from("/var/lib/flatpak/exports/share/applications"),
        home.join(".local/share/flatpak/exports/share/applications"),
        PathBuf::from("/var/lib/snapd/desktop/applications"),
    ]
}

pub fn list_apps() -> Vec<InstalledApp> {
    scan_dirs(&desktop_dirs())
}

pub(crate) fn scan_dirs(dirs: &[PathBuf]) -> Vec<InstalledApp> {
    let mut results = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(".desktop") || !seen.insert(file_name) {
                continue;
            }

            let path = entry.path();
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            if let Some(label) = entry_label(&content) {
                results.push(InstalledApp {
                    label,
                    file_path: path.to_string_lossy().into_owned(),
                });
            }
        }
    }

    results.sort_by(|a, b| a.label.cmp(&b.label));
    results
}

/// The display name of a launchable, menu-visible desktop entry.
fn entry_label(content: &str) -> Option<String> {
    let desktop = freedesktop_file_parser::parse(content).ok()?;
    let entry = &desktop.entry;

    if entry.no_display.unwrap_or(false) || entry.hidden.unwrap_or(false) {
        return None;
    }
    let EntryType::Application(app) = &entry.entry_type else {
        return None;
    };
    if app.exec.as_deref().unwrap_or("").is_empty() {
        return None;
    }

    let name = entry.name.default.clone();
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_entry(dir: &std::path::Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).unwrap();
    }

    const VISIBLE: &str = "[Desktop Entry]\nType=Application\nName=GIMP\nExec=gimp-2.10 %U\n";

    #[test]
    fn scans_visible_application_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "gimp.desktop", VISIBLE);
        write_entry(dir.path(), "notes.txt", "not a desktop entry");

        let apps = scan_dirs(&[dir.path().to_path_buf()]);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].label, "GIMP");
        assert!(apps[0].file_path.ends_with("gimp.desktop"));
    }

    #[test]
    fn skips_hidden_and_execless_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(
            dir.path(),
            "hidden.desktop",
            "[Desktop Entry]\nType=Application\nName=Helper\nExec=helper\nNoDisplay=true\n",
        );
        write_entry(
            dir.path(),
            "link.desktop",
            "[Desktop Entry]\nType=Application\nName=NoExec\n",
        );

        assert!(scan_dirs(&[dir.path().to_path_buf()]).is_empty());
    }

    #[test]
    fn duplicate_filenames_keep_the_first_directory() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_entry(first.path(), "app.desktop", VISIBLE);
        write_entry(
            second.path(),
            "app.desktop",
            "[Desktop Entry]\nType=Application\nName=Shadowed\nExec=other\n",
        );

        let apps = scan_dirs(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].label, "GIMP");
    }

    #[test]
    fn results_are_sorted_by_label() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(
            dir.path(),
            "z.desktop",
            "[Desktop Entry]\nType=Application\nName=Zeal\nExec=zeal\n",
        );
        write_entry(
            dir.path(),
            "a.desktop",
            "[Desktop Entry]\nType=Application\nName=Ark\nExec=ark\n",
        );

        let labels: Vec<String> = scan_dirs(&[dir.path().to_path_buf()])
            .into_iter()
            .map(|a| a.label)
            .collect();
        assert_eq!(labels, vec!["Ark", "Zeal"]);
    }
}
