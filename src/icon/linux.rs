//! Linux icon extraction
//!
//! Resolves a freedesktop icon name for the target (explicit `.desktop`
//! file, an installed desktop entry whose `Exec` references the target's
//! basename, or the bare basename), then walks the XDG icon-theme
//! directories for a loadable raster. Every step is fallible and silent;
//! the generic theme icons are the last resort.

use freedesktop_file_parser::EntryType;
use image::DynamicImage;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::common::image as img;
use crate::profile::KeyConfig;

const THEMES: &[&str] = &[
    "Yaru",
    "Adwaita",
    "gnome",
    "hicolor",
    "ubuntu-mono-dark",
    "ubuntu-mono-light",
    "Humanity",
];

const SIZES: &[&str] = &[
    "512x512", "256x256", "192x192", "128x128", "96x96", "64x64", "48x48", "32x32", "24x24",
    "16x16", "scalable", "symbolic",
];

const ICON_EXTENSIONS: &[&str] = &[".png", ".svg", ".xpm", ".ico"];

const APPLICATIONS_DIR: &str = "/usr/share/applications";

/// Stand-ins for the desktop's generic file icon, used when nothing
/// matches the target itself.
const GENERIC_ICON_NAMES: &[&str] = &["application-x-executable", "text-x-generic"];

pub fn extract(key: &KeyConfig) -> Option<DynamicImage> {
    let target = key.icon_target();

    from_desktop_entry(target, Path::new(APPLICATIONS_DIR)).or_else(generic_icon)
}

fn from_desktop_entry(target: &str, applications_dir: &Path) -> Option<DynamicImage> {
    let icon_name = resolve_icon_name(target, applications_dir)?;

    if Path::new(&icon_name).is_absolute() {
        return load_icon_file(Path::new(&icon_name));
    }

    find_in_themes(&icon_name, &icon_base_dirs()).or_else(|| find_in_pixmaps(&icon_name))
}

fn generic_icon() -> Option<DynamicImage> {
    let base_dirs = icon_base_dirs();
    GENERIC_ICON_NAMES
        .iter()
        .find_map(|name| find_in_themes(name, &base_dirs))
}

/// Determine the icon name to search for. An explicit `.desktop` target's
/// own `Icon=` wins, then any installed entry whose `Exec` mentions the
/// target's basename, then the lowercased basename itself.
pub(crate) fn resolve_icon_name(target: &str, applications_dir: &Path) -> Option<String> {
    if target.ends_with(".desktop")
        && Path::new(target).exists()
        && let Some(name) = icon_from_desktop_file(Path::new(target))
    {
        return Some(name);
    }

    let exec_name = Path::new(target).file_name()?.to_str()?.to_string();

    if let Some(name) = icon_from_matching_entry(&exec_name, applications_dir) {
        return Some(name);
    }

    Some(exec_name.to_lowercase())
}

fn icon_from_desktop_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let desktop = freedesktop_file_parser::parse(&content).ok()?;
    desktop.entry.icon.map(|icon| icon.content)
}

/// Scan installed desktop entries for one whose `Exec` line references the
/// executable's basename, and take its icon name.
fn icon_from_matching_entry(exec_name: &str, applications_dir: &Path) -> Option<String> {
    for entry in WalkDir::new(applications_dir)
        .max_depth(1)
        .into_iter()
        .flatten()
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let Ok(desktop) = freedesktop_file_parser::parse(&content) else {
            continue;
        };
        let EntryType::Application(app) = &desktop.entry.entry_type else {
            continue;
        };
        if app
            .exec
            .as_deref()
            .is_some_and(|exec| exec.contains(exec_name))
            && let Some(icon) = desktop.entry.icon
        {
            return Some(icon.content);
        }
    }
    None
}

/// All existing icon-theme base directories, deduped: `~/.icons`, the XDG
/// data dirs, the system shares, and Flatpak/Snap export locations.
fn icon_base_dirs() -> Vec<PathBuf> {
    let home = dirs::home_dir().unwrap_or_default();

    let mut search_roots = vec![home.join(".local/share")];
    if let Ok(xdg_data_dirs) = std::env::var("XDG_DATA_DIRS") {
        search_roots.extend(xdg_data_dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));
    }
    search_roots.extend([
        PathBuf::from("/usr/share"),
        PathBuf::from("/usr/local/share"),
        PathBuf::from("/var/lib/flatpak/exports/share"),
        home.join(".local/share/flatpak/exports/share"),
        PathBuf::from("/var/lib/snapd/desktop"),
    ]);

    let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
    dirs.insert(home.join(".icons"));
    for root in search_roots {
        dirs.insert(root.join("icons"));
    }

    dirs.into_iter().filter(|d| d.exists()).collect()
}

/// Strip a known icon extension so `foo.png` and `foo` search identically.
fn strip_icon_extension(name: &str) -> &str {
    for ext in ICON_EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(ext) {
            return stripped;
        }
    }
    name
}

/// Deterministic cross-product search: base dirs x themes x sizes x
/// {name, name-symbolic} x extensions, first loadable file wins.
fn find_in_themes(icon_name: &str, base_dirs: &[PathBuf]) -> Option<DynamicImage> {
    let search_name = strip_icon_extension(icon_name);
    let mut names = vec![search_name.to_string()];
    if !search_name.ends_with("-symbolic") {
        names.push(format!("{search_name}-symbolic"));
    }

    for base_dir in base_dirs {
        for theme in THEMES {
            for size in SIZES {
                for name in &names {
                    for ext in ICON_EXTENSIONS {
                        let candidate =
                            base_dir.join(theme).join(size).join("apps").join(format!("{name}{ext}"));
                        if let Some(icon) = load_icon_file(&candidate) {
                            return Some(icon);
                        }
                    }
                }
            }
        }
    }

    None
}

fn find_in_pixmaps(icon_name: &str) -> Option<DynamicImage> {
    let home = dirs::home_dir().unwrap_or_default();
    let pixmap_dirs = [
        PathBuf::from("/usr/share/pixmaps"),
        home.join(".local/share/pixmaps"),
    ];
    let search_name = strip_icon_extension(icon_name);

    for dir in pixmap_dirs.iter().filter(|d| d.exists()) {
        for ext in ICON_EXTENSIONS {
            if let Some(icon) = load_icon_file(&dir.join(format!("{search_name}{ext}"))) {
                return Some(icon);
            }
        }
    }

    None
}

fn load_icon_file(path: &Path) -> Option<DynamicImage> {
    if !path.exists() {
        return None;
    }
    img::load_file(path)
}
