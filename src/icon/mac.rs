//! macOS icon extraction
//!
//! `.app` bundles get a 256x256 Quick Look thumbnail render, falling back
//! to the bundle's declared `.icns` converted with `sips`. Anything else
//! goes straight to the Quick Look thumbnail, which doubles as the
//! generic file-icon primitive.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::common::image as img;
use crate::profile::KeyConfig;

const THUMBNAIL_SIZE: u32 = 256;

pub async fn extract(key: &KeyConfig) -> Option<DynamicImage> {
    let target = key.icon_target();

    // Bundles stop at the icns fallback; rendering the thumbnail a second
    // time could only fail the same way.
    if target.ends_with(".app") {
        if let Some(icon) = thumbnail(target, THUMBNAIL_SIZE).await {
            return Some(icon);
        }
        return bundle_icns(target).await;
    }

    thumbnail(target, THUMBNAIL_SIZE).await
}

/// Render a Quick Look thumbnail of the path into a scratch directory and
/// load whatever PNG it produced.
async fn thumbnail(target: &str, size: u32) -> Option<DynamicImage> {
    let out_dir = tempfile::tempdir().ok()?;

    let status = Command::new("qlmanage")
        .args(["-t", "-s", &size.to_string(), "-o"])
        .arg(out_dir.path())
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .ok()?;
    if !status.success() {
        return None;
    }

    let rendered = first_png_in(out_dir.path())?;
    img::load_file(&rendered)
}

/// Fall back to the bundle's own icon: read `CFBundleIconFile` from the
/// Info.plist and convert the `.icns` to PNG with `sips`.
async fn bundle_icns(bundle: &str) -> Option<DynamicImage> {
    let icon_file = read_bundle_icon_name(bundle).await?;
    let mut icns = PathBuf::from(bundle).join("Contents/Resources").join(&icon_file);
    if icns.extension().is_none() {
        icns.set_extension("icns");
    }
    if !icns.exists() {
        return None;
    }

    let out_dir = tempfile::tempdir().ok()?;
    let out_png = out_dir.path().join("icon.png");

    let status = Command::new("sips")
        .args(["-s", "format", "png"])
        .arg(&icns)
        .arg("--out")
        .arg(&out_png)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .ok()?;
    if !status.success() {
        return None;
    }

    img::load_file(&out_png)
}

async fn read_bundle_icon_name(bundle: &str) -> Option<String> {
    let info = Path::new(bundle).join("Contents/Info");
    let output = Command::new("defaults")
        .arg("read")
        .arg(&info)
        .arg("CFBundleIconFile")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

fn first_png_in(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .flatten()
        .map(|e| e.into_path())
        .find(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_rendered_png() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Foo.app.png"), b"stub").unwrap();
        fs::write(dir.path().join("ignore.txt"), b"stub").unwrap();

        let found = first_png_in(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "Foo.app.png");
    }

    #[test]
    fn no_png_means_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"stub").unwrap();
        assert!(first_png_in(dir.path()).is_none());
    }

    #[tokio::test]
    async fn unresolvable_bundle_ends_at_icns_fallback() {
        let key = KeyConfig {
            file_path: "/nonexistent/Fake.app".to_string(),
            ..Default::default()
        };
        assert!(extract(&key).await.is_none());
    }
}
