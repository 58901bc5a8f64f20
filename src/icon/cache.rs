//! On-disk icon cache
//!
//! Content-addressed PNG files under the config directory's `caches/`
//! subdirectory. Purely a performance cache: every entry is independently
//! deletable and regenerable, and deleting the whole directory is always
//! safe.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use crate::common::{image, paths};
use crate::profile::KeyConfig;

/// Entries older than this (by mtime) are removed by the sweep.
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Startup delay before the once-per-process sweep, so it never competes
/// with the initial burst of icon resolutions.
pub const SWEEP_DELAY: Duration = Duration::from_secs(10 * 60);

// Process-lifetime guard: the scheduled sweep runs at most once.
static SWEEP_SCHEDULED: AtomicBool = AtomicBool::new(false);

/// Disk cache of resolved icons, keyed by a content hash of the target.
pub struct IconCache {
    dir: PathBuf,
}

impl IconCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Cache rooted at the default location under the config directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(paths::icon_cache_dir()?))
    }

    /// Content-addressed cache key for a grid key: hash of the target
    /// path, arguments and icon override. Display label and working
    /// directory do not participate.
    pub fn key_for(key: &KeyConfig) -> String {
        format!("{:x}", Sha256::digest(key.cache_source()))
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.png"))
    }

    /// Cached PNG bytes for a key, or None. Zero-byte or undecodable
    /// entries are deleted on sight so the caller re-extracts fresh.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => {
                if !bytes.is_empty() && image::decode(&bytes).is_some() {
                    return Some(bytes);
                }
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!("Warning: Failed to delete invalid icon cache entry: {e}");
                }
                None
            }
            Err(_) => None,
        }
    }

    /// Store PNG bytes for a key. Best-effort: a failed write is logged
    /// and forgotten, never surfaced to icon resolution.
    pub fn put(&self, key: &str, bytes: &[u8]) {
        let result = fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(self.entry_path(key), bytes));
        if let Err(e) = result {
            eprintln!("Warning: Failed to write icon cache entry: {e}");
        }
    }

    /// Schedule the TTL sweep to run once, [`SWEEP_DELAY`] after the first
    /// call. Subsequent calls (this process) are no-ops.
    pub fn schedule_sweep(&self) {
        if SWEEP_SCHEDULED.swap(true, Ordering::SeqCst) {
            return;
        }

        let dir = self.dir.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SWEEP_DELAY).await;
            match sweep_dir(&dir, SystemTime::now()) {
                Ok(deleted) if deleted > 0 => {
                    eprintln!("Cleaned {deleted} expired icon cache entries");
                }
                Ok(_) => {}
                Err(e) => eprintln!("Warning: Failed to sweep icon cache: {e}"),
            }
        });
    }

    /// Run the TTL sweep now. Returns how many entries were removed.
    pub fn sweep(&self) -> std::io::Result<usize> {
        sweep_dir(&self.dir, SystemTime::now())
    }

    #[cfg(test)]
    pub(crate) fn sweep_at(&self, now: SystemTime) -> std::io::Result<usize> {
        sweep_dir(&self.dir, now)
    }
}

/// Delete every `*.png` entry whose mtime is at least [`CACHE_TTL`] before
/// `now`. Per-file stat/delete errors are ignored; only a failed directory
/// scan is reported.
fn sweep_dir(dir: &Path, now: SystemTime) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut deleted = 0;
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .is_some_and(|age| age >= CACHE_TTL);

        if expired && fs::remove_file(&path).is_ok() {
            deleted += 1;
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::image;

    fn sample_png() -> Vec<u8> {
        image::encode_png(&::image::DynamicImage::new_rgba8(2, 2)).unwrap()
    }

    fn test_cache() -> (tempfile::TempDir, IconCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = IconCache::new(dir.path().to_path_buf());
        (dir, cache)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, cache) = test_cache();
        let png = sample_png();

        cache.put("abc123", &png);
        assert_eq!(cache.get("abc123"), Some(png));
    }

    #[test]
    fn get_missing_is_none() {
        let (_dir, cache) = test_cache();
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn zero_byte_entry_self_heals() {
        let (_dir, cache) = test_cache();
        cache.put("empty", &[]);

        assert_eq!(cache.get("empty"), None);
        assert!(!cache.entry_path("empty").exists());
    }

    #[test]
    fn corrupt_entry_self_heals() {
        let (_dir, cache) = test_cache();
        cache.put("bad", b"not a png at all");

        assert_eq!(cache.get("bad"), None);
        assert!(!cache.entry_path("bad").exists());
    }

    #[test]
    fn put_is_last_writer_wins() {
        let (_dir, cache) = test_cache();
        let png = sample_png();
        cache.put("k", b"garbage first");
        cache.put("k", &png);

        assert_eq!(cache.get("k"), Some(png));
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let (_dir, cache) = test_cache();
        let png = sample_png();
        cache.put("young", &png);

        // Both entries were written just now; sweeping from 31 days in the
        // future expires them, sweeping from now keeps them.
        assert_eq!(cache.sweep_at(SystemTime::now()).unwrap(), 0);
        assert!(cache.entry_path("young").exists());

        let future = SystemTime::now() + Duration::from_secs(31 * 24 * 60 * 60);
        assert_eq!(cache.sweep_at(future).unwrap(), 1);
        assert!(!cache.entry_path("young").exists());
    }

    #[test]
    fn sweep_ignores_non_png_files() {
        let (_dir, cache) = test_cache();
        fs::create_dir_all(&cache.dir).unwrap();
        fs::write(cache.dir.join("notes.txt"), b"keep me").unwrap();

        let future = SystemTime::now() + Duration::from_secs(31 * 24 * 60 * 60);
        assert_eq!(cache.sweep_at(future).unwrap(), 0);
        assert!(cache.dir.join("notes.txt").exists());
    }

    #[test]
    fn sweep_of_missing_directory_is_harmless() {
        let cache = IconCache::new(PathBuf::from("/nonexistent/gridkey-caches"));
        assert_eq!(cache.sweep().unwrap(), 0);
    }

    #[test]
    fn key_for_matches_cache_source_hash() {
        let key = KeyConfig {
            file_path: "/Applications/Foo.app".to_string(),
            ..Default::default()
        };
        assert_eq!(
            IconCache::key_for(&key),
            format!("{:x}", Sha256::digest("/Applications/Foo.app||"))
        );
    }

    #[test]
    fn decode_helper_accepts_cached_bytes() {
        // get() validates with the same decoder resolve() uses.
        assert!(image::decode(&sample_png()).is_some());
    }
}
