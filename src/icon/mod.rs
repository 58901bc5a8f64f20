//! Icon resolution
//!
//! Turns a grid key into a displayable PNG data URI, or nothing. The
//! contract is strict: this subsystem never errors. Each lookup strategy
//! is independently fallible and silent; only total exhaustion is visible
//! to the caller, as None, at which point the UI draws its own
//! placeholder.

pub mod cache;
pub mod linux;
pub mod mac;
pub mod win;

use image::DynamicImage;
use std::path::Path;

use crate::common::image as img;
use crate::platform::Platform;
use crate::profile::KeyConfig;
use cache::IconCache;

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Per-key icon resolution with an on-disk cache behind it.
pub struct IconService {
    platform: Platform,
    cache: IconCache,
}

impl IconService {
    pub fn new(platform: Platform, cache: IconCache) -> Self {
        Self { platform, cache }
    }

    pub fn cache(&self) -> &IconCache {
        &self.cache
    }

    /// Resolve an icon for a key as a PNG data URI.
    ///
    /// Order: explicit image override (uncached, it is cheap and
    /// user-controlled), disk cache, then OS extraction with the result
    /// cached best-effort. Returns None only when everything failed.
    pub async fn resolve(&self, key: &KeyConfig) -> Option<String> {
        if let Some(icon_path) = key.icon_path.as_deref()
            && img::is_image_file(icon_path)
            && let Some(icon) = img::load_file(Path::new(icon_path))
            && let Some(png) = img::encode_png(&icon)
        {
            return Some(img::to_data_uri(&png));
        }

        if key.is_empty() {
            return None;
        }

        let cache_key = IconCache::key_for(key);
        if let Some(bytes) = self.cache.get(&cache_key) {
            return Some(img::to_data_uri(&bytes));
        }

        let icon = self.extract(key).await?;
        let png = img::encode_png(&icon)?;

        self.cache.put(&cache_key, &png);
        Some(img::to_data_uri(&png))
    }

    async fn extract(&self, key: &KeyConfig) -> Option<DynamicImage> {
        // Raw web URLs have no file to extract from; fetch the site
        // favicon instead. Only when no icon override is configured.
        if key.icon_path.as_deref().unwrap_or("").is_empty() && is_http_url(&key.file_path) {
            if let Some(icon) = fetch_favicon(&key.file_path).await {
                return Some(icon);
            }
        }

        match self.platform {
            Platform::MacOs => mac::extract(key).await,
            Platform::Windows => win::extract(key).await,
            Platform::Linux => linux::extract(key),
        }
    }
}

/// Fetch a site's favicon through Google's favicon endpoint, keyed by the
/// URL's hostname. A plain unauthenticated GET; any failure degrades to
/// no-icon.
async fn fetch_favicon(url: &str) -> Option<DynamicImage> {
    let domain = url_hostname(url)?;
    let endpoint = format!(
        "https://www.google.com/s2/favicons?sz=96&domain_url={}",
        urlencoding::encode(&domain)
    );

    let response = reqwest::get(&endpoint).await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let bytes = response.bytes().await.ok()?;
    img::decode(&bytes)
}

/// Hostname of a URL: everything between `scheme://` (plus optional
/// userinfo) and the first `/`, `?`, `#` or port.
pub(crate) fn url_hostname(url: &str) -> Option<String> {
    let rest = url.split_once("://")?.1;
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(rest);
    let host = authority
        .rsplit_once('@')
        .map(|(_, h)| h)
        .unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
