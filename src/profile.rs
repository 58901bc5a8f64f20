//! Keyboard profile documents
//!
//! A profile is a YAML file mapping grid keys to launch targets. Field names
//! stay camelCase on disk so existing `keyboard.yaml` documents keep parsing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single grid key bound to a launch target.
///
/// `tab_id` and `id` identify the grid cell and together form the natural
/// config key. Everything else describes what the key opens and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyConfig {
    pub tab_id: String,
    pub id: String,
    pub label: String,
    /// Primary launch target: absolute path, bare command, URL, or an
    /// OS-specific indirection string such as `shell:AppsFolder\...`.
    pub file_path: String,
    /// Raw argument string, tokenized at launch time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Windows-only elevation flag. Rejected for UWP targets at launch.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub run_as_admin: bool,
    /// Optional icon override. A recognized image file here bypasses OS
    /// icon discovery entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
}

impl KeyConfig {
    /// A key with neither a launch target nor an icon override has nothing
    /// to resolve or launch.
    pub fn is_empty(&self) -> bool {
        self.file_path.is_empty() && self.icon_path.as_deref().unwrap_or("").is_empty()
    }

    /// The string the icon cache key is derived from. Label and working
    /// directory are deliberately excluded: keys pointing at the same
    /// target with the same arguments share one cached icon.
    pub fn cache_source(&self) -> String {
        format!(
            "{}|{}|{}",
            self.file_path,
            self.arguments.as_deref().unwrap_or(""),
            self.icon_path.as_deref().unwrap_or("")
        )
    }

    /// Path icon extraction operates on: the override when present,
    /// otherwise the launch target itself.
    pub fn icon_target(&self) -> &str {
        match self.icon_path.as_deref() {
            Some(icon) if !icon.is_empty() => icon,
            _ => &self.file_path,
        }
    }

    /// True when any user-visible field carries content. Contentless keys
    /// are dropped during profile normalization.
    fn has_content(&self) -> bool {
        !self.label.is_empty()
            || !self.file_path.is_empty()
            || self.arguments.as_deref().is_some_and(|s| !s.is_empty())
            || self
                .working_directory
                .as_deref()
                .is_some_and(|s| !s.is_empty())
            || self.description.as_deref().is_some_and(|s| !s.is_empty())
            || self.icon_path.as_deref().is_some_and(|s| !s.is_empty())
            || self.run_as_admin
    }
}

/// A grid tab (number row 1-9, 0, plus the function-key row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TabConfig {
    pub id: String,
    pub label: String,
}

/// The profile document: tabs plus configured keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeyboardProfile {
    pub tabs: Vec<TabConfig>,
    pub keys: Vec<KeyConfig>,
}

impl KeyboardProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let mut profile: KeyboardProfile = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing profile {}", path.display()))?;
        profile.normalize();
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("serializing profile")?;
        std::fs::write(path, content)
            .with_context(|| format!("writing profile {}", path.display()))?;
        Ok(())
    }

    pub fn find_key(&self, tab_id: &str, id: &str) -> Option<&KeyConfig> {
        self.keys.iter().find(|k| k.tab_id == tab_id && k.id == id)
    }

    /// Bind a key, replacing any existing entry in the same slot.
    pub fn set_key(&mut self, key: KeyConfig) {
        match self
            .keys
            .iter_mut()
            .find(|k| k.tab_id == key.tab_id && k.id == key.id)
        {
            Some(existing) => *existing = key,
            None => self.keys.push(key),
        }
    }

    /// Drop contentless keys and collapse duplicates by `tabId|id`, last
    /// occurrence winning, keeping first-seen order otherwise.
    fn normalize(&mut self) {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut keys: Vec<KeyConfig> = Vec::with_capacity(self.keys.len());

        for key in self.keys.drain(..) {
            if !key.has_content() {
                continue;
            }
            let slot = format!("{}|{}", key.tab_id, key.id);
            match slots.get(&slot) {
                Some(&idx) => keys[idx] = key,
                None => {
                    slots.insert(slot, keys.len());
                    keys.push(key);
                }
            }
        }

        self.keys = keys;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tab: &str, id: &str, file_path: &str) -> KeyConfig {
        KeyConfig {
            tab_id: tab.to_string(),
            id: id.to_string(),
            file_path: file_path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn cache_source_ignores_label_and_working_directory() {
        let mut a = key("1", "Q", "/usr/bin/foo");
        a.label = "Foo".to_string();
        a.working_directory = Some("/tmp".to_string());
        let mut b = key("2", "W", "/usr/bin/foo");
        b.label = "Other".to_string();

        assert_eq!(a.cache_source(), b.cache_source());
    }

    #[test]
    fn cache_source_includes_arguments_and_icon_path() {
        let a = key("1", "Q", "/usr/bin/foo");
        let mut b = key("1", "Q", "/usr/bin/foo");
        b.arguments = Some("--flag".to_string());
        let mut c = key("1", "Q", "/usr/bin/foo");
        c.icon_path = Some("/tmp/icon.png".to_string());

        assert_ne!(a.cache_source(), b.cache_source());
        assert_ne!(a.cache_source(), c.cache_source());
    }

    #[test]
    fn empty_key_predicate() {
        let mut k = key("1", "Q", "");
        k.label = "labelled but empty".to_string();
        assert!(k.is_empty());

        k.icon_path = Some("/tmp/icon.png".to_string());
        assert!(!k.is_empty());
    }

    #[test]
    fn icon_target_prefers_override() {
        let mut k = key("1", "Q", "/usr/bin/foo");
        assert_eq!(k.icon_target(), "/usr/bin/foo");
        k.icon_path = Some("/tmp/icon.png".to_string());
        assert_eq!(k.icon_target(), "/tmp/icon.png");
        k.icon_path = Some(String::new());
        assert_eq!(k.icon_target(), "/usr/bin/foo");
    }

    #[test]
    fn normalize_drops_contentless_and_dedupes() {
        let yaml = r#"
tabs:
  - id: "1"
    label: main
keys:
  - tabId: "1"
    id: Q
    filePath: /usr/bin/old
  - tabId: "1"
    id: W
  - tabId: "1"
    id: Q
    filePath: /usr/bin/new
"#;
        let mut profile: KeyboardProfile = serde_yaml::from_str(yaml).unwrap();
        profile.normalize();

        assert_eq!(profile.keys.len(), 1);
        assert_eq!(profile.keys[0].file_path, "/usr/bin/new");
    }

    #[test]
    fn camel_case_round_trip() {
        let mut k = key("F", "F1", "shell:AppsFolder\\Pkg!App");
        k.run_as_admin = true;
        let profile = KeyboardProfile {
            tabs: vec![],
            keys: vec![k],
        };

        let yaml = serde_yaml::to_string(&profile).unwrap();
        assert!(yaml.contains("filePath"));
        assert!(yaml.contains("runAsAdmin"));

        let parsed: KeyboardProfile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn set_key_replaces_the_occupied_slot() {
        let mut profile = KeyboardProfile::default();
        profile.set_key(key("1", "Q", "/usr/bin/old"));
        profile.set_key(key("1", "W", "/usr/bin/other"));
        profile.set_key(key("1", "Q", "/usr/bin/new"));

        assert_eq!(profile.keys.len(), 2);
        assert_eq!(profile.find_key("1", "Q").unwrap().file_path, "/usr/bin/new");
        assert_eq!(profile.find_key("1", "W").unwrap().file_path, "/usr/bin/other");
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyboard.yaml");

        let mut profile = KeyboardProfile {
            tabs: vec![TabConfig {
                id: "1".to_string(),
                label: "main".to_string(),
            }],
            keys: vec![],
        };
        let mut bound = key("1", "Q", "/usr/bin/foo");
        bound.arguments = Some("--flag".to_string());
        profile.set_key(bound);

        profile.save(&path).unwrap();
        let loaded = KeyboardProfile::load(&path).unwrap();
        assert_eq!(loaded, profile);
    }
}
