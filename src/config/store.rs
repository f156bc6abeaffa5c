//! Best-effort JSON persistence for the settings and history documents.
//!
//! Load failures of any kind fall back to defaults and never reach the
//! caller; save failures are logged and reported as `false` so the session
//! keeps running on in-memory state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::history::History;
use crate::config::settings::{CustomRegistry, Settings, WindowGeometry};
use crate::registry::catalog;

pub const SETTINGS_FILE: &str = "config.json";
pub const HISTORY_FILE: &str = "history.json";

pub struct ConfigStore {
    dir: PathBuf,
    pub settings: Settings,
    pub history: History,
}

impl ConfigStore {
    /// Per-user config directory, `~/.npm-registry-manager`.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".npm-registry-manager")
    }

    /// Open the store rooted at `dir`, loading both documents.
    ///
    /// Missing or unreadable files yield defaults; a malformed file is left
    /// on disk untouched until the next successful save.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Could not create config directory {:?}: {}", dir, e);
        }
        let settings = load_document(&dir.join(SETTINGS_FILE));
        let history = load_document(&dir.join(HISTORY_FILE));
        Self {
            dir,
            settings,
            history,
        }
    }

    pub fn save_settings(&self) -> bool {
        self.save_document(SETTINGS_FILE, &self.settings)
    }

    pub fn save_history(&self) -> bool {
        self.save_document(HISTORY_FILE, &self.history)
    }

    /// Mutate settings and persist immediately.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) -> bool {
        f(&mut self.settings);
        self.save_settings()
    }

    /// Record a registry switch: append, cap, persist.
    pub fn record_switch(&mut self, from: &str, to: &str) -> bool {
        self.history.record_switch(from, to);
        self.save_history()
    }

    /// Record a speed-test sample: append, cap, persist.
    pub fn record_speed_test(&mut self, url: &str, speed: f64, success: bool) -> bool {
        self.history.record_speed_test(url, speed, success);
        self.save_history()
    }

    pub fn average_speed(&self, url: &str) -> f64 {
        self.history.average_speed(url)
    }

    pub fn custom_registries(&self) -> &[CustomRegistry] {
        &self.settings.custom_registries
    }

    /// Add a custom registry unless its name or URL collides with a
    /// built-in or an existing custom entry.
    pub fn add_custom_registry(&mut self, name: &str, url: &str) -> bool {
        if catalog::is_builtin_name(name) || catalog::is_builtin_url(url) {
            return false;
        }
        if self
            .settings
            .custom_registries
            .iter()
            .any(|r| r.name == name || r.url == url)
        {
            return false;
        }
        self.settings.custom_registries.push(CustomRegistry {
            name: name.to_string(),
            url: url.to_string(),
        });
        self.save_settings();
        true
    }

    /// Remove a custom registry by exact name. Built-ins are untouchable,
    /// so a built-in name always returns false.
    pub fn remove_custom_registry(&mut self, name: &str) -> bool {
        let before = self.settings.custom_registries.len();
        self.settings.custom_registries.retain(|r| r.name != name);
        if self.settings.custom_registries.len() < before {
            self.save_settings();
            true
        } else {
            false
        }
    }

    pub fn window_geometry(&self) -> WindowGeometry {
        self.settings.window_geometry
    }

    pub fn set_window_geometry(&mut self, geometry: WindowGeometry) -> bool {
        if self.settings.window_geometry == geometry {
            return true;
        }
        self.settings.window_geometry = geometry;
        self.save_settings()
    }

    fn save_document<T: Serialize>(&self, file: &str, doc: &T) -> bool {
        let path = self.dir.join(file);
        let content = match serde_json::to_string_pretty(doc) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Could not serialize {:?}: {}", path, e);
                return false;
            }
        };
        match fs::write(&path, content) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not write {:?}: {}", path, e);
                false
            }
        }
    }
}

fn load_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Could not read {:?}, using defaults: {}", path, e);
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Malformed document {:?}, using defaults: {}", path, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fresh_store_has_defaults() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        assert_eq!(store.settings, Settings::default());
        assert!(store.history.registry_switches.is_empty());
        assert!(store.history.speed_tests.is_empty());
        assert_eq!(store.history.last_used_registry, None);
    }

    #[test]
    fn test_settings_roundtrip() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        store.update_settings(|s| {
            s.auto_test_speed = false;
            s.test_timeout = 12;
            s.window_geometry = WindowGeometry {
                width: 1280,
                height: 720,
                x: 50,
                y: 60,
            };
        });
        assert!(store.add_custom_registry("corp", "https://npm.corp.example/"));

        let reopened = ConfigStore::open(dir.path());
        assert_eq!(reopened.settings, store.settings);
    }

    #[test]
    fn test_partial_document_merges_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"test_timeout": 30, "pinned": true}"#,
        )
        .unwrap();

        let store = ConfigStore::open(dir.path());
        assert_eq!(store.settings.test_timeout, 30);
        assert_eq!(store.settings.window_geometry, WindowGeometry::default());
        assert!(store.settings.auto_test_speed);

        // Unknown key written back on the next save
        assert!(store.save_settings());
        let content = fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["pinned"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_malformed_document_left_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        fs::write(&path, "{not json").unwrap();

        let store = ConfigStore::open(dir.path());
        assert!(store.history.registry_switches.is_empty());
        // No save happened, the broken file is still there for manual repair
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_duplicate_custom_rejected_without_mutation() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        assert!(store.add_custom_registry("corp", "https://npm.corp.example/"));
        // Same name, different url
        assert!(!store.add_custom_registry("corp", "https://other.example/"));
        // Different name, same url
        assert!(!store.add_custom_registry("mirror", "https://npm.corp.example/"));
        assert_eq!(store.custom_registries().len(), 1);
    }

    #[test]
    fn test_builtin_collision_rejected() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        assert!(!store.add_custom_registry("Official (npmjs)", "https://x.example/"));
        assert!(!store.add_custom_registry("fast", catalog::OFFICIAL_REGISTRY_URL));
        assert!(store.custom_registries().is_empty());
    }

    #[test]
    fn test_remove_builtin_name_is_noop() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        assert!(!store.remove_custom_registry("Official (npmjs)"));
        assert!(!store.remove_custom_registry("no-such-entry"));

        assert!(store.add_custom_registry("corp", "https://npm.corp.example/"));
        assert!(store.remove_custom_registry("corp"));
        assert!(store.custom_registries().is_empty());
    }

    #[test]
    fn test_history_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        store.record_switch("https://registry.npmjs.org/", "https://registry.npmmirror.com/");
        store.record_speed_test("https://registry.npmmirror.com/", 87.5, true);

        let reopened = ConfigStore::open(dir.path());
        assert_eq!(reopened.history.registry_switches.len(), 1);
        assert_eq!(
            reopened.history.last_used_registry.as_deref(),
            Some("https://registry.npmmirror.com/")
        );
        assert_eq!(
            reopened.average_speed("https://registry.npmmirror.com/"),
            87.5
        );
    }
}
