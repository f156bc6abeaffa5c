use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Window size and position persisted across sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            x: 100,
            y: 100,
        }
    }
}

/// A user-added registry mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomRegistry {
    pub name: String,
    pub url: String,
}

/// User preferences, persisted as `config.json`.
///
/// Every field carries its own serde default so a document written by an
/// older version merges cleanly. Keys this version does not recognize are
/// kept in `extra` and written back on save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub auto_test_speed: bool,

    /// Per-probe timeout in seconds for speed tests.
    #[serde(default = "default_test_timeout")]
    pub test_timeout: u64,

    #[serde(default = "default_true")]
    pub remember_last_registry: bool,

    #[serde(default = "default_true")]
    pub show_speed_in_list: bool,

    #[serde(default)]
    pub window_geometry: WindowGeometry,

    #[serde(default)]
    pub custom_registries: Vec<CustomRegistry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_test_timeout() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_test_speed: true,
            test_timeout: 5,
            remember_last_registry: true,
            show_speed_in_list: true,
            window_geometry: WindowGeometry::default(),
            custom_registries: Vec::new(),
            extra: Map::new(),
        }
    }
}
