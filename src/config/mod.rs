//! Persisted configuration: user settings and usage history, each a JSON
//! document with defaults merged on load and best-effort saves.

pub mod history;
pub mod settings;
pub mod store;
