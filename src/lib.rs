//! npm Registry Manager
//!
//! A desktop tool to view, switch, and speed-test npm registry mirrors.
//! The active registry lives in npm's own configuration; this crate reads
//! and writes it through `npm config` and keeps preferences and history in
//! local JSON files.

pub mod app;
pub mod config;
pub mod network;
pub mod registry;
pub mod ui;
