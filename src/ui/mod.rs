//! UI components module

pub mod add_registry;
pub mod dialogs;
pub mod feedback;
pub mod history_panel;
pub mod registry_list;
