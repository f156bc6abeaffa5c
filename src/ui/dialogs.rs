use eframe::egui;

use crate::ui::feedback::Severity;

/// Blocking confirmation before the active registry is changed.
pub struct ConfirmSwitchDialog {
    pub name: String,
    pub url: String,
}

impl ConfirmSwitchDialog {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// `Some(true)` to switch, `Some(false)` to cancel, `None` while open.
    pub fn show(&self, ctx: &egui::Context) -> Option<bool> {
        let mut choice = None;
        egui::Window::new("Switch registry")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!("Switch the active npm registry to {}?", self.name));
                ui.label(egui::RichText::new(&self.url).monospace().weak());
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Switch").clicked() {
                        choice = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        choice = Some(false);
                    }
                });
            });
        choice
    }
}

/// Modal result dialog for directly requested actions.
pub struct MessageDialog {
    pub title: String,
    pub text: String,
    pub severity: Severity,
}

impl MessageDialog {
    pub fn info(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            severity: Severity::Error,
        }
    }

    /// Returns true once dismissed.
    pub fn show(&self, ctx: &egui::Context) -> bool {
        let mut dismissed = false;
        egui::Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(self.severity.icon())
                            .color(self.severity.color())
                            .size(18.0),
                    );
                    ui.label(&self.text);
                });
                ui.add_space(10.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        dismissed
    }
}
