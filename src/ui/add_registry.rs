use eframe::egui;

pub enum AddRegistryAction {
    /// Validate the URL in the background before adding.
    Validate { name: String, url: String },
}

/// Form for adding a custom registry mirror.
#[derive(Default)]
pub struct AddRegistryPanel {
    name_input: String,
    url_input: String,
    validating: bool,
}

impl AddRegistryPanel {
    pub fn set_validating(&mut self, validating: bool) {
        self.validating = validating;
    }

    pub fn clear(&mut self) {
        self.name_input.clear();
        self.url_input.clear();
    }

    pub fn show(&mut self, ui: &mut egui::Ui, interactive: bool) -> Option<AddRegistryAction> {
        let mut action = None;
        let enabled = interactive && !self.validating;

        ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(&mut self.name_input).hint_text("Name"),
        );
        ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(&mut self.url_input)
                .hint_text("https://registry.example.com/"),
        );

        ui.horizontal(|ui| {
            let can_add = enabled
                && !self.name_input.trim().is_empty()
                && !self.url_input.trim().is_empty();
            if ui.add_enabled(can_add, egui::Button::new("Add")).clicked() {
                action = Some(AddRegistryAction::Validate {
                    name: self.name_input.trim().to_string(),
                    url: self.url_input.trim().to_string(),
                });
            }
            if self.validating {
                ui.spinner();
                ui.label("Validating...");
            }
        });

        action
    }
}
