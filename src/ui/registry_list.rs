use eframe::egui;

/// Display state for one registry card.
#[derive(Debug, Clone)]
pub struct RegistryRow {
    pub name: String,
    pub url: String,
    pub is_current: bool,
    pub is_custom: bool,
    /// Mean of the retained successful samples; 0.0 means no history.
    pub average_ms: f64,
    /// Latest probe from this session, if any.
    pub last_result: Option<(bool, f64)>,
}

pub enum RegistryAction {
    Switch { name: String, url: String },
    Remove(String),
    Inspect(String),
}

fn speed_color(ms: f64) -> egui::Color32 {
    if ms < 200.0 {
        egui::Color32::from_rgb(80, 220, 120)
    } else if ms < 500.0 {
        egui::Color32::from_rgb(255, 200, 50)
    } else {
        egui::Color32::from_rgb(255, 120, 80)
    }
}

pub struct RegistryList;

impl RegistryList {
    pub fn show(
        ui: &mut egui::Ui,
        rows: &[RegistryRow],
        show_speed: bool,
        interactive: bool,
    ) -> Option<RegistryAction> {
        let mut action = None;

        for row in rows {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.horizontal(|ui| {
                            ui.strong(&row.name);
                            if row.is_current {
                                ui.label(
                                    egui::RichText::new("● current")
                                        .color(egui::Color32::from_rgb(80, 220, 120))
                                        .small(),
                                );
                            }
                            if row.is_custom {
                                ui.label(egui::RichText::new("custom").small().weak());
                            }
                        });
                        ui.label(egui::RichText::new(&row.url).monospace().small().weak());

                        if show_speed {
                            match row.last_result {
                                Some((true, ms)) => {
                                    ui.label(
                                        egui::RichText::new(format!("{ms:.2} ms"))
                                            .color(speed_color(ms))
                                            .small(),
                                    );
                                }
                                Some((false, _)) => {
                                    ui.label(
                                        egui::RichText::new("unreachable")
                                            .color(egui::Color32::from_rgb(255, 80, 80))
                                            .small(),
                                    );
                                }
                                None if row.average_ms > 0.0 => {
                                    ui.label(
                                        egui::RichText::new(format!("avg {:.2} ms", row.average_ms))
                                            .color(speed_color(row.average_ms))
                                            .small(),
                                    );
                                }
                                None => {
                                    ui.label(egui::RichText::new("not tested").small().weak());
                                }
                            }
                        }
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if row.is_custom
                            && ui
                                .add_enabled(interactive, egui::Button::new("🗑"))
                                .on_hover_text("Remove this custom registry")
                                .clicked()
                        {
                            action = Some(RegistryAction::Remove(row.name.clone()));
                        }
                        if ui
                            .add_enabled(interactive, egui::Button::new("ℹ"))
                            .on_hover_text("Check availability")
                            .clicked()
                        {
                            action = Some(RegistryAction::Inspect(row.url.clone()));
                        }
                        if ui
                            .add_enabled(interactive && !row.is_current, egui::Button::new("Switch"))
                            .clicked()
                        {
                            action = Some(RegistryAction::Switch {
                                name: row.name.clone(),
                                url: row.url.clone(),
                            });
                        }
                    });
                });
            });
            ui.add_space(4.0);
        }

        action
    }
}
