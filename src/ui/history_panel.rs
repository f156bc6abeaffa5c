use eframe::egui;

use crate::config::history::History;
use crate::config::settings::CustomRegistry;
use crate::registry::catalog;

pub struct HistoryPanel;

impl HistoryPanel {
    pub fn show(ui: &mut egui::Ui, history: &History, customs: &[CustomRegistry]) {
        ui.heading("🕘 Switch history");

        if let Some(last) = &history.last_used_registry {
            ui.label(format!("Last used: {}", catalog::name_for(last, customs)));
        }
        ui.separator();

        if history.registry_switches.is_empty() {
            ui.label("No switches recorded yet");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            // Most recent first
            for record in history.registry_switches.iter().rev() {
                ui.group(|ui| {
                    ui.label(
                        egui::RichText::new(format_timestamp(&record.timestamp))
                            .small()
                            .weak(),
                    );
                    ui.label(format!(
                        "{} → {}",
                        catalog::name_for(&record.from, customs),
                        catalog::name_for(&record.to, customs)
                    ));
                    ui.label(egui::RichText::new(&record.to).monospace().small().weak());
                });
                ui.add_space(4.0);
            }
        });
    }
}

fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2026-08-28T14:30:05+08:00"),
            "2026-08-28 14:30"
        );
        // Unparseable strings pass through unchanged
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
