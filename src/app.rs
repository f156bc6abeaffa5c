use eframe::egui;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::config::settings::WindowGeometry;
use crate::config::store::ConfigStore;
use crate::network::probe::{self, RegistryInfo};
use crate::network::speedtest::{self, SpeedSample, SpeedTestSummary};
use crate::registry::catalog;
use crate::registry::npm::NpmClient;
use crate::ui::add_registry::{AddRegistryAction, AddRegistryPanel};
use crate::ui::dialogs::{ConfirmSwitchDialog, MessageDialog};
use crate::ui::feedback::{NotificationPanel, Severity};
use crate::ui::history_panel::HistoryPanel;
use crate::ui::registry_list::{RegistryAction, RegistryList, RegistryRow};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AppStatus {
    #[default]
    Idle,
    Busy {
        task_name: String,
        start_time: std::time::Instant,
    },
}

/// A background task the user can cancel from the status bar.
pub struct ActiveTask {
    pub name: String,
    pub handle: tokio::task::JoinHandle<()>,
    pub cancel_token: tokio_util::sync::CancellationToken,
}

/// Everything background tasks report back to the foreground loop.
#[derive(Debug)]
pub enum BackendMessage {
    CurrentRegistry(Result<String, String>),

    SwitchFinished {
        from: String,
        to: String,
        result: Result<(), String>,
    },

    SpeedSample(SpeedSample),

    SpeedTestFinished(SpeedTestSummary),

    ValidationFinished {
        name: String,
        url: String,
        valid: bool,
    },

    RegistryInfoReady {
        url: String,
        info: RegistryInfo,
    },

    NpmConfigReady(Result<String, String>),

    Status(String),
}

const SPEED_TEST_TASK: &str = "Speed test";

pub struct RegistryApp {
    runtime: Handle,

    backend_rx: mpsc::Receiver<BackendMessage>,

    backend_tx: mpsc::Sender<BackendMessage>,

    npm: Arc<NpmClient>,

    http: reqwest::Client,

    /// Settings and history documents; mutated only from this thread.
    store: ConfigStore,

    /// Last known active registry URL (hint; npm owns the truth).
    current_url: String,

    rows: Vec<RegistryRow>,

    status_message: String,

    status: AppStatus,

    active_task: Option<ActiveTask>,

    /// At most one batch in flight; a second start request is a no-op.
    speed_testing: bool,

    add_panel: AddRegistryPanel,

    notifications: NotificationPanel,

    show_history: bool,

    show_notifications: bool,

    show_about: bool,

    /// Pretty-printed `npm config list --json` output, shown in a window.
    npm_config_text: Option<String>,

    confirm_switch: Option<ConfirmSwitchDialog>,

    message_dialog: Option<MessageDialog>,

    last_geometry: WindowGeometry,

    started_auto_test: bool,
}

impl RegistryApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        runtime: Handle,
        npm: Arc<NpmClient>,
        store: ConfigStore,
    ) -> Self {
        let (backend_tx, backend_rx) = std::sync::mpsc::channel::<BackendMessage>();

        let current_url = npm.current_hint();
        let last_geometry = store.window_geometry();

        let mut app = Self {
            runtime,
            backend_rx,
            backend_tx,
            npm,
            http: reqwest::Client::new(),
            store,
            current_url,
            rows: Vec::new(),
            status_message: "Ready".to_string(),
            status: AppStatus::Idle,
            active_task: None,
            speed_testing: false,
            add_panel: AddRegistryPanel::default(),
            notifications: NotificationPanel::default(),
            show_history: false,
            show_notifications: false,
            show_about: false,
            npm_config_text: None,
            confirm_switch: None,
            message_dialog: None,
            last_geometry,
            started_auto_test: false,
        };
        app.rebuild_rows();
        app
    }

    /// Rebuild the card list from the catalog, keeping this session's
    /// probe results.
    fn rebuild_rows(&mut self) {
        let customs = self.store.custom_registries().to_vec();
        let mut rows = Vec::new();
        for (name, url) in catalog::all_registries(&customs) {
            let last_result = self
                .rows
                .iter()
                .find(|r| r.url == url)
                .and_then(|r| r.last_result);
            rows.push(RegistryRow {
                is_current: url == self.current_url,
                is_custom: !catalog::is_builtin_url(&url),
                average_ms: self.store.average_speed(&url),
                last_result,
                name,
                url,
            });
        }
        self.rows = rows;
    }

    fn current_name(&self) -> String {
        catalog::name_for(&self.current_url, self.store.custom_registries())
    }

    /// Process messages from background tasks
    fn process_backend_messages(&mut self) {
        while let Ok(msg) = self.backend_rx.try_recv() {
            match msg {
                BackendMessage::CurrentRegistry(Ok(url)) => {
                    self.current_url = url;
                    self.rebuild_rows();
                    self.status_message = format!("Current registry: {}", self.current_name());
                }
                BackendMessage::CurrentRegistry(Err(e)) => {
                    self.status_message = "Could not read the active registry".to_string();
                    self.notifications.add_with_details(
                        "Could not read the active registry",
                        e,
                        Severity::Error,
                    );
                }
                BackendMessage::SwitchFinished { from, to, result } => match result {
                    Ok(()) => {
                        self.store.record_switch(&from, &to);
                        self.current_url = to.clone();
                        self.rebuild_rows();
                        let name = self.current_name();
                        self.status_message = format!("Switched to {name}");
                        self.message_dialog = Some(MessageDialog::info(
                            "Switch complete",
                            format!("npm now uses {name}"),
                        ));
                    }
                    Err(e) => {
                        self.status_message = "Registry switch failed".to_string();
                        self.message_dialog = Some(MessageDialog::error("Switch failed", e));
                    }
                },
                BackendMessage::SpeedSample(sample) => {
                    self.store
                        .record_speed_test(&sample.url, sample.latency_ms, sample.success);
                    if let Some(row) = self.rows.iter_mut().find(|r| r.url == sample.url) {
                        row.last_result = Some((sample.success, sample.latency_ms));
                        row.average_ms = self.store.average_speed(&sample.url);
                    }
                }
                BackendMessage::SpeedTestFinished(summary) => {
                    self.speed_testing = false;
                    self.status_message = if summary.cancelled {
                        "Speed test cancelled".to_string()
                    } else {
                        format!(
                            "Speed test finished: {} registries in {} ms",
                            summary.results.len(),
                            summary.total_duration_ms
                        )
                    };
                    if let Some(task) = &self.active_task {
                        if task.name == SPEED_TEST_TASK {
                            self.active_task = None;
                            self.status = AppStatus::Idle;
                        }
                    }
                }
                BackendMessage::ValidationFinished { name, url, valid } => {
                    self.add_panel.set_validating(false);
                    if !valid {
                        self.message_dialog = Some(MessageDialog::warning(
                            "Invalid registry URL",
                            format!("{url} did not answer like a registry"),
                        ));
                    } else if self.store.add_custom_registry(&name, &url) {
                        self.add_panel.clear();
                        self.rebuild_rows();
                        self.status_message = format!("Added custom registry {name}");
                        self.message_dialog = Some(MessageDialog::info(
                            "Registry added",
                            format!("Custom registry '{name}' is now available"),
                        ));
                    } else {
                        self.message_dialog = Some(MessageDialog::warning(
                            "Not added",
                            "A registry with that name or URL already exists",
                        ));
                    }
                }
                BackendMessage::RegistryInfoReady { url, info } => {
                    let name = catalog::name_for(&url, self.store.custom_registries());
                    if info.reachable {
                        let packages = if info.can_fetch_packages {
                            "package metadata OK"
                        } else {
                            "package metadata not reachable"
                        };
                        self.notifications.add_with_details(
                            format!("{name} is available"),
                            format!("HTTP {}, {packages}", info.status_code.unwrap_or(0)),
                            Severity::Info,
                        );
                    } else {
                        let details = match (info.status_code, info.error) {
                            (Some(code), _) => format!("HTTP {code}"),
                            (None, Some(e)) => e,
                            (None, None) => "no response".to_string(),
                        };
                        self.notifications.add_with_details(
                            format!("{name} is not available"),
                            details,
                            Severity::Warning,
                        );
                    }
                    self.status_message = format!("Checked {name}");
                }
                BackendMessage::NpmConfigReady(Ok(text)) => {
                    self.npm_config_text = Some(text);
                    self.status_message = "Loaded npm configuration".to_string();
                }
                BackendMessage::NpmConfigReady(Err(e)) => {
                    self.status_message = "Could not read npm configuration".to_string();
                    self.notifications.add_with_details(
                        "Could not read npm configuration",
                        e,
                        Severity::Error,
                    );
                }
                BackendMessage::Status(msg) => {
                    self.status_message = msg;
                }
            }
        }

        // A one-shot task that finished without a terminal message still
        // clears the busy indicator
        if let Some(task) = &self.active_task {
            if task.handle.is_finished() {
                self.active_task = None;
                self.status = AppStatus::Idle;
            }
        }
    }

    pub fn set_busy(
        &mut self,
        task_name: &str,
        handle: tokio::task::JoinHandle<()>,
        cancel_token: tokio_util::sync::CancellationToken,
    ) {
        self.status = AppStatus::Busy {
            task_name: task_name.to_string(),
            start_time: std::time::Instant::now(),
        };
        self.active_task = Some(ActiveTask {
            name: task_name.to_string(),
            handle,
            cancel_token,
        });
    }

    pub fn set_busy_simple(&mut self, task_name: &str, handle: tokio::task::JoinHandle<()>) {
        let cancel_token = tokio_util::sync::CancellationToken::new();
        self.set_busy(task_name, handle, cancel_token);
    }

    pub fn cancel_task(&mut self) {
        if let Some(task) = self.active_task.take() {
            task.cancel_token.cancel();
            task.handle.abort();
            self.status = AppStatus::Idle;
            self.status_message = format!("{} cancelled", task.name);
            if task.name == SPEED_TEST_TASK {
                self.speed_testing = false;
            }
            self.add_panel.set_validating(false);
        }
    }

    fn is_busy(&self) -> bool {
        matches!(self.status, AppStatus::Busy { .. })
    }

    /// Re-derive the active registry from npm.
    pub fn refresh(&mut self) {
        let npm = self.npm.clone();
        let tx = self.backend_tx.clone();
        let handle = self.runtime.spawn(async move {
            let result = npm.get_active().await.map_err(|e| e.to_string());
            let _ = tx.send(BackendMessage::CurrentRegistry(result));
        });
        self.set_busy_simple("Refreshing", handle);
    }

    /// Ask for confirmation before switching.
    fn request_switch(&mut self, name: String, url: String) {
        if url == self.current_url {
            return;
        }
        self.confirm_switch = Some(ConfirmSwitchDialog::new(name, url));
    }

    fn perform_switch(&mut self, url: String) {
        let from = self.current_url.clone();
        let npm = self.npm.clone();
        let tx = self.backend_tx.clone();
        self.status_message = "Switching registry...".to_string();

        let handle = self.runtime.spawn(async move {
            let result = npm.set_active(&url).await.map_err(|e| e.to_string());
            let _ = tx.send(BackendMessage::SwitchFinished {
                from,
                to: url,
                result,
            });
        });
        self.set_busy_simple("Switching registry", handle);
    }

    fn reset_to_official(&mut self) {
        let from = self.current_url.clone();
        let npm = self.npm.clone();
        let tx = self.backend_tx.clone();
        self.status_message = "Resetting to the official registry...".to_string();

        let handle = self.runtime.spawn(async move {
            let result = npm.reset_to_default().await.map_err(|e| e.to_string());
            let _ = tx.send(BackendMessage::SwitchFinished {
                from,
                to: catalog::OFFICIAL_REGISTRY_URL.to_string(),
                result,
            });
        });
        self.set_busy_simple("Resetting registry", handle);
    }

    /// Probe every registry sequentially in the background, one result
    /// event per probe.
    pub fn test_all_speeds(&mut self) {
        if self.speed_testing {
            return;
        }
        self.speed_testing = true;
        self.status_message = "Testing registry speeds...".to_string();

        let registries = catalog::all_registries(self.store.custom_registries());
        let client = self.http.clone();
        let timeout = Duration::from_secs(self.store.settings.test_timeout.max(1));
        let tx = self.backend_tx.clone();
        let cancel_token = tokio_util::sync::CancellationToken::new();
        let cancel_clone = cancel_token.clone();

        let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<SpeedSample>(32);

        let tx_progress = tx.clone();
        self.runtime.spawn(async move {
            while let Some(sample) = progress_rx.recv().await {
                let _ = tx_progress.send(BackendMessage::SpeedSample(sample));
            }
        });

        let handle = self.runtime.spawn(async move {
            let summary =
                speedtest::run_speed_test(registries, client, timeout, progress_tx, cancel_clone)
                    .await;
            let _ = tx.send(BackendMessage::SpeedTestFinished(summary));
        });

        self.set_busy(SPEED_TEST_TASK, handle, cancel_token);
    }

    /// Validate a candidate URL in the background, then add it.
    fn validate_and_add(&mut self, name: String, url: String) {
        self.add_panel.set_validating(true);
        let client = self.http.clone();
        let tx = self.backend_tx.clone();
        self.status_message = format!("Validating {url}...");

        let handle = self.runtime.spawn(async move {
            let valid = probe::validate_registry_url(&client, &url).await;
            let _ = tx.send(BackendMessage::ValidationFinished { name, url, valid });
        });
        self.set_busy_simple("Validating registry", handle);
    }

    fn remove_custom(&mut self, name: String) {
        if self.store.remove_custom_registry(&name) {
            self.rebuild_rows();
            self.status_message = format!("Removed {name}");
            self.notifications
                .add(format!("Removed custom registry {name}"), Severity::Info);
        } else {
            self.notifications
                .add(format!("{name} is not a custom registry"), Severity::Warning);
        }
    }

    fn show_npm_config(&mut self) {
        let npm = self.npm.clone();
        let tx = self.backend_tx.clone();
        self.status_message = "Reading npm configuration...".to_string();

        let handle = self.runtime.spawn(async move {
            let result = npm
                .npm_config()
                .await
                .map_err(|e| e.to_string())
                .and_then(|value| {
                    serde_json::to_string_pretty(&value).map_err(|e| e.to_string())
                });
            let _ = tx.send(BackendMessage::NpmConfigReady(result));
        });
        self.set_busy_simple("Reading npm config", handle);
    }

    fn inspect_registry(&mut self, url: String) {
        let client = self.http.clone();
        let tx = self.backend_tx.clone();
        self.status_message = format!("Checking {url}...");

        let handle = self.runtime.spawn(async move {
            let info = probe::registry_info(&client, &url).await;
            let _ = tx.send(BackendMessage::RegistryInfoReady { url, info });
        });
        self.set_busy_simple("Checking registry", handle);
    }

    fn track_geometry(&mut self, ctx: &egui::Context) {
        ctx.input(|i| {
            let viewport = i.viewport();
            if let (Some(inner), Some(outer)) = (viewport.inner_rect, viewport.outer_rect) {
                self.last_geometry = WindowGeometry {
                    width: inner.width() as i32,
                    height: inner.height() as i32,
                    x: outer.min.x as i32,
                    y: outer.min.y as i32,
                };
            }
        });
    }
}

impl eframe::App for RegistryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_backend_messages();

        ctx.request_repaint_after(std::time::Duration::from_millis(100));

        ctx.set_visuals(egui::Visuals::dark());

        self.track_geometry(ctx);

        // One automatic batch after startup when the user wants it
        if !self.started_auto_test {
            self.started_auto_test = true;
            if self.store.settings.auto_test_speed {
                self.test_all_speeds();
            }
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_history, "Switch history");
                    ui.checkbox(&mut self.show_notifications, "Notifications");
                    ui.separator();
                    if ui.button("npm configuration...").clicked() {
                        self.show_npm_config();
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                    }
                });
            });
        });

        if self.show_about {
            egui::Window::new("About")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("npm Registry Manager");
                        ui.label(
                            egui::RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                                .strong(),
                        );
                        ui.add_space(10.0);
                        ui.separator();
                        ui.add_space(10.0);
                        ui.label("View, switch, and speed-test npm registry mirrors");
                        ui.add_space(20.0);
                        if ui.button("Close").clicked() {
                            self.show_about = false;
                        }
                    });
                });
        }

        let mut close_npm_config = false;
        if let Some(text) = &self.npm_config_text {
            egui::Window::new("npm configuration")
                .collapsible(false)
                .default_size([500.0, 400.0])
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    egui::ScrollArea::both().max_height(350.0).show(ui, |ui| {
                        ui.label(egui::RichText::new(text).monospace().small());
                    });
                    ui.separator();
                    if ui.button("Close").clicked() {
                        close_npm_config = true;
                    }
                });
        }
        if close_npm_config {
            self.npm_config_text = None;
        }

        // Confirmation before a switch actually runs
        let mut switch_decision: Option<(bool, String)> = None;
        if let Some(dialog) = &self.confirm_switch {
            if let Some(choice) = dialog.show(ctx) {
                switch_decision = Some((choice, dialog.url.clone()));
            }
        }
        if let Some((confirmed, url)) = switch_decision {
            self.confirm_switch = None;
            if confirmed {
                self.perform_switch(url);
            }
        }

        let mut dismiss_message = false;
        if let Some(dialog) = &self.message_dialog {
            dismiss_message = dialog.show(ctx);
        }
        if dismiss_message {
            self.message_dialog = None;
        }

        egui::TopBottomPanel::bottom("status_bar")
            .min_height(24.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (color, dot) = if self.is_busy() {
                        (egui::Color32::from_rgb(255, 255, 0), "🟡")
                    } else {
                        (egui::Color32::from_rgb(0, 255, 0), "🟢")
                    };
                    ui.label(egui::RichText::new(dot).color(color));
                    ui.separator();

                    ui.label(format!("Registry: {}", self.current_name()));
                    ui.separator();

                    if let AppStatus::Busy {
                        task_name,
                        start_time,
                    } = self.status.clone()
                    {
                        let elapsed = start_time.elapsed().as_secs();
                        ui.spinner();
                        ui.label(format!("{task_name}: {elapsed}s"));
                        ui.separator();
                        if ui.button("✕").on_hover_text("Cancel task").clicked() {
                            self.cancel_task();
                        }
                        ui.separator();
                    }

                    ui.label(&self.status_message);
                });
            });

        egui::SidePanel::left("control_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(260.0)
            .max_width(400.0)
            .show(ctx, |ui| {
                ui.heading("📦 Current registry");
                ui.label(egui::RichText::new(self.current_name()).strong());
                ui.label(
                    egui::RichText::new(&self.current_url)
                        .monospace()
                        .small()
                        .weak(),
                );
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!self.is_busy(), egui::Button::new("🔄 Refresh"))
                        .on_hover_text("Re-read the active registry from npm")
                        .clicked()
                    {
                        self.refresh();
                    }
                    if ui
                        .add_enabled(!self.is_busy(), egui::Button::new("Reset to official"))
                        .clicked()
                    {
                        self.reset_to_official();
                    }
                });

                ui.add_space(10.0);
                ui.separator();

                if ui
                    .add_enabled(!self.speed_testing, egui::Button::new("⚡ Test all speeds"))
                    .clicked()
                {
                    self.test_all_speeds();
                }

                ui.add_space(10.0);

                egui::CollapsingHeader::new("➕ Add custom registry")
                    .default_open(false)
                    .show(ui, |ui| {
                        if let Some(AddRegistryAction::Validate { name, url }) =
                            self.add_panel.show(ui, !self.is_busy())
                        {
                            self.validate_and_add(name, url);
                        }
                    });

                ui.add_space(10.0);

                egui::CollapsingHeader::new("⚙ Settings")
                    .default_open(false)
                    .show(ui, |ui| {
                        let mut auto_test = self.store.settings.auto_test_speed;
                        if ui
                            .checkbox(&mut auto_test, "Test speeds on startup")
                            .changed()
                        {
                            self.store.update_settings(|s| s.auto_test_speed = auto_test);
                        }

                        let mut show_speed = self.store.settings.show_speed_in_list;
                        if ui.checkbox(&mut show_speed, "Show speeds in list").changed() {
                            self.store
                                .update_settings(|s| s.show_speed_in_list = show_speed);
                        }

                        let mut remember = self.store.settings.remember_last_registry;
                        if ui
                            .checkbox(&mut remember, "Remember last registry")
                            .changed()
                        {
                            self.store
                                .update_settings(|s| s.remember_last_registry = remember);
                        }

                        ui.horizontal(|ui| {
                            ui.label("Probe timeout");
                            let mut timeout = self.store.settings.test_timeout as i64;
                            if ui
                                .add(egui::DragValue::new(&mut timeout).range(1..=60).suffix(" s"))
                                .changed()
                            {
                                self.store.update_settings(|s| s.test_timeout = timeout as u64);
                            }
                        });
                    });
            });

        if self.show_history {
            egui::SidePanel::right("history_panel")
                .resizable(true)
                .default_width(320.0)
                .min_width(250.0)
                .max_width(500.0)
                .show(ctx, |ui| {
                    HistoryPanel::show(ui, &self.store.history, self.store.custom_registries());
                });
        }

        if self.show_notifications {
            egui::SidePanel::right("notification_panel")
                .resizable(true)
                .default_width(350.0)
                .min_width(280.0)
                .max_width(500.0)
                .show(ctx, |ui| {
                    self.notifications.show_panel(ui);
                });
        }

        self.notifications.show_toasts(ctx);

        let show_speed = self.store.settings.show_speed_in_list;
        let interactive = !self.is_busy();
        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Registries");
            ui.separator();
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    action = RegistryList::show(ui, &self.rows, show_speed, interactive);
                });
        });

        if let Some(action) = action {
            match action {
                RegistryAction::Switch { name, url } => self.request_switch(name, url),
                RegistryAction::Remove(name) => self.remove_custom(name),
                RegistryAction::Inspect(url) => self.inspect_registry(url),
            }
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.store.set_window_geometry(self.last_geometry);
        if let Some(task) = self.active_task.take() {
            // Signal, then discard; partial results already recorded stand
            task.cancel_token.cancel();
            task.handle.abort();
        }
        tracing::info!("Shutting down");
    }
}
