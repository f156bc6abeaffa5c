#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! npm Registry Manager
//!
//! A desktop tool to view, switch, and speed-test npm registry mirrors.
//! Tries the wgpu renderer first and falls back to glow (OpenGL) for
//! systems without DirectX 12 / Vulkan support.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use npm_registry_manager::app::RegistryApp;
use npm_registry_manager::config::settings::WindowGeometry;
use npm_registry_manager::config::store::ConfigStore;
use npm_registry_manager::registry::npm::NpmClient;

fn main() -> Result<()> {
    // Initialize file logging
    let file_appender = tracing_appender::rolling::never(".", "npm-registry-manager.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting npm Registry Manager");

    // Install panic hook to log panics
    let next = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("Application panic: {}", info);
        next(info);
    }));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // Without a working npm there is nothing to manage
    let npm = match runtime.block_on(NpmClient::resolve()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Could not find a usable npm executable: {}", e);
            eprintln!("npm Registry Manager: could not find a usable npm executable ({e})");
            eprintln!("Install Node.js / npm and make sure `npm --version` works.");
            return Err(anyhow::anyhow!("npm executable not found"));
        }
    };

    let geometry = ConfigStore::open(ConfigStore::default_dir()).window_geometry();

    // Try renderers in order of compatibility:
    // wgpu (DirectX 12 / Vulkan) first, glow (OpenGL) as fallback
    tracing::info!("Attempting to start with wgpu renderer");

    if std::env::var("WGPU_POWER_PREF").is_err() {
        std::env::set_var("WGPU_POWER_PREF", "low");
    }

    let wgpu_result = run_with_renderer(
        runtime.handle().clone(),
        npm.clone(),
        geometry,
        eframe::Renderer::Wgpu,
    );

    if let Err(wgpu_err) = wgpu_result {
        tracing::warn!("wgpu renderer failed: {}. Trying glow fallback...", wgpu_err);

        let glow_result = run_with_renderer(
            runtime.handle().clone(),
            npm,
            geometry,
            eframe::Renderer::Glow,
        );

        if let Err(glow_err) = glow_result {
            tracing::error!("Both wgpu and glow renderers failed!");
            tracing::error!("wgpu error: {}", wgpu_err);
            tracing::error!("glow error: {}", glow_err);
            eprintln!("Could not initialize a graphics renderer.");
            eprintln!("wgpu: {wgpu_err}");
            eprintln!("glow: {glow_err}");
            return Err(anyhow::anyhow!("no usable graphics renderer"));
        }
    }

    Ok(())
}

/// Run the application with the specified renderer
fn run_with_renderer(
    runtime_handle: tokio::runtime::Handle,
    npm: Arc<NpmClient>,
    geometry: WindowGeometry,
    renderer: eframe::Renderer,
) -> Result<(), anyhow::Error> {
    let renderer_name = match renderer {
        eframe::Renderer::Wgpu => "wgpu",
        eframe::Renderer::Glow => "glow",
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([geometry.width as f32, geometry.height as f32])
            .with_position([geometry.x as f32, geometry.y as f32])
            .with_min_inner_size([640.0, 480.0])
            .with_title("npm Registry Manager"),
        renderer,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "npm Registry Manager",
        native_options,
        Box::new(move |cc| {
            setup_egui_style(cc);
            tracing::info!("Successfully initialized {} renderer", renderer_name);
            let store = ConfigStore::open(ConfigStore::default_dir());
            Ok(Box::new(RegistryApp::new(
                cc,
                runtime_handle.clone(),
                npm.clone(),
                store,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))
}

/// Setup egui visual style
fn setup_egui_style(cc: &eframe::CreationContext<'_>) {
    let mut style = (*cc.egui_ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);

    use egui::CornerRadius;
    style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
    style.visuals.widgets.inactive.corner_radius = CornerRadius::same(6);
    style.visuals.widgets.hovered.corner_radius = CornerRadius::same(6);
    style.visuals.widgets.active.corner_radius = CornerRadius::same(6);
    style.visuals.window_corner_radius = CornerRadius::same(10);

    cc.egui_ctx.set_style(style);
}
