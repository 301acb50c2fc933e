use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use client_core::load_settings;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod ui;

use backend_bridge::runtime::BackendRuntime;
use ui::EventCreatorApp;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file (defaults to ./event_client.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured backend base URL.
    #[arg(long)]
    backend_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.backend_url {
        settings.backend_url = url;
        settings = settings.validate()?;
    }
    let runtime = BackendRuntime::start()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Calendar Event Creator")
            .with_inner_size([560.0, 380.0])
            .with_min_inner_size([380.0, 280.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Calendar Event Creator",
        options,
        Box::new(move |cc| Ok(Box::new(EventCreatorApp::new(cc, &settings, runtime)))),
    )
    .map_err(|err| anyhow!("event creator window failed: {err}"))
}
