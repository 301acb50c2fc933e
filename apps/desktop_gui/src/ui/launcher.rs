use client_core::UrlLauncher;
use eframe::egui;

/// Opens URLs through the windowing backend at the end of the frame.
pub struct EguiUrlLauncher {
    ctx: egui::Context,
}

impl EguiUrlLauncher {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl UrlLauncher for EguiUrlLauncher {
    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.ctx.open_url(egui::OpenUrl::new_tab(url));
        Ok(())
    }
}
