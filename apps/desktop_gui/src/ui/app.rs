use std::{sync::Arc, time::Duration};

use client_core::{
    ClientSettings, EventBackend, EventRequestController, HttpEventBackend, MissingEventBackend,
    OpenOutcome, RequestState, SystemTimeZoneResolver,
};
use eframe::egui;

use crate::{backend_bridge::runtime::BackendRuntime, ui::launcher::EguiUrlLauncher};

const DRAFT_HINT: &str = "Enter event details (e.g., 'Meeting tomorrow at 10 AM about project X')";

pub struct EventCreatorApp {
    controller: Arc<EventRequestController>,
    runtime: BackendRuntime,
    draft: String,
}

impl EventCreatorApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: &ClientSettings,
        runtime: BackendRuntime,
    ) -> Self {
        // The screen still opens without a usable HTTP client; submissions then
        // fail as unreachable.
        let backend: Arc<dyn EventBackend> = match HttpEventBackend::from_settings(settings) {
            Ok(backend) => Arc::new(backend),
            Err(err) => {
                tracing::error!("failed to build event backend client: {err}");
                Arc::new(MissingEventBackend)
            }
        };
        let controller = EventRequestController::new_with_dependencies(
            backend,
            Arc::new(SystemTimeZoneResolver),
            Arc::new(EguiUrlLauncher::new(cc.egui_ctx.clone())),
            settings.fallback_time_zone(),
        );
        runtime.forward_repaints(&controller, cc.egui_ctx.clone());
        tracing::info!(backend_url = %settings.backend_url, "event creator ready");

        Self {
            controller,
            runtime,
            draft: String::new(),
        }
    }

    fn show_result(&self, ui: &mut egui::Ui, url: &str) {
        ui.add_space(16.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label("iCalendar File URL:");
                let link_clicked = ui.link(url).clicked();
                ui.add_space(6.0);
                let button_clicked = ui.button("Open/Download .ics File").clicked();
                if link_clicked || button_clicked {
                    if let OpenOutcome::LaunchFailed(reason) = self.controller.open_result() {
                        tracing::warn!("calendar file was not opened: {reason}");
                    }
                }
            });
        });
    }
}

impl eframe::App for EventCreatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = self.controller.snapshot();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new("Calendar Event Creator").strong());
                ui.add_space(16.0);

                let edit = egui::TextEdit::singleline(&mut self.draft)
                    .hint_text(DRAFT_HINT)
                    .desired_width(f32::INFINITY);
                if ui.add(edit).changed() {
                    self.controller.update_draft(self.draft.clone());
                }

                ui.add_space(12.0);
                if ui.button("Create iCalendar File").clicked() {
                    self.runtime.spawn_submission(&self.controller);
                }

                let status = snapshot.status_message();
                if !status.is_empty() {
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(status)
                            .italics()
                            .color(status_color(&snapshot.state)),
                    );
                }
            });

            if let Some(url) = snapshot.result_url() {
                self.show_result(ui, url);
            }
        });

        if snapshot.state.is_pending() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl Drop for EventCreatorApp {
    fn drop(&mut self) {
        self.controller.dispose();
    }
}

fn status_color(state: &RequestState) -> egui::Color32 {
    match state {
        RequestState::Failed(_) => egui::Color32::from_rgb(0xd0, 0x50, 0x50),
        RequestState::Succeeded(_) => egui::Color32::from_rgb(0x40, 0xa0, 0x60),
        RequestState::Idle | RequestState::Pending => egui::Color32::GRAY,
    }
}
