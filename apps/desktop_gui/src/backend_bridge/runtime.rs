//! Runtime owning in-flight submissions and repaint notifications.

use std::sync::Arc;

use anyhow::Context;
use client_core::EventRequestController;
use eframe::egui;
use tokio::sync::broadcast::error::RecvError;

pub struct BackendRuntime {
    runtime: tokio::runtime::Runtime,
}

impl BackendRuntime {
    pub fn start() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("event-backend")
            .enable_all()
            .build()
            .context("failed to build backend runtime")?;
        Ok(Self { runtime })
    }

    /// Must be called from the UI thread: the controller enters `Pending`
    /// before this returns.
    pub fn spawn_submission(&self, controller: &Arc<EventRequestController>) {
        let pending = controller.submit();
        self.runtime.spawn(async move {
            let outcome = pending.await;
            tracing::debug!(?outcome, "submission finished");
        });
    }

    /// Repaints the window whenever the controller's state changes.
    pub fn forward_repaints(&self, controller: &EventRequestController, ctx: egui::Context) {
        let mut events = controller.subscribe_events();
        self.runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => ctx.request_repaint(),
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}
