//! UI layer: the event creator screen and its host services.

pub mod app;
pub mod launcher;

pub use app::EventCreatorApp;
