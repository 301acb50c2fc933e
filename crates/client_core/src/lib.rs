use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::TimeZoneId,
    protocol::{CreateEventRequest, CreateEventResponse},
};
use tracing::debug;

pub mod config;
pub mod controller;
pub mod error;
pub mod transport;
pub mod types;

pub use config::{load_settings, ClientSettings};
pub use controller::EventRequestController;
pub use error::BackendError;
pub use transport::HttpEventBackend;
pub use types::{
    ControllerEvent, ControllerSnapshot, FailureKind, OpenOutcome, RequestState, SubmissionToken,
    SubmitFailure, SubmitOutcome,
};

#[async_trait]
pub trait EventBackend: Send + Sync {
    async fn create_event(
        &self,
        request: CreateEventRequest,
    ) -> std::result::Result<CreateEventResponse, BackendError>;
}

/// Backend used when no event service is configured; every request fails.
pub struct MissingEventBackend;

#[async_trait]
impl EventBackend for MissingEventBackend {
    async fn create_event(
        &self,
        _request: CreateEventRequest,
    ) -> std::result::Result<CreateEventResponse, BackendError> {
        Err(BackendError::Unreachable("no event backend configured".to_string()))
    }
}

/// Host service that reports the caller's current IANA zone name.
pub trait TimeZoneResolver: Send + Sync {
    fn current_time_zone(&self) -> Option<String>;
}

pub struct SystemTimeZoneResolver;

impl TimeZoneResolver for SystemTimeZoneResolver {
    fn current_time_zone(&self) -> Option<String> {
        match iana_time_zone::get_timezone() {
            Ok(name) => Some(name),
            Err(err) => {
                debug!("system time zone unavailable: {err}");
                None
            }
        }
    }
}

/// Always reports the same zone, e.g. from a `--time-zone` override.
pub struct FixedTimeZone(pub TimeZoneId);

impl TimeZoneResolver for FixedTimeZone {
    fn current_time_zone(&self) -> Option<String> {
        Some(self.0.as_str().to_string())
    }
}

/// Host service that opens an absolute URL, typically in a browser.
pub trait UrlLauncher: Send + Sync {
    fn open_url(&self, url: &str) -> Result<()>;
}

pub struct SystemUrlLauncher;

impl UrlLauncher for SystemUrlLauncher {
    fn open_url(&self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("failed to open '{url}'"))
    }
}

pub fn is_known_time_zone(name: &str) -> bool {
    name.parse::<chrono_tz::Tz>().is_ok()
}
