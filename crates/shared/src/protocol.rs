use serde::{Deserialize, Serialize};

use crate::domain::TimeZoneId;

/// Path of the event creation endpoint, relative to the backend base URL.
pub const CREATE_EVENT_PATH: &str = "/create-event";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub user_input: String,
    pub time_zone: TimeZoneId,
}

/// Success body of `POST /create-event`.
///
/// The field is optional on purpose: a 2xx response without a usable
/// `ics_url` is a distinct failure, not a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ics_url: Option<String>,
}

impl CreateEventResponse {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            ics_url: Some(url.into()),
        }
    }

    /// Returns the calendar file URL when present and not blank.
    pub fn usable_ics_url(&self) -> Option<&str> {
        self.ics_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }
}
