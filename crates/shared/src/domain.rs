use std::fmt;

use serde::{Deserialize, Serialize};

/// IANA zone name such as `America/New_York`, sent alongside each draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeZoneId(pub String);

impl TimeZoneId {
    pub const UTC: &'static str = "UTC";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn utc() -> Self {
        Self(Self::UTC.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TimeZoneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TimeZoneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
