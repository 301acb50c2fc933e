use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::TimeZoneId;
use tracing::warn;
use url::Url;

use crate::is_known_time_zone;

pub const DEFAULT_SETTINGS_FILE: &str = "event_client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub backend_url: String,
    /// Zero disables the HTTP timeout.
    pub request_timeout_secs: u64,
    pub fallback_time_zone: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".into(),
            request_timeout_secs: 60,
            fallback_time_zone: TimeZoneId::UTC.into(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn fallback_time_zone(&self) -> TimeZoneId {
        TimeZoneId::new(self.fallback_time_zone.clone())
    }

    pub fn validate(mut self) -> anyhow::Result<Self> {
        self.backend_url = normalize_backend_url(&self.backend_url)?;

        let zone = self.fallback_time_zone.trim();
        if !is_known_time_zone(zone) {
            bail!("fallback time zone '{zone}' is not a known IANA zone name");
        }
        self.fallback_time_zone = zone.to_string();

        Ok(self)
    }
}

/// Defaults, then the settings file, then environment overrides.
///
/// An explicit `path` must exist; the default file in the working
/// directory is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                ClientSettings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate()
}

pub fn read_settings_file(path: &Path) -> anyhow::Result<ClientSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

pub fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("EVENT_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = lookup("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(err) => warn!(value = %v, "ignoring APP__REQUEST_TIMEOUT_SECS: {err}"),
        }
    }

    if let Some(v) = lookup("APP__FALLBACK_TIME_ZONE") {
        settings.fallback_time_zone = v;
    }
}

pub fn normalize_backend_url(raw_backend_url: &str) -> anyhow::Result<String> {
    let raw_backend_url = raw_backend_url.trim();

    if raw_backend_url.is_empty() {
        return Ok(ClientSettings::default().backend_url);
    }

    let parsed = Url::parse(raw_backend_url)
        .with_context(|| format!("invalid backend url '{raw_backend_url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "backend url '{raw_backend_url}' must use http or https, not '{}'",
            parsed.scheme()
        );
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        bail!("backend url '{raw_backend_url}' must not carry a query or fragment");
    }

    Ok(raw_backend_url.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
