//! HTTP transport to the event backend.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use shared::{
    error::ApiError,
    protocol::{CreateEventRequest, CreateEventResponse, CREATE_EVENT_PATH},
};
use tracing::debug;

use crate::{config::ClientSettings, error::BackendError, EventBackend};

pub struct HttpEventBackend {
    http: Client,
    base_url: String,
}

impl HttpEventBackend {
    /// `base_url` must already be normalized (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(BackendError::from_reqwest)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, BackendError> {
        Self::new(settings.backend_url.clone(), settings.request_timeout())
    }

    /// Liveness check against the backend root, which answers with a greeting.
    pub async fn check_health(&self) -> Result<(), BackendError> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl EventBackend for HttpEventBackend {
    async fn create_event(
        &self,
        request: CreateEventRequest,
    ) -> Result<CreateEventResponse, BackendError> {
        let url = format!("{}{CREATE_EVENT_PATH}", self.base_url);
        debug!(%url, "posting event draft");

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        let body = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(BackendError::from_reqwest)?;

        decode_create_event_body(&body)
    }
}

/// Only a JSON object is a valid success body; arrays would otherwise
/// decode positionally into the response struct.
fn decode_create_event_body(body: &[u8]) -> Result<CreateEventResponse, BackendError> {
    let malformed = |reason: String| {
        BackendError::MalformedBody(format!(
            "{reason} (body: {})",
            String::from_utf8_lossy(&body[..body.len().min(256)])
        ))
    };

    let value: Value = serde_json::from_slice(body).map_err(|err| malformed(err.to_string()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|err| malformed(err.to_string()))
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => api_error.message(),
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("empty response body")
            .to_string(),
        Err(_) => body,
    };

    Err(BackendError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
