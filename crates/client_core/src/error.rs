//! Failures reported by event backends.

use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("event backend unreachable: {0}")]
    Unreachable(String),
    #[error("event backend timed out: {0}")]
    TimedOut(String),
    #[error("event backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("event backend returned an undecodable body: {0}")]
    MalformedBody(String),
    #[error("event request failed: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let description = describe_error_chain(&err);
        if err.is_timeout() {
            Self::TimedOut(description)
        } else if err.is_connect() {
            Self::Unreachable(description)
        } else if err.is_decode() {
            Self::MalformedBody(description)
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                detail: description,
            }
        } else {
            Self::Transport(description)
        }
    }
}

/// Joins an error with its sources, e.g. `error sending request: tcp connect error: Connection refused`.
pub fn describe_error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}
