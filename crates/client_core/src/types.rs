use crate::error::BackendError;

pub const PENDING_STATUS: &str = "Generating iCalendar file...";
pub const SUCCESS_STATUS: &str = "iCalendar file generated successfully!";
pub const MALFORMED_RESPONSE_STATUS: &str =
    "Error: Could not get iCalendar file URL from backend.";

/// Closed set of failure kinds shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Unreachable,
    TimedOut,
    Rejected,
    Transport,
    MalformedResponse,
}

impl FailureKind {
    pub fn status_message(self) -> &'static str {
        match self {
            Self::Unreachable => "Error creating event: the calendar service is unreachable.",
            Self::TimedOut => "Error creating event: the calendar service timed out.",
            Self::Rejected => "Error creating event: the calendar service rejected the request.",
            Self::Transport => "Error creating event: the request could not be completed.",
            Self::MalformedResponse => MALFORMED_RESPONSE_STATUS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::TimedOut => "timed_out",
            Self::Rejected => "rejected",
            Self::Transport => "transport",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl From<&BackendError> for FailureKind {
    fn from(value: &BackendError) -> Self {
        match value {
            BackendError::Unreachable(_) => Self::Unreachable,
            BackendError::TimedOut(_) => Self::TimedOut,
            BackendError::Status { .. } => Self::Rejected,
            BackendError::MalformedBody(_) => Self::MalformedResponse,
            BackendError::Transport(_) => Self::Transport,
        }
    }
}

/// A failed submission: the user-facing kind plus the raw diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    kind: FailureKind,
    detail: String,
}

impl SubmitFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, detail)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn status_message(&self) -> &'static str {
        self.kind.status_message()
    }
}

impl From<&BackendError> for SubmitFailure {
    fn from(value: &BackendError) -> Self {
        Self::new(FailureKind::from(value), value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded(String),
    Failed(SubmitFailure),
}

impl RequestState {
    pub fn status_message(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Pending => PENDING_STATUS,
            Self::Succeeded(_) => SUCCESS_STATUS,
            Self::Failed(failure) => failure.status_message(),
        }
    }

    pub fn result_url(&self) -> Option<&str> {
        match self {
            Self::Succeeded(url) => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied(RequestState),
    /// A newer submission started before this one resolved.
    Superseded {
        token: SubmissionToken,
    },
    Disposed,
}

/// Result of asking the host to open the calendar file URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// No successful submission to open.
    NoResult,
    LaunchFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    DraftChanged,
    StateChanged(RequestState),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub draft: String,
    pub state: RequestState,
}

impl ControllerSnapshot {
    pub fn status_message(&self) -> &str {
        self.state.status_message()
    }

    pub fn result_url(&self) -> Option<&str> {
        self.state.result_url()
    }
}
