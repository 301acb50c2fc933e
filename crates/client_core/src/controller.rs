//! Request lifecycle for a single event-creation screen.
//!
//! State moves `Idle -> Pending -> {Succeeded | Failed}` and back to
//! `Pending` on every submission. Overlapping submissions are allowed; only
//! the outcome of the most recent one is applied.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{domain::TimeZoneId, protocol::CreateEventRequest};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientSettings,
    is_known_time_zone,
    types::{
        ControllerEvent, ControllerSnapshot, OpenOutcome, RequestState, SubmissionToken,
        SubmitFailure, SubmitOutcome,
    },
    EventBackend, HttpEventBackend, SystemTimeZoneResolver, SystemUrlLauncher, TimeZoneResolver,
    UrlLauncher,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct EventRequestController {
    backend: Arc<dyn EventBackend>,
    time_zones: Arc<dyn TimeZoneResolver>,
    launcher: Arc<dyn UrlLauncher>,
    fallback_time_zone: TimeZoneId,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

#[derive(Default)]
struct ControllerState {
    draft: String,
    request: RequestState,
    latest_token: u64,
    disposed: bool,
}

struct PendingSubmission {
    token: SubmissionToken,
    request: CreateEventRequest,
}

impl EventRequestController {
    /// Controller talking HTTP to `settings.backend_url`, using the host's
    /// time zone and URL opener.
    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Arc<Self>> {
        let backend = HttpEventBackend::from_settings(settings)?;
        Ok(Self::new_with_dependencies(
            Arc::new(backend),
            Arc::new(SystemTimeZoneResolver),
            Arc::new(SystemUrlLauncher),
            settings.fallback_time_zone(),
        ))
    }

    pub fn new_with_dependencies(
        backend: Arc<dyn EventBackend>,
        time_zones: Arc<dyn TimeZoneResolver>,
        launcher: Arc<dyn UrlLauncher>,
        fallback_time_zone: TimeZoneId,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            backend,
            time_zones,
            launcher,
            fallback_time_zone,
            inner: Mutex::new(ControllerState::default()),
            events,
        })
    }

    pub fn update_draft(&self, text: impl Into<String>) {
        self.lock_state().draft = text.into();
        self.emit(ControllerEvent::DraftChanged);
    }

    pub fn draft(&self) -> String {
        self.lock_state().draft.clone()
    }

    pub fn state(&self) -> RequestState {
        self.lock_state().request.clone()
    }

    pub fn status_message(&self) -> String {
        self.lock_state().request.status_message().to_string()
    }

    pub fn result_url(&self) -> Option<String> {
        self.lock_state().request.result_url().map(str::to_string)
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let guard = self.lock_state();
        ControllerSnapshot {
            draft: guard.draft.clone(),
            state: guard.request.clone(),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Starts a submission of the current draft.
    ///
    /// The state is `Pending` as soon as this returns, before the returned
    /// future is first polled. The future resolves to whether its outcome
    /// was applied.
    pub fn submit(self: &Arc<Self>) -> impl Future<Output = SubmitOutcome> + Send + 'static {
        let submission = self.begin_submission();
        let controller = Arc::clone(self);
        async move { controller.complete_submission(submission).await }
    }

    /// Opens the result URL through the host launcher. Nothing is launched
    /// unless the state is `Succeeded`.
    pub fn open_result(&self) -> OpenOutcome {
        let Some(url) = self.result_url() else {
            debug!("open requested without a calendar file url");
            return OpenOutcome::NoResult;
        };

        match self.launcher.open_url(&url) {
            Ok(()) => {
                info!(%url, "opened calendar file url");
                OpenOutcome::Opened
            }
            Err(err) => {
                warn!(%url, "failed to open calendar file url: {err:#}");
                OpenOutcome::LaunchFailed(format!("{err:#}"))
            }
        }
    }

    /// Detaches the controller from its screen. Outcomes of submissions
    /// still in flight are dropped.
    pub fn dispose(&self) {
        self.lock_state().disposed = true;
        debug!("event request controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.lock_state().disposed
    }

    fn begin_submission(&self) -> PendingSubmission {
        let (token, user_input) = {
            let mut guard = self.lock_state();
            guard.latest_token += 1;
            guard.request = RequestState::Pending;
            (SubmissionToken(guard.latest_token), guard.draft.clone())
        };
        self.emit(ControllerEvent::StateChanged(RequestState::Pending));

        let time_zone = self.resolve_time_zone();
        info!(
            token = token.0,
            time_zone = %time_zone,
            draft_len = user_input.len(),
            "submitting event draft"
        );

        PendingSubmission {
            token,
            request: CreateEventRequest {
                user_input,
                time_zone,
            },
        }
    }

    async fn complete_submission(&self, submission: PendingSubmission) -> SubmitOutcome {
        let PendingSubmission { token, request } = submission;

        let next = match self.backend.create_event(request).await {
            Ok(response) => match response.usable_ics_url() {
                Some(url) => {
                    info!(token = token.0, %url, "calendar file generated");
                    RequestState::Succeeded(url.to_string())
                }
                None => {
                    let detail = if response.ics_url.is_some() {
                        "response ics_url was blank"
                    } else {
                        "response did not include ics_url"
                    };
                    warn!(token = token.0, detail, "event backend returned no usable url");
                    RequestState::Failed(SubmitFailure::malformed(detail))
                }
            },
            Err(err) => {
                let failure = SubmitFailure::from(&err);
                error!(
                    token = token.0,
                    kind = failure.kind().as_str(),
                    "event request failed: {err}"
                );
                RequestState::Failed(failure)
            }
        };

        self.apply_outcome(token, next)
    }

    fn apply_outcome(&self, token: SubmissionToken, next: RequestState) -> SubmitOutcome {
        {
            let mut guard = self.lock_state();
            if guard.disposed {
                debug!(token = token.0, "dropping outcome for disposed controller");
                return SubmitOutcome::Disposed;
            }
            if guard.latest_token != token.0 {
                debug!(
                    token = token.0,
                    latest = guard.latest_token,
                    "dropping outcome of superseded submission"
                );
                return SubmitOutcome::Superseded { token };
            }
            guard.request = next.clone();
        }

        self.emit(ControllerEvent::StateChanged(next.clone()));
        SubmitOutcome::Applied(next)
    }

    fn resolve_time_zone(&self) -> TimeZoneId {
        match self.time_zones.current_time_zone() {
            Some(name) if is_known_time_zone(&name) => TimeZoneId::new(name),
            Some(name) => {
                warn!(
                    time_zone = %name,
                    fallback = %self.fallback_time_zone,
                    "unrecognized time zone; using fallback"
                );
                self.fallback_time_zone.clone()
            }
            None => {
                warn!(
                    fallback = %self.fallback_time_zone,
                    "time zone unavailable; using fallback"
                );
                self.fallback_time_zone.clone()
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
