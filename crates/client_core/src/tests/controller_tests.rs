use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use shared::protocol::CreateEventResponse;
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use super::*;
use crate::{error::BackendError, types::FailureKind, FixedTimeZone};

type BackendResult = Result<CreateEventResponse, BackendError>;

#[derive(Default)]
struct ScriptedBackend {
    responses: AsyncMutex<VecDeque<BackendResult>>,
    requests: AsyncMutex<Vec<CreateEventRequest>>,
}

impl ScriptedBackend {
    fn with(responses: Vec<BackendResult>) -> Arc<Self> {
        Arc::new(Self {
            responses: AsyncMutex::new(responses.into()),
            requests: AsyncMutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl EventBackend for ScriptedBackend {
    async fn create_event(&self, request: CreateEventRequest) -> BackendResult {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted response".into())))
    }
}

/// Holds each request until the test releases the gate for its draft.
#[derive(Default)]
struct GatedBackend {
    gates: AsyncMutex<HashMap<String, oneshot::Receiver<BackendResult>>>,
}

impl GatedBackend {
    async fn gate(&self, draft: &str) -> oneshot::Sender<BackendResult> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(draft.to_string(), rx);
        tx
    }
}

#[async_trait]
impl EventBackend for GatedBackend {
    async fn create_event(&self, request: CreateEventRequest) -> BackendResult {
        let gate = self.gates.lock().await.remove(&request.user_input);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(BackendError::Transport("gate dropped".into()))),
            None => Err(BackendError::Transport("no gate for draft".into())),
        }
    }
}

#[derive(Default)]
struct RecordingLauncher {
    opened: std::sync::Mutex<Vec<String>>,
}

impl RecordingLauncher {
    fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("launcher lock").clone()
    }
}

impl UrlLauncher for RecordingLauncher {
    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().expect("launcher lock").push(url.to_string());
        Ok(())
    }
}

struct BrokenLauncher;

impl UrlLauncher for BrokenLauncher {
    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        anyhow::bail!("no handler registered for '{url}'")
    }
}

struct NoTimeZone;

impl TimeZoneResolver for NoTimeZone {
    fn current_time_zone(&self) -> Option<String> {
        None
    }
}

fn controller_with(
    backend: Arc<dyn EventBackend>,
    time_zones: Arc<dyn TimeZoneResolver>,
) -> (Arc<EventRequestController>, Arc<RecordingLauncher>) {
    let launcher = Arc::new(RecordingLauncher::default());
    let controller = EventRequestController::new_with_dependencies(
        backend,
        time_zones,
        launcher.clone(),
        TimeZoneId::utc(),
    );
    (controller, launcher)
}

fn new_york() -> Arc<dyn TimeZoneResolver> {
    Arc::new(FixedTimeZone(TimeZoneId::new("America/New_York")))
}

fn ok_url(url: &str) -> BackendResult {
    Ok(CreateEventResponse::with_url(url))
}

#[test]
fn starts_idle_with_empty_draft_and_status() {
    let (controller, _) = controller_with(ScriptedBackend::with(vec![]), new_york());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.draft, "");
    assert_eq!(snapshot.state, RequestState::Idle);
    assert_eq!(snapshot.status_message(), "");
    assert_eq!(snapshot.result_url(), None);
}

#[test]
fn draft_is_returned_exactly_as_given() {
    let (controller, _) = controller_with(ScriptedBackend::with(vec![]), new_york());
    for text in [
        "",
        "  Lunch with Sam tomorrow at noon  ",
        "Réunion à 9h\n📅 bring slides",
        "\t",
    ] {
        controller.update_draft(text);
        assert_eq!(controller.draft(), text);
    }
}

#[tokio::test]
async fn submit_is_pending_before_future_is_polled() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, _) = controller_with(backend, new_york());
    controller.update_draft("Standup at 9");

    let pending = controller.submit();
    assert_eq!(controller.state(), RequestState::Pending);
    assert_eq!(controller.status_message(), "Generating iCalendar file...");

    let outcome = pending.await;
    assert_eq!(
        outcome,
        SubmitOutcome::Applied(RequestState::Succeeded("https://x/y.ics".into()))
    );
}

#[tokio::test]
async fn successful_response_exposes_url_and_success_status() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, _) = controller_with(backend.clone(), new_york());
    controller.update_draft("Gym for 1 hour, then groceries");

    controller.submit().await;

    assert_eq!(
        controller.state(),
        RequestState::Succeeded("https://x/y.ics".into())
    );
    assert_eq!(controller.result_url().as_deref(), Some("https://x/y.ics"));
    assert_eq!(
        controller.status_message(),
        "iCalendar file generated successfully!"
    );

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_input, "Gym for 1 hour, then groceries");
    assert_eq!(requests[0].time_zone.as_str(), "America/New_York");
}

#[tokio::test]
async fn missing_url_is_a_malformed_response_failure() {
    let backend = ScriptedBackend::with(vec![Ok(CreateEventResponse::default())]);
    let (controller, _) = controller_with(backend, new_york());

    controller.submit().await;

    let RequestState::Failed(failure) = controller.state() else {
        panic!("expected failure, got {:?}", controller.state());
    };
    assert_eq!(failure.kind(), FailureKind::MalformedResponse);
    assert_eq!(
        controller.status_message(),
        "Error: Could not get iCalendar file URL from backend."
    );
    assert_ne!(
        controller.status_message(),
        FailureKind::Unreachable.status_message()
    );
    assert_eq!(controller.result_url(), None);
}

#[tokio::test]
async fn blank_url_is_a_malformed_response_failure() {
    let backend = ScriptedBackend::with(vec![ok_url("")]);
    let (controller, _) = controller_with(backend, new_york());

    controller.submit().await;

    let RequestState::Failed(failure) = controller.state() else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind(), FailureKind::MalformedResponse);
    assert!(failure.detail().contains("blank"));
}

#[tokio::test]
async fn transport_failure_keeps_underlying_error_text() {
    let backend = ScriptedBackend::with(vec![Err(BackendError::Unreachable(
        "tcp connect error: Connection refused (os error 111)".into(),
    ))]);
    let (controller, _) = controller_with(backend, new_york());

    controller.submit().await;

    let RequestState::Failed(failure) = controller.state() else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind(), FailureKind::Unreachable);
    assert!(failure.detail().contains("Connection refused"));
    assert_eq!(
        controller.status_message(),
        FailureKind::Unreachable.status_message()
    );
    assert!(!controller.status_message().contains("os error"));
}

#[tokio::test]
async fn failed_state_accepts_a_new_submission() {
    let backend = ScriptedBackend::with(vec![
        Err(BackendError::TimedOut("operation timed out".into())),
        ok_url("https://x/retry.ics"),
    ]);
    let (controller, _) = controller_with(backend, new_york());

    controller.submit().await;
    assert!(matches!(controller.state(), RequestState::Failed(_)));

    controller.submit().await;
    assert_eq!(
        controller.state(),
        RequestState::Succeeded("https://x/retry.ics".into())
    );
}

#[tokio::test]
async fn resubmitting_clears_previous_url() {
    let backend = Arc::new(GatedBackend::default());
    let (controller, _) = controller_with(backend.clone(), new_york());

    controller.update_draft("first");
    let first = backend.gate("first").await;
    let handle = tokio::spawn(controller.submit());
    first.send(ok_url("https://x/first.ics")).expect("release");
    handle.await.expect("join");
    assert_eq!(controller.result_url().as_deref(), Some("https://x/first.ics"));

    controller.update_draft("second");
    let _second = backend.gate("second").await;
    let _pending = controller.submit();
    assert_eq!(controller.state(), RequestState::Pending);
    assert_eq!(controller.result_url(), None);
}

#[tokio::test]
async fn open_result_is_noop_when_idle_or_failed() {
    let backend = ScriptedBackend::with(vec![Err(BackendError::Status {
        status: 500,
        detail: "boom".into(),
    })]);
    let (controller, launcher) = controller_with(backend, new_york());

    assert_eq!(controller.open_result(), OpenOutcome::NoResult);

    controller.submit().await;
    assert!(matches!(controller.state(), RequestState::Failed(_)));
    assert_eq!(controller.open_result(), OpenOutcome::NoResult);

    assert!(launcher.opened().is_empty());
}

#[tokio::test]
async fn open_result_launches_exact_url_once() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, launcher) = controller_with(backend, new_york());

    controller.submit().await;
    assert_eq!(controller.open_result(), OpenOutcome::Opened);

    assert_eq!(launcher.opened(), vec!["https://x/y.ics".to_string()]);
}

#[tokio::test]
async fn open_result_is_noop_while_pending() {
    let backend = Arc::new(GatedBackend::default());
    let (controller, launcher) = controller_with(backend.clone(), new_york());
    controller.update_draft("slow");
    let _gate = backend.gate("slow").await;

    let _pending = controller.submit();
    assert_eq!(controller.open_result(), OpenOutcome::NoResult);
    assert!(launcher.opened().is_empty());
}

#[tokio::test]
async fn latest_submission_wins_when_earlier_resolves_last() {
    let backend = Arc::new(GatedBackend::default());
    let (controller, _) = controller_with(backend.clone(), new_york());
    let first_gate = backend.gate("first").await;
    let second_gate = backend.gate("second").await;

    controller.update_draft("first");
    let first = tokio::spawn(controller.submit());
    controller.update_draft("second");
    let second = tokio::spawn(controller.submit());

    second_gate
        .send(ok_url("https://x/second.ics"))
        .expect("release second");
    assert_eq!(
        second.await.expect("join second"),
        SubmitOutcome::Applied(RequestState::Succeeded("https://x/second.ics".into()))
    );

    first_gate
        .send(ok_url("https://x/first.ics"))
        .expect("release first");
    assert_eq!(
        first.await.expect("join first"),
        SubmitOutcome::Superseded {
            token: SubmissionToken(1)
        }
    );

    assert_eq!(
        controller.state(),
        RequestState::Succeeded("https://x/second.ics".into())
    );
}

#[tokio::test]
async fn stale_response_does_not_end_newer_pending_submission() {
    let backend = Arc::new(GatedBackend::default());
    let (controller, _) = controller_with(backend.clone(), new_york());
    let first_gate = backend.gate("first").await;
    let second_gate = backend.gate("second").await;

    controller.update_draft("first");
    let first = tokio::spawn(controller.submit());
    controller.update_draft("second");
    let second = tokio::spawn(controller.submit());

    first_gate
        .send(Err(BackendError::Unreachable("connection reset".into())))
        .expect("release first");
    assert!(matches!(
        first.await.expect("join first"),
        SubmitOutcome::Superseded { .. }
    ));
    assert_eq!(controller.state(), RequestState::Pending);

    second_gate
        .send(ok_url("https://x/second.ics"))
        .expect("release second");
    second.await.expect("join second");
    assert_eq!(
        controller.result_url().as_deref(),
        Some("https://x/second.ics")
    );
}

#[tokio::test]
async fn disposed_controller_ignores_late_response() {
    let backend = Arc::new(GatedBackend::default());
    let (controller, _) = controller_with(backend.clone(), new_york());
    controller.update_draft("late");
    let gate = backend.gate("late").await;

    let pending = tokio::spawn(controller.submit());
    controller.dispose();
    gate.send(ok_url("https://x/late.ics")).expect("release");

    assert_eq!(pending.await.expect("join"), SubmitOutcome::Disposed);
    assert!(controller.is_disposed());
    assert_eq!(controller.state(), RequestState::Pending);
}

#[tokio::test]
async fn missing_time_zone_falls_back_to_configured_zone() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, _) = controller_with(backend.clone(), Arc::new(NoTimeZone));

    controller.submit().await;

    let requests = backend.requests.lock().await;
    assert_eq!(requests[0].time_zone.as_str(), "UTC");
}

#[tokio::test]
async fn unknown_time_zone_falls_back_to_configured_zone() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, _) = controller_with(
        backend.clone(),
        Arc::new(FixedTimeZone(TimeZoneId::new("Local/Nowhere"))),
    );

    controller.submit().await;

    let requests = backend.requests.lock().await;
    assert_eq!(requests[0].time_zone.as_str(), "UTC");
}

#[tokio::test]
async fn empty_draft_is_forwarded_unchanged() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, _) = controller_with(backend.clone(), new_york());

    controller.submit().await;

    assert_eq!(backend.requests.lock().await[0].user_input, "");
}

#[tokio::test]
async fn emits_pending_then_outcome_events() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let (controller, _) = controller_with(backend, new_york());
    let mut events = controller.subscribe_events();

    controller.update_draft("Call mom");
    controller.submit().await;

    assert_eq!(events.recv().await.expect("event"), ControllerEvent::DraftChanged);
    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::StateChanged(RequestState::Pending)
    );
    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::StateChanged(RequestState::Succeeded("https://x/y.ics".into()))
    );
}

#[tokio::test]
async fn open_result_reports_launcher_failure() {
    let backend = ScriptedBackend::with(vec![ok_url("https://x/y.ics")]);
    let controller = EventRequestController::new_with_dependencies(
        backend,
        new_york(),
        Arc::new(BrokenLauncher),
        TimeZoneId::utc(),
    );

    controller.submit().await;

    let OpenOutcome::LaunchFailed(reason) = controller.open_result() else {
        panic!("expected launch failure");
    };
    assert!(reason.contains("https://x/y.ics"), "{reason}");
    assert_eq!(
        controller.state(),
        RequestState::Succeeded("https://x/y.ics".into())
    );
}
