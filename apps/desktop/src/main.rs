use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::load_settings, is_known_time_zone, ClientSettings, EventRequestController,
    FixedTimeZone, HttpEventBackend, OpenOutcome, RequestState, SubmitOutcome,
    SystemTimeZoneResolver, SystemUrlLauncher, TimeZoneResolver,
};
use shared::domain::TimeZoneId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Turns a free-text description into a downloadable iCalendar file.
#[derive(Parser, Debug)]
#[command(name = "calendar-event")]
struct Args {
    /// Settings file (defaults to ./event_client.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured backend base URL.
    #[arg(long)]
    backend_url: Option<String>,
    /// IANA zone to send instead of the system zone.
    #[arg(long)]
    time_zone: Option<String>,
    /// Open the calendar file once it is generated.
    #[arg(long)]
    open: bool,
    /// Only check that the backend answers, then exit.
    #[arg(long)]
    check: bool,
    /// Event description. Reads lines from stdin when omitted.
    description: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args)?;
    let backend = Arc::new(
        HttpEventBackend::from_settings(&settings).context("failed to build http client")?,
    );

    if args.check {
        backend
            .check_health()
            .await
            .with_context(|| format!("backend {} is not answering", settings.backend_url))?;
        println!("Backend {} is reachable", settings.backend_url);
        return Ok(());
    }

    let time_zones: Arc<dyn TimeZoneResolver> = match &args.time_zone {
        Some(zone) => {
            if !is_known_time_zone(zone) {
                bail!("'{zone}' is not a known IANA time zone");
            }
            Arc::new(FixedTimeZone(TimeZoneId::new(zone.clone())))
        }
        None => Arc::new(SystemTimeZoneResolver),
    };
    let controller = EventRequestController::new_with_dependencies(
        backend,
        time_zones,
        Arc::new(SystemUrlLauncher),
        settings.fallback_time_zone(),
    );

    if args.description.is_empty() {
        run_interactive(&controller, args.open).await
    } else {
        controller.update_draft(args.description.join(" "));
        submit_and_report(&controller, args.open).await;
        match controller.state() {
            RequestState::Succeeded(_) => Ok(()),
            _ => bail!("event was not created"),
        }
    }
}

/// `RUST_LOG` directives when they parse, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn resolve_settings(args: &Args) -> Result<ClientSettings> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = &args.backend_url {
        settings.backend_url = url.clone();
        settings = settings.validate()?;
    }
    Ok(settings)
}

async fn run_interactive(controller: &Arc<EventRequestController>, open: bool) -> Result<()> {
    println!(
        "Describe your events, one request per line. `:open` opens the last file, `:quit` exits."
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":open" => report_open(controller.open_result()),
            _ => {
                controller.update_draft(line.clone());
                submit_and_report(controller, open).await;
            }
        }
    }

    controller.dispose();
    Ok(())
}

async fn submit_and_report(controller: &Arc<EventRequestController>, open: bool) {
    let pending = controller.submit();
    println!("{}", controller.status_message());

    if let SubmitOutcome::Applied(state) = pending.await {
        println!("{}", state.status_message());
        if let Some(url) = state.result_url() {
            println!("iCalendar File URL: {url}");
            if open {
                report_open(controller.open_result());
            }
        }
    }
}

fn report_open(outcome: OpenOutcome) {
    match outcome {
        OpenOutcome::Opened => {}
        OpenOutcome::NoResult => println!("No iCalendar file to open yet."),
        OpenOutcome::LaunchFailed(reason) => {
            println!("Could not open the iCalendar file: {reason}")
        }
    }
}
