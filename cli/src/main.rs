//! Ferry CLI - fetches URLs through the request bridge.
//!
//! # Architecture
//!
//! The binary plays both sides of the bridge: it starts requests from the main
//! thread and drains completions on the same thread, the way a UI thread would.
//!
//! ```text
//! main() -> NetworkBridge::start(handle, url) ... -> tokio worker pool
//!              |                                         |
//!              v                                         v
//!          EventPump::poll_events  <-- ChannelSink <-- completion callback
//! ```
//!
//! # Event Loop
//!
//! Every tick the main thread drains up to [`EVENT_BUDGET`] events into a
//! [`Consumer`]. The loop ends once nothing is in flight and the queue is empty.

mod assets;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ferry_config::{ConfigError, FerryConfig};
use ferry_engine::{Consumer, event_channel};
use ferry_net::{HttpRequest, HttpTransport, NetworkBridge};
use ferry_types::RequestHandle;

const EVENT_BUDGET: usize = 64;
const TICK: Duration = Duration::from_millis(8);

fn init_tracing(config_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_ferry_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file; stdout carries results, so diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_ferry_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in ferry_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn ferry_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.ferry/logs/ferry.log
    if let Some(data_dir) = ferry_config::data_dir() {
        candidates.push(data_dir.join("logs").join("ferry.log"));
    }

    // Fallback: ./.ferry/logs/ferry.log
    candidates.push(PathBuf::from(".ferry").join("logs").join("ferry.log"));

    candidates
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "ferry")]
#[command(about = "Fetch URLs through the request bridge. Handles are assigned 1..N.")]
struct Args {
    /// URLs to fetch
    #[arg(required = true)]
    urls: Vec<String>,

    /// Request header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Send this body as a POST payload
    #[arg(short, long)]
    data: Option<String>,

    /// Cancel everything still in flight after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,
}

impl Args {
    fn request(&self, url: &str) -> HttpRequest {
        let request = match &self.data {
            Some(body) => HttpRequest::post(url, body.clone().into_bytes()),
            None => HttpRequest::get(url),
        };
        request.with_header_block(&self.headers.join("\n"))
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// Prints one line per completed request and keeps totals.
#[derive(Debug, Default)]
struct Summary {
    succeeded: usize,
    failed: usize,
    cancelled: usize,
}

impl Consumer for Summary {
    fn on_request_complete(
        &mut self,
        handle: RequestHandle,
        data: Option<Vec<u8>>,
        error: Option<String>,
    ) {
        match (data, error) {
            (Some(body), _) => {
                self.succeeded += 1;
                println!("{handle}\tok\t{} bytes", body.len());
            }
            (None, Some(message)) => {
                self.failed += 1;
                println!("{handle}\terror\t{message}");
            }
            (None, None) => {
                self.cancelled += 1;
                println!("{handle}\tcancelled");
            }
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn load_config() -> (FerryConfig, Option<ConfigError>) {
    match FerryConfig::load() {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(e) => (FerryConfig::default(), Some(e)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_error) = load_config();
    init_tracing(&config.log_filter());
    if let Some(e) = config_error {
        tracing::warn!(path = %e.path().display(), "Using default configuration: {e}");
    }

    if let Some(dest) = config.assets_dest() {
        let src = config.assets_source();
        if src.is_dir() && !assets::extract_assets(&src, &dest) {
            tracing::warn!(src = %src.display(), dest = %dest.display(), "Some assets were not extracted");
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .thread_name("ferry-net")
        .enable_all()
        .build()
        .context("failed to build worker runtime")?;

    let transport = HttpTransport::with_settings(&config.http_settings(), runtime.handle().clone())
        .context("failed to build HTTP client")?;
    let (sink, mut pump) = event_channel();
    let bridge = NetworkBridge::new(transport, Arc::new(sink));

    let mut summary = Summary::default();
    for (index, url) in args.urls.iter().enumerate() {
        let handle = RequestHandle::new(i64::try_from(index + 1)?);
        bridge.start(handle, args.request(url))?;
    }

    let deadline = args
        .cancel_after_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));
    loop {
        let drained = pump.poll_events(EVENT_BUDGET, &mut summary);
        if drained == 0 && bridge.in_flight() == 0 {
            break;
        }
        if let Some(at) = deadline
            && Instant::now() >= at
            && bridge.in_flight() > 0
        {
            tracing::info!(in_flight = bridge.in_flight(), "Cancel deadline reached");
            bridge.cancel_all();
        }
        thread::sleep(TICK);
    }

    bridge.shutdown();
    drop(bridge);
    // Drains completions claimed before shutdown; ends once every sink handle is gone.
    pump.run(&mut summary);
    runtime.shutdown_timeout(Duration::from_secs(1));

    let cleared = args.urls.len() - summary.succeeded - summary.failed - summary.cancelled;
    println!(
        "{} ok, {} failed, {} cancelled, {} cleared",
        summary.succeeded, summary.failed, summary.cancelled, cleared
    );
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        cleared,
        "Done"
    );
    Ok(())
}
