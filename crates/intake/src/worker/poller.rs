//! Background polling of the mailbox.
//!
//! The poller is either idle or polling. While polling, a tokio task runs
//! a recent-window import, records the completion time and then waits for
//! the poll interval or a stop request, whichever comes first.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::email::error::Result;
use crate::email::{ContactImporter, ImportSummary};

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

impl StartOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartOutcome::Started => "started",
            StartOutcome::AlreadyRunning => "already_running",
        }
    }
}

/// Snapshot of the poller state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollerStatus {
    pub is_processing: bool,
    /// UTC `YYYY-MM-DD HH:MM:SS` of the last successful poll.
    pub last_processed: Option<String>,
}

#[derive(Default)]
struct State {
    stop_tx: Option<watch::Sender<bool>>,
    /// A stopped task may still be finishing its import when a new one
    /// starts, so every unfinished handle is kept until shutdown.
    tasks: Vec<JoinHandle<()>>,
    last_processed: Option<DateTime<Utc>>,
}

/// Start/stop handle around a [`ContactImporter`]. Cloning shares state.
#[derive(Clone)]
pub struct Poller {
    importer: ContactImporter,
    interval: Duration,
    state: Arc<Mutex<State>>,
}

impl Poller {
    pub fn new(importer: ContactImporter, interval: Duration) -> Self {
        Self {
            importer,
            interval,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn importer(&self) -> &ContactImporter {
        &self.importer
    }

    // A panic while holding the lock cannot leave State half-written.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts the background task unless it is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> StartOutcome {
        let mut state = self.lock();
        if state.stop_tx.is_some() {
            return StartOutcome::AlreadyRunning;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(
            self.importer.clone(),
            self.interval,
            Arc::clone(&self.state),
            stop_rx,
        ));

        state.tasks.retain(|task| !task.is_finished());
        state.stop_tx = Some(stop_tx);
        state.tasks.push(task);
        info!(interval_secs = self.interval.as_secs(), "Polling started");
        StartOutcome::Started
    }

    /// Signals the background task to exit. Returns whether it was running.
    ///
    /// An import already in flight finishes; the task exits before the
    /// next wait.
    pub fn stop(&self) -> bool {
        let mut state = self.lock();
        match state.stop_tx.take() {
            Some(stop_tx) => {
                let _ = stop_tx.send(true);
                info!("Polling stopped");
                true
            }
            None => false,
        }
    }

    /// Stops polling and waits for every polling task to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let tasks = std::mem::take(&mut self.lock().tasks);
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Polling task ended abnormally");
            }
        }
    }

    pub fn status(&self) -> PollerStatus {
        let state = self.lock();
        PollerStatus {
            is_processing: state.stop_tx.is_some(),
            last_processed: state
                .last_processed
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// One full-mailbox import, independent of the polling state.
    pub async fn run_once(&self) -> Result<ImportSummary> {
        self.importer.import_all().await
    }
}

async fn poll_loop(
    importer: ContactImporter,
    interval: Duration,
    state: Arc<Mutex<State>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        info!("Checking for new application emails");
        match importer.import_recent().await {
            Ok(summary) => {
                info!(
                    processed = summary.processed,
                    total_found = summary.total_found,
                    "Poll cycle complete"
                );
                // A cycle that outlived its stop request does not count.
                if !*stop_rx.borrow() {
                    let finished = Some(Utc::now());
                    state.lock().unwrap_or_else(|e| e.into_inner()).last_processed = finished;
                }
            }
            Err(e) => error!(error = %e, "Poll cycle failed"),
        }

        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            // Err means the poller was dropped
            _ = stop_rx.changed() => break,
        }
    }
}
