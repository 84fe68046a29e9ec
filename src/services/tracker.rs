//! Asynchronous job tracking: submit a media file, then poll the backend on
//! a fixed cadence until the job reaches a terminal state.
//!
//! Ticks fire on a timer that does not wait for the previous request, so
//! in-flight status responses may overlap and arrive out of order. The only
//! synchronization against stale responses is the monotonic rank guard in
//! [`TrackedJob::apply`]: a response reporting a status below the rank
//! already recorded is discarded, and nothing is applied once the job is
//! terminal or cancelled.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::models::job::{Job, JobStatus};
use crate::models::result::AnalysisResult;
use crate::services::gateway::{ApiGateway, GatewayError, RemoteStatus};
use crate::services::history::HistoryStore;
use crate::services::notifications::NotificationQueue;

/// Consecutive transport-level poll failures tolerated before the job is
/// resolved to `error`. Backend-reported errors abort immediately.
pub const MAX_TRANSPORT_FAILURES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// A failure that terminates a job's polling and resolves it to `error`.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("analysis failed on the server")]
    Backend,

    #[error("analysis finished but the backend returned no result id")]
    MissingResult,

    #[error("could not fetch result {result_id}: {source}")]
    ResultFetch {
        result_id: String,
        source: GatewayError,
    },

    #[error("status polling aborted after {failures} consecutive transport failures: {source}")]
    Transport { failures: u32, source: GatewayError },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Submits analysis jobs and owns their polling lifecycle.
pub struct JobTracker {
    gateway: Arc<ApiGateway>,
    history: Arc<HistoryStore>,
    notifications: Arc<NotificationQueue>,
    poll_interval: Duration,
}

impl JobTracker {
    pub fn new(
        gateway: Arc<ApiGateway>,
        history: Arc<HistoryStore>,
        notifications: Arc<NotificationQueue>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            gateway,
            history,
            notifications,
            poll_interval,
        }
    }

    /// Upload a media file and start tracking the resulting job.
    ///
    /// On upload failure no job exists and nothing is retried; the error is
    /// surfaced both as the return value and as a `danger` notification. On
    /// success the returned handle is already polling.
    pub async fn submit(&self, file_name: &str, bytes: Vec<u8>) -> Result<JobHandle, UploadError> {
        tracing::info!(file = file_name, size = bytes.len(), "submitting media for analysis");

        let job_id = match self.gateway.upload(file_name, bytes).await {
            Ok(id) => id,
            Err(e) => {
                self.notifications.danger("Upload Failed", e.to_string());
                return Err(UploadError::Gateway(e));
            }
        };
        self.notifications.success(
            "Upload Successful",
            format!("{file_name} accepted for analysis"),
        );
        tracing::info!(%job_id, file = file_name, "upload accepted, polling status");

        // The upload call has already completed, so the job enters the
        // backend queue directly.
        let (status_tx, status_rx) = watch::channel(JobStatus::Queued);
        let shared = Arc::new(TrackedJob {
            job_id,
            source_file: file_name.to_string(),
            created_at: Utc::now(),
            gateway: Arc::clone(&self.gateway),
            history: Arc::clone(&self.history),
            notifications: Arc::clone(&self.notifications),
            status: status_tx,
            cancel: CancellationToken::new(),
            transport_failures: AtomicU32::new(0),
            result: Mutex::new(None),
        });
        let ticker = tokio::spawn(run_ticker(Arc::clone(&shared), self.poll_interval));

        Ok(JobHandle {
            shared,
            status_rx,
            _ticker: ticker,
        })
    }
}

/// State shared between the ticker task, its per-tick request tasks, and the
/// consumer-facing handle.
#[derive(Debug)]
struct TrackedJob {
    job_id: String,
    source_file: String,
    created_at: DateTime<Utc>,
    gateway: Arc<ApiGateway>,
    history: Arc<HistoryStore>,
    notifications: Arc<NotificationQueue>,
    status: watch::Sender<JobStatus>,
    cancel: CancellationToken,
    transport_failures: AtomicU32,
    result: Mutex<Option<AnalysisResult>>,
}

impl TrackedJob {
    /// Record an observed status if it moves the job forward.
    ///
    /// Returns whether the status was applied. Discards anything observed
    /// after cancellation, after a terminal state, or at a rank at or below
    /// the one already recorded.
    fn apply(&self, observed: JobStatus) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.status.send_if_modified(|current| {
            if current.is_terminal() || observed.rank() <= current.rank() {
                return false;
            }
            tracing::debug!(job_id = %self.job_id, from = %current, to = %observed, "status advanced");
            *current = observed;
            true
        })
    }

    /// Handle one status response. Runs in its own task per tick.
    async fn poll_once(self: Arc<Self>) {
        let response = self.gateway.status(&self.job_id).await;
        // A response landing after cancellation is stale and must not be applied.
        if self.cancel.is_cancelled() {
            return;
        }
        match response {
            Ok(status) => {
                self.transport_failures.store(0, Ordering::Relaxed);
                match status.status {
                    RemoteStatus::Queued => {
                        self.apply(JobStatus::Queued);
                    }
                    RemoteStatus::Processing => {
                        self.apply(JobStatus::Processing);
                    }
                    RemoteStatus::Done => match status.result_id.as_deref() {
                        Some(result_id) if !result_id.is_empty() => self.complete(result_id).await,
                        // `done` without evidence is an error.
                        _ => self.fail(PollError::MissingResult),
                    },
                    RemoteStatus::Error => self.fail(PollError::Backend),
                }
            }
            Err(e) if e.is_transport() => {
                let failures = self.transport_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures >= MAX_TRANSPORT_FAILURES {
                    self.fail(PollError::Transport {
                        failures,
                        source: e,
                    });
                } else {
                    tracing::warn!(
                        job_id = %self.job_id,
                        failures,
                        error = %e,
                        "transient poll failure, retrying on next tick"
                    );
                }
            }
            Err(e) => self.fail(PollError::Gateway(e)),
        }
    }

    /// Fetch the result for a finished job, record it in history, and stop
    /// polling.
    async fn complete(&self, result_id: &str) {
        match self.gateway.result(result_id).await {
            Ok(result) => {
                if self.apply(JobStatus::Done) {
                    *self.result.lock().unwrap() = Some(result.clone());
                    let inserted = self.history.add(result);
                    tracing::info!(
                        job_id = %self.job_id,
                        result_id,
                        newly_recorded = inserted,
                        "analysis complete"
                    );
                    self.notifications
                        .success("Analysis Complete", format!("Result {result_id} is ready"));
                    self.cancel.cancel();
                }
            }
            Err(e) => self.fail(PollError::ResultFetch {
                result_id: result_id.to_string(),
                source: e,
            }),
        }
    }

    /// Resolve the job to `error` and stop polling. Only the first failure
    /// wins; later calls are no-ops.
    fn fail(&self, error: PollError) {
        if self.apply(JobStatus::Error) {
            tracing::warn!(job_id = %self.job_id, error = %error, "job failed");
            self.notifications.danger("Analysis Failed", error.to_string());
            self.cancel.cancel();
        }
    }
}

/// Fixed-cadence ticker. Each tick issues exactly one status request in its
/// own task, so a delayed response never blocks the next tick.
async fn run_ticker(shared: Arc<TrackedJob>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::spawn(Arc::clone(&shared).poll_once());
            }
        }
    }
    tracing::debug!(job_id = %shared.job_id, "polling stopped");
}

/// Handle to one tracked job.
///
/// Holds the polling resource: dropping the handle cancels polling, so a
/// torn-down consumer cannot leak recurring background work.
#[derive(Debug)]
pub struct JobHandle {
    shared: Arc<TrackedJob>,
    status_rx: watch::Receiver<JobStatus>,
    _ticker: tokio::task::JoinHandle<()>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.shared.job_id
    }

    pub fn status(&self) -> JobStatus {
        *self.status_rx.borrow()
    }

    /// Snapshot of the tracked job.
    pub fn job(&self) -> Job {
        Job {
            id: self.shared.job_id.clone(),
            status: self.status(),
            source_file: self.shared.source_file.clone(),
            created_at: self.shared.created_at,
        }
    }

    /// The fetched result, once the job is `done`.
    pub fn result(&self) -> Option<AnalysisResult> {
        self.shared.result.lock().unwrap().clone()
    }

    /// Stop polling. Idempotent; safe to call while a tick's request is in
    /// flight, whose response will then be discarded.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Wait until the job reaches a terminal status or is cancelled, and
    /// return the last observed status.
    pub async fn wait(&mut self) -> JobStatus {
        loop {
            let current = *self.status_rx.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            tokio::select! {
                // Terminal transitions are applied before the token fires,
                // so the final borrow observes them.
                _ = self.shared.cancel.cancelled() => return *self.status_rx.borrow(),
                changed = self.status_rx.changed() => {
                    if changed.is_err() {
                        return *self.status_rx.borrow();
                    }
                }
            }
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}
