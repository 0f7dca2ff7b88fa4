use std::fmt;
use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::Instant;

use super::client::GitLabClient;
use super::types::Pipeline;
use crate::error::{Result, TriggerError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Final state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Succeeded,
    Failed,
    Canceled,
}

impl TerminalStatus {
    /// Maps a GitLab status string to a terminal state.
    ///
    /// Matching is exact and case-sensitive; anything else (`created`,
    /// `pending`, `running`, `manual`, ...) is still in progress.
    pub fn classify(status: &str) -> Option<Self> {
        match status {
            "success" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        };
        f.write_str(label)
    }
}

/// Result of waiting for a pipeline.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Last snapshot fetched, the one carrying the terminal status
    pub pipeline: Pipeline,
    pub status: TerminalStatus,
    /// Number of status requests sent
    pub polls: usize,
}

/// Hooks invoked while polling, used for progress display.
pub trait PollObserver {
    /// Called with every snapshot fetched, terminal or not
    fn on_snapshot(&mut self, _pipeline: &Pipeline) {}

    /// Called right before sleeping until the next poll
    fn on_wait(&mut self, _delay: Duration) {}
}

/// Asks a running [`Poller`] to stop.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving side of a [`StopHandle`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Resolves once a stop is requested. Never resolves if the handle was
    /// dropped without stopping.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Polls a pipeline on a fixed interval until it reaches a terminal status.
///
/// Without a deadline or stop signal the loop only ends on a terminal
/// status or an error. Both bounds are checked before every request and
/// every sleep, and cut a request or sleep that is already underway.
pub struct Poller<'a> {
    client: &'a GitLabClient,
    interval: Duration,
    deadline: Option<Instant>,
    stop: Option<StopSignal>,
}

impl<'a> Poller<'a> {
    pub fn new(client: &'a GitLabClient) -> Self {
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
            stop: None,
        }
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline `timeout` from now. A timeout too large to
    /// represent as an instant leaves the poller without a deadline.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.deadline(deadline),
            None => {
                warn!("Timeout of {}s is out of range, waiting without one", timeout.as_secs());
                self
            }
        }
    }

    #[must_use]
    pub fn stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Waits for pipeline `pipeline_id` of project `project_id` to finish.
    ///
    /// # Errors
    ///
    /// Returns the first error from the status request, `Timeout` once the
    /// deadline passes, or `Cancelled` once a stop is requested.
    pub async fn wait_for(
        &self,
        project_id: u64,
        pipeline_id: u64,
        observer: &mut impl PollObserver,
    ) -> Result<PollOutcome> {
        info!(
            "Polling pipeline {pipeline_id} every {}s",
            self.interval.as_secs_f64()
        );
        let mut polls = 0;

        loop {
            let pipeline = self
                .bounded(
                    pipeline_id,
                    self.client.pipeline_status(pipeline_id, project_id),
                )
                .await?;
            polls += 1;
            observer.on_snapshot(&pipeline);

            if let Some(status) = TerminalStatus::classify(&pipeline.status) {
                info!("Pipeline {pipeline_id} {status} after {polls} poll(s)");
                return Ok(PollOutcome {
                    pipeline,
                    status,
                    polls,
                });
            }

            debug!(
                "Pipeline {pipeline_id} is {}, checking again in {:?}",
                pipeline.status, self.interval
            );
            observer.on_wait(self.interval);
            self.bounded(pipeline_id, async {
                tokio::time::sleep(self.interval).await;
                Ok(())
            })
            .await?;
        }
    }

    /// Runs `work` unless the stop signal or the deadline fires first.
    async fn bounded<T>(
        &self,
        pipeline_id: u64,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let stopped = async {
            match &self.stop {
                Some(stop) => stop.stopped().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = stopped => Err(TriggerError::Cancelled { pipeline_id }),
            () = expired => Err(TriggerError::Timeout { pipeline_id }),
            result = work => result,
        }
    }
}
