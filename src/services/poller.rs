//! Poller - Bounded Status Polling
//!
//! Re-fetches a resource on a fixed interval until it reaches a terminal
//! state, a wall-clock budget runs out, or the caller cancels through a
//! `watch` channel. Failed fetches are logged and polling continues.

use crossbeam_channel::Sender;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use super::api::JobStatusSource;
use super::events::EditorEvent;
use crate::domain::JobSnapshot;
use crate::domain::config::PollingConfig;
use crate::error::Result;

/// Polling cadence and budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub budget: Duration,
}

impl From<&PollingConfig> for PollOptions {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            budget: Duration::from_secs(config.budget_secs),
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

/// Why polling stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStop {
    Terminal,
    TimedOut,
    Cancelled,
}

/// Result of a polling run
#[derive(Clone, Debug, PartialEq)]
pub struct PollOutcome<T> {
    /// Last value successfully fetched
    pub last: Option<T>,
    pub stop: PollStop,
    /// Number of fetches issued
    pub attempts: u32,
}

/// Poll `fetch` until `is_terminal` holds, the budget elapses or `cancel`
/// turns true.
///
/// Dropping the cancel sender also stops polling.
pub async fn poll_until<T, F, Fut, P>(
    mut fetch: F,
    is_terminal: P,
    options: PollOptions,
    mut cancel: watch::Receiver<bool>,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let deadline = Instant::now() + options.budget;
    let mut outcome = PollOutcome {
        last: None,
        stop: PollStop::Cancelled,
        attempts: 0,
    };

    // A fetch in flight and the wait between fetches both race the budget
    // and the cancel channel.
    let stop = loop {
        if *cancel.borrow() {
            break PollStop::Cancelled;
        }

        outcome.attempts += 1;
        let fetched = tokio::select! {
            biased;
            _ = cancel.wait_for(|cancelled| *cancelled) => break PollStop::Cancelled,
            _ = tokio::time::sleep_until(deadline) => break PollStop::TimedOut,
            fetched = fetch() => fetched,
        };

        match fetched {
            Ok(value) => {
                let done = is_terminal(&value);
                outcome.last = Some(value);
                if done {
                    break PollStop::Terminal;
                }
            }
            Err(err) => {
                tracing::warn!("Poll attempt {} failed: {}", outcome.attempts, err);
            }
        }

        tokio::select! {
            biased;
            _ = cancel.wait_for(|cancelled| *cancelled) => break PollStop::Cancelled,
            _ = tokio::time::sleep_until(deadline) => break PollStop::TimedOut,
            _ = tokio::time::sleep(options.interval) => {}
        }
    };

    match stop {
        PollStop::Terminal => {}
        PollStop::Cancelled => {
            tracing::debug!("Polling cancelled after {} attempt(s)", outcome.attempts);
        }
        PollStop::TimedOut => {
            tracing::warn!(
                "Polling gave up after {:?} ({} attempt(s))",
                options.budget,
                outcome.attempts
            );
        }
    }
    outcome.stop = stop;
    outcome
}

/// Follow a delivery job until it is delivered or failed, forwarding every
/// fetched snapshot as [`EditorEvent::JobProgress`]
pub async fn watch_job(
    source: Arc<dyn JobStatusSource>,
    job_id: String,
    options: PollOptions,
    cancel: watch::Receiver<bool>,
    events: Option<Sender<EditorEvent>>,
) -> PollOutcome<JobSnapshot> {
    tracing::info!("Watching job {}", job_id);

    let fetch = || {
        let source = source.clone();
        let job_id = job_id.clone();
        let events = events.clone();
        async move {
            let snapshot = source.job_status(&job_id).await?;
            tracing::debug!("Job {} is {:?}", job_id, snapshot.status);
            if let Some(tx) = &events {
                let _ = tx.send(EditorEvent::JobProgress(snapshot.clone()));
            }
            Ok(snapshot)
        }
    };

    let outcome = poll_until(fetch, |s: &JobSnapshot| s.status.is_terminal(), options, cancel).await;
    tracing::info!(
        "Stopped watching job {} ({:?}, {} attempt(s))",
        job_id,
        outcome.stop,
        outcome.attempts
    );
    outcome
}
