//! Job status poller.
//!
//! Each cycle reads the poll target from the page, fetches the job list and
//! reconciles it into the page's per-job elements. The loop runs as an owned
//! tokio task; the returned [`PollerHandle`] stops it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::models::{ElementKind, JobRecord};
use super::page::Page;
use super::source::{JobSource, PollError};
use super::styles::status_style;

/// Timing of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerSettings {
    /// Delay before the first cycle, and before the first cycle after a resync.
    pub initial_delay: Duration,
    /// Delay after a cycle that reconciled the page.
    pub success_interval: Duration,
    /// Delay after a cycle that failed to fetch.
    pub failure_interval: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            success_interval: Duration::from_millis(4000),
            failure_interval: Duration::from_millis(10000),
        }
    }
}

/// Result of a single poll cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Every record had a row and was applied.
    Updated { records: Vec<JobRecord> },
    /// A record had no row; the page was reloaded and the remaining records
    /// were skipped.
    Resynced {
        unknown_id: String,
        records: Vec<JobRecord>,
    },
    /// The job list could not be fetched. The page was not touched.
    Failed(Arc<PollError>),
}

impl CycleOutcome {
    pub fn next_delay(&self, settings: &PollerSettings) -> Duration {
        match self {
            Self::Updated { .. } => settings.success_interval,
            Self::Resynced { .. } => settings.initial_delay,
            Self::Failed(_) => settings.failure_interval,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Published after every finished cycle.
#[derive(Debug, Clone)]
pub struct PollEvent {
    pub polled_at: DateTime<Utc>,
    pub next_delay: Duration,
    pub outcome: CycleOutcome,
}

pub struct Poller<P, S> {
    page: Arc<Mutex<P>>,
    source: S,
    settings: PollerSettings,
    events: broadcast::Sender<PollEvent>,
}

impl<P, S> Poller<P, S>
where
    P: Page + 'static,
    S: JobSource + 'static,
{
    pub fn new(page: Arc<Mutex<P>>, source: S, settings: PollerSettings) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            page,
            source,
            settings,
            events,
        }
    }

    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events.subscribe()
    }

    /// Run one fetch-and-reconcile cycle.
    pub async fn poll_once(&self) -> CycleOutcome {
        let config = self.page.lock().await.poll_config();

        let outcome = match config {
            None => CycleOutcome::Failed(Arc::new(PollError::MissingJobsUrl)),
            Some(config) => {
                tracing::debug!(url = %config.jobs_url, type_filter = ?config.type_filter, "Polling job status");
                match self.source.fetch(&config).await {
                    Ok(records) => {
                        let mut page = self.page.lock().await;
                        Self::reconcile(&mut *page, records)
                    }
                    Err(e) => CycleOutcome::Failed(Arc::new(e)),
                }
            }
        };

        let next_delay = outcome.next_delay(&self.settings);
        if let CycleOutcome::Failed(e) = &outcome {
            tracing::warn!(
                error = %e,
                retry_in_ms = next_delay.as_millis() as u64,
                "Error polling job status"
            );
        }

        // No subscribers is fine.
        let _ = self.events.send(PollEvent {
            polled_at: Utc::now(),
            next_delay,
            outcome: outcome.clone(),
        });

        outcome
    }

    /// Apply records in order. Stops at the first record without a row.
    fn reconcile(page: &mut P, records: Vec<JobRecord>) -> CycleOutcome {
        let mut stale = None;
        for (index, record) in records.iter().enumerate() {
            if !page.contains(&record.element_id(ElementKind::Status)) {
                stale = Some(index);
                break;
            }
            apply_record(page, record);
        }

        match stale {
            Some(index) => {
                let unknown_id = records[index].id.clone();
                tracing::info!(job_id = %unknown_id, "Job has no row on the page, resyncing");
                Self::resync(page);
                CycleOutcome::Resynced {
                    unknown_id,
                    records,
                }
            }
            None => {
                tracing::debug!(count = records.len(), "Job status reconciled");
                CycleOutcome::Updated { records }
            }
        }
    }

    /// Bring the page's row set back in line with the server.
    pub fn resync(page: &mut P) {
        page.reload();
    }

    /// Spawn the poll loop. The first cycle runs after the initial delay.
    pub fn start(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let events = self.events.clone();
        let token = cancel.clone();

        tracing::info!(
            initial_delay_ms = self.settings.initial_delay.as_millis() as u64,
            "Poller starting"
        );
        let task = tokio::spawn(async move { self.run(token).await });

        PollerHandle {
            cancel,
            task,
            events,
        }
    }

    async fn run(self, cancel: CancellationToken) {
        let mut delay = self.settings.initial_delay;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };

            delay = outcome.next_delay(&self.settings);
        }

        tracing::info!("Poller stopped");
    }
}

fn apply_record<P: Page + ?Sized>(page: &mut P, record: &JobRecord) {
    if !record.is_running() {
        let status = record.job_status();
        if let Some(style) = status_style(&status) {
            let status_id = record.element_id(ElementKind::Status);
            page.set_class(&status_id, style.class);
            page.set_style(&status_id, style.style);
            page.set_text(&status_id, status.as_str());
        }
        page.set_disabled(&record.element_id(ElementKind::TriggerButton), false);
    }

    page.set_text(&record.element_id(ElementKind::Stopped), &record.stopped);
    page.set_text(&record.element_id(ElementKind::Runtime), &record.runtime);
    page.set_text(
        &record.element_id(ElementKind::LastUpdated),
        &record.last_updated,
    );
}

/// Owns a running poll loop. Dropping the handle cancels the loop.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    events: broadcast::Sender<PollEvent>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the loop and wait for it to finish. A cycle in flight is
    /// abandoned.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            tracing::error!(error = %e, "Poller task ended abnormally");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryPage;
    use crate::core::models::PollConfig;
    use async_trait::async_trait;
    use reqwest::StatusCode;

    enum Reply {
        Jobs(Vec<JobRecord>),
        Status(u16),
    }

    struct StubSource {
        reply: std::sync::Mutex<Option<Reply>>,
    }

    impl StubSource {
        fn new(reply: Reply) -> Self {
            Self {
                reply: std::sync::Mutex::new(Some(reply)),
            }
        }
    }

    #[async_trait]
    impl JobSource for StubSource {
        async fn fetch(&self, _config: &PollConfig) -> Result<Vec<JobRecord>, PollError> {
            match self.reply.lock().unwrap().take() {
                Some(Reply::Jobs(jobs)) => Ok(jobs),
                Some(Reply::Status(code)) => {
                    Err(PollError::Status(StatusCode::from_u16(code).unwrap()))
                }
                None => Ok(Vec::new()),
            }
        }
    }

    fn record(id: &str, state: &str, status: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            state: state.to_string(),
            status: status.to_string(),
            stopped: "-".to_string(),
            runtime: "3s".to_string(),
            last_updated: "now".to_string(),
            job_type: None,
            job_uri: None,
            started: None,
            hostname: None,
        }
    }

    fn page(ids: &[&str]) -> Arc<Mutex<MemoryPage>> {
        Arc::new(Mutex::new(
            MemoryPage::new()
                .with_attribute("jobs-url", "http://localhost/internal/jobs")
                .with_rows(ids.iter().copied()),
        ))
    }

    #[tokio::test]
    async fn terminal_ok_marks_success_and_enables_trigger() {
        let page = page(&["42"]);
        let poller = Poller::new(
            page.clone(),
            StubSource::new(Reply::Jobs(vec![record("42", "Stopped", "OK")])),
            PollerSettings::default(),
        );

        let outcome = poller.poll_once().await;
        assert!(matches!(outcome, CycleOutcome::Updated { .. }));

        let page = page.lock().await;
        let status = page.element("job-status-42").unwrap();
        assert_eq!(status.class, "label label-success");
        assert_eq!(status.text, "OK");
        assert!(!page.element("trigger-button-42").unwrap().disabled);
        assert_eq!(page.element("job-stopped-42").unwrap().text, "-");
    }

    #[tokio::test]
    async fn unknown_terminal_status_still_enables_trigger() {
        let page = page(&["1"]);
        let poller = Poller::new(
            page.clone(),
            StubSource::new(Reply::Jobs(vec![record("1", "Stopped", "PENDING")])),
            PollerSettings::default(),
        );

        poller.poll_once().await;

        let page = page.lock().await;
        let status = page.element("job-status-1").unwrap();
        assert_eq!(status.class, "");
        assert_eq!(status.text, "");
        assert!(!page.element("trigger-button-1").unwrap().disabled);
        assert_eq!(page.element("job-runtime-1").unwrap().text, "3s");
    }

    #[tokio::test]
    async fn missing_jobs_url_fails_without_touching_page() {
        let page = Arc::new(Mutex::new(MemoryPage::new().with_rows(["9"])));
        let poller = Poller::new(
            page.clone(),
            StubSource::new(Reply::Jobs(vec![record("9", "Stopped", "OK")])),
            PollerSettings::default(),
        );

        let outcome = poller.poll_once().await;
        match &outcome {
            CycleOutcome::Failed(e) => assert!(matches!(**e, PollError::MissingJobsUrl)),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(
            outcome.next_delay(poller.settings()),
            Duration::from_millis(10000)
        );
        assert_eq!(page.lock().await.element("job-status-9").unwrap().text, "");
    }

    #[tokio::test]
    async fn server_error_is_published_as_failed_event() {
        let page = page(&["3"]);
        let poller = Poller::new(
            page.clone(),
            StubSource::new(Reply::Status(503)),
            PollerSettings::default(),
        );
        let mut events = poller.subscribe();

        poller.poll_once().await;

        let event = events.recv().await.unwrap();
        assert!(event.outcome.is_failure());
        assert_eq!(event.next_delay, Duration::from_millis(10000));
    }

    #[test]
    fn outcome_delays_follow_settings() {
        let settings = PollerSettings::default();
        let updated = CycleOutcome::Updated {
            records: Vec::new(),
        };
        let resynced = CycleOutcome::Resynced {
            unknown_id: "1".to_string(),
            records: Vec::new(),
        };

        assert_eq!(updated.next_delay(&settings), Duration::from_millis(4000));
        assert_eq!(resynced.next_delay(&settings), Duration::from_millis(1000));
    }
}
