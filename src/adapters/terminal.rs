//! Job board rendered to a terminal.
//!
//! The board plays the part of the server-rendered jobs page: it lays out one
//! row per job from a job list, lets the poller mutate the rows, and prints
//! the table. A reload drops every row; the host lays them out again from the
//! records that caused the resync.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::Mutex;

use super::memory::MemoryPage;
use crate::core::models::{ElementKind, JobRecord};
use crate::core::page::{JOBS_URL_ATTR, Page, TYPE_FILTER_ATTR};
use crate::core::poller::{CycleOutcome, Poller};
use crate::core::source::{JobSource, PollError};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("error polling job status: {0}")]
    Poll(Arc<PollError>),
    #[error("job list changed while laying out the board (job {0} has no row)")]
    Unsettled(String),
}

struct Row {
    job_id: String,
    job_type: String,
}

pub struct TerminalBoard {
    page: MemoryPage,
    rows: Vec<Row>,
}

impl TerminalBoard {
    pub fn new(jobs_url: &str, type_filter: Option<&str>) -> Self {
        let mut page = MemoryPage::new().with_attribute(JOBS_URL_ATTR, jobs_url);
        if let Some(filter) = type_filter {
            page.set_attribute(TYPE_FILTER_ATTR, filter);
        }

        Self {
            page,
            rows: Vec::new(),
        }
    }

    /// Change the job type filter. Takes effect on the next cycle.
    pub fn set_type_filter(&mut self, type_filter: Option<&str>) {
        match type_filter {
            Some(filter) => self.page.set_attribute(TYPE_FILTER_ATTR, filter),
            None => self.page.remove_attribute(TYPE_FILTER_ATTR),
        }
    }

    /// Lay out one row per record, replacing any existing rows.
    pub fn render_rows(&mut self, records: &[JobRecord]) {
        self.page.clear_rows();
        self.rows.clear();

        for record in records {
            self.page.add_row(&record.id);

            let status_id = record.element_id(ElementKind::Status);
            if record.is_running() {
                self.page.set_text(&status_id, &record.state);
            } else {
                self.page.set_text(&status_id, &record.status);
                self.page
                    .set_disabled(&record.element_id(ElementKind::TriggerButton), false);
            }
            self.page
                .set_text(&record.element_id(ElementKind::Stopped), &record.stopped);
            self.page
                .set_text(&record.element_id(ElementKind::Runtime), &record.runtime);
            self.page.set_text(
                &record.element_id(ElementKind::LastUpdated),
                &record.last_updated,
            );

            self.rows.push(Row {
                job_id: record.id.clone(),
                job_type: record.job_type.clone().unwrap_or_default(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn page(&self) -> &MemoryPage {
        &self.page
    }

    /// Print the board as a table.
    pub fn render<W: Write>(&self, out: &mut W, polled_at: DateTime<Utc>) -> io::Result<()> {
        writeln!(
            out,
            "Jobs (polled at {})",
            polled_at.with_timezone(&Local).format("%H:%M:%S")
        )?;
        writeln!(
            out,
            "{:<38} {:<24} {:<10} {:<10} {:<10} {:<10} {}",
            "ID", "TYPE", "STATUS", "STOPPED", "RUNTIME", "UPDATED", "TRIGGER"
        )?;

        for row in &self.rows {
            let trigger = match self
                .page
                .element(&ElementKind::TriggerButton.element_id(&row.job_id))
            {
                Some(e) if !e.disabled => "ready",
                _ => "-",
            };

            writeln!(
                out,
                "{:<38} {:<24} {:<10} {:<10} {:<10} {:<10} {}",
                row.job_id,
                row.job_type,
                self.text(ElementKind::Status, &row.job_id),
                self.text(ElementKind::Stopped, &row.job_id),
                self.text(ElementKind::Runtime, &row.job_id),
                self.text(ElementKind::LastUpdated, &row.job_id),
                trigger
            )?;
        }

        Ok(())
    }

    fn text(&self, kind: ElementKind, job_id: &str) -> &str {
        self.page
            .element(&kind.element_id(job_id))
            .map(|e| e.text.as_str())
            .unwrap_or("")
    }
}

/// Poll until the board shows every job of the list.
///
/// An empty or stale board resyncs on the first cycle; the rows are laid out
/// from that response and polled once more. A second resync means the list
/// changed in between and is reported as [`BoardError::Unsettled`].
pub async fn poll_settled<S>(
    poller: &Poller<TerminalBoard, S>,
    board: &Mutex<TerminalBoard>,
) -> Result<Vec<JobRecord>, BoardError>
where
    S: JobSource + 'static,
{
    let mut outcome = poller.poll_once().await;
    if let CycleOutcome::Resynced { records, .. } = &outcome {
        board.lock().await.render_rows(records);
        outcome = poller.poll_once().await;
    }

    match outcome {
        CycleOutcome::Updated { records } => Ok(records),
        CycleOutcome::Resynced { unknown_id, .. } => Err(BoardError::Unsettled(unknown_id)),
        CycleOutcome::Failed(e) => Err(BoardError::Poll(e)),
    }
}

impl Page for TerminalBoard {
    fn data_attribute(&self, name: &str) -> Option<String> {
        self.page.data_attribute(name)
    }

    fn contains(&self, element_id: &str) -> bool {
        self.page.contains(element_id)
    }

    fn set_class(&mut self, element_id: &str, class: &str) {
        self.page.set_class(element_id, class);
    }

    fn set_style(&mut self, element_id: &str, style: &str) {
        self.page.set_style(element_id, style);
    }

    fn set_text(&mut self, element_id: &str, text: &str) {
        self.page.set_text(element_id, text);
    }

    fn set_disabled(&mut self, element_id: &str, disabled: bool) {
        self.page.set_disabled(element_id, disabled);
    }

    fn reload(&mut self) {
        self.page.reload();
        self.page.clear_rows();
        self.rows.clear();
    }
}
