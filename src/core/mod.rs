pub mod models;
pub mod page;
pub mod poller;
pub mod source;
pub mod styles;

pub use models::{ElementKind, JobRecord, JobStatus, PollConfig};
pub use page::{JOBS_URL_ATTR, Page, TYPE_FILTER_ATTR};
pub use poller::{CycleOutcome, PollEvent, Poller, PollerHandle, PollerSettings};
pub use source::{HttpJobSource, JobSource, PollError};
pub use styles::{StatusStyle, status_style};
