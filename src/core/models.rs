use serde::{Deserialize, Deserializer, Serialize};

/// State reported for a job that has not finished yet.
pub const RUNNING_STATE: &str = "Running";

/// One entry of the jobs endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stopped: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub runtime: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_updated: String,

    // Only used by the terminal board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl JobRecord {
    pub fn is_running(&self) -> bool {
        self.state == RUNNING_STATE
    }

    pub fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }

    /// Page element id of the given kind for this job.
    pub fn element_id(&self, kind: ElementKind) -> String {
        kind.element_id(&self.id)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome code of a job once it has left the running state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Ok,
    Skipped,
    Error,
    Dead,
    Other(String),
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "OK" => Self::Ok,
            "SKIPPED" => Self::Skipped,
            "ERROR" => Self::Error,
            "DEAD" => Self::Dead,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::Skipped => "SKIPPED",
            Self::Error => "ERROR",
            Self::Dead => "DEAD",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-job elements a page provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Status,
    TriggerButton,
    Stopped,
    Runtime,
    LastUpdated,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        Self::Status,
        Self::TriggerButton,
        Self::Stopped,
        Self::Runtime,
        Self::LastUpdated,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Status => "job-status-",
            Self::TriggerButton => "trigger-button-",
            Self::Stopped => "job-stopped-",
            Self::Runtime => "job-runtime-",
            Self::LastUpdated => "job-last-updated-",
        }
    }

    pub fn element_id(&self, job_id: &str) -> String {
        format!("{}{}", self.prefix(), job_id)
    }
}

/// Poll target read from the jobs container on every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub jobs_url: String,
    pub type_filter: Option<String>,
}
