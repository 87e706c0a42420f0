use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::models::{JobRecord, PollConfig};

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Reasons a poll cycle could not produce a job list. All are transient.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("jobs container has no jobs-url")]
    MissingJobsUrl,
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("could not decode job list: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Where job status comes from.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(&self, config: &PollConfig) -> Result<Vec<JobRecord>, PollError>;
}

/// Fetches the job list from the jobs endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpJobSource {
    client: reqwest::Client,
}

impl Default for HttpJobSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpJobSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build a source whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn request(&self, config: &PollConfig) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(&config.jobs_url)
            .header(ACCEPT, JSON_UTF8)
            .header(CONTENT_TYPE, JSON_UTF8);

        if let Some(filter) = &config.type_filter {
            request = request.query(&[("typeFilter", filter.as_str()), ("humanReadable", "true")]);
        }

        request
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    async fn fetch(&self, config: &PollConfig) -> Result<Vec<JobRecord>, PollError> {
        let response = self
            .request(config)
            .send()
            .await
            .map_err(PollError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        response
            .json::<Vec<JobRecord>>()
            .await
            .map_err(PollError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(type_filter: Option<&str>) -> PollConfig {
        PollConfig {
            jobs_url: "http://localhost:8080/internal/jobs".to_string(),
            type_filter: type_filter.map(str::to_string),
        }
    }

    #[test]
    fn request_without_filter_has_no_query() {
        let source = HttpJobSource::new();
        let request = source.request(&config(None)).build().unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8080/internal/jobs");
        assert_eq!(request.headers()[ACCEPT], JSON_UTF8);
        assert_eq!(request.headers()[CONTENT_TYPE], JSON_UTF8);
    }

    #[test]
    fn request_with_filter_asks_for_human_readable_times() {
        let source = HttpJobSource::new();
        let request = source.request(&config(Some("import"))).build().unwrap();

        assert_eq!(
            request.url().query(),
            Some("typeFilter=import&humanReadable=true")
        );
    }

    #[test]
    fn filter_value_is_url_encoded() {
        let source = HttpJobSource::new();
        let request = source.request(&config(Some("a b&c"))).build().unwrap();

        assert_eq!(
            request.url().query(),
            Some("typeFilter=a+b%26c&humanReadable=true")
        );
    }
}
