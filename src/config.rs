use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::core::PollerSettings;
use crate::logging::LogConfig;

pub const DEFAULT_CONFIG_PATH: &str = "jobpoll.toml";
pub const ENV_PREFIX: &str = "JOBPOLL_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<String>,
    pub initial_delay_ms: u64,
    pub success_interval_ms: u64,
    pub failure_interval_ms: u64,
    /// No timeout unless set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = PollerSettings::default();
        Self {
            jobs_url: None,
            type_filter: None,
            initial_delay_ms: settings.initial_delay.as_millis() as u64,
            success_interval_ms: settings.success_interval.as_millis() as u64,
            failure_interval_ms: settings.failure_interval.as_millis() as u64,
            request_timeout_ms: None,
            verbose: false,
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Layer defaults, the TOML file at `path` (if any), `JOBPOLL_*`
    /// environment variables and finally `overrides`.
    pub fn load<T: Serialize>(path: &Path, overrides: Option<&T>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        figment.extract()
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            success_interval: Duration::from_millis(self.success_interval_ms),
            failure_interval: Duration::from_millis(self.failure_interval_ms),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            json: self.json_logs,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Overrides {
        #[serde(skip_serializing_if = "Option::is_none")]
        jobs_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        success_interval_ms: Option<u64>,
    }

    #[test]
    fn defaults_match_poller_timing() {
        figment::Jail::expect_with(|_jail| {
            let config = AppConfig::load::<Overrides>(Path::new("missing.toml"), None)?;

            assert_eq!(config.jobs_url, None);
            assert_eq!(config.poller_settings(), PollerSettings::default());
            assert_eq!(config.request_timeout(), None);
            Ok(())
        });
    }

    #[test]
    fn file_values_are_overridden_by_args() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "jobpoll.toml",
                r#"
                jobs_url = "http://file/internal/jobs"
                type_filter = "import"
                success_interval_ms = 2000
                request_timeout_ms = 500
                "#,
            )?;

            let overrides = Overrides {
                jobs_url: Some("http://cli/internal/jobs".to_string()),
                success_interval_ms: None,
            };
            let config = AppConfig::load(Path::new("jobpoll.toml"), Some(&overrides))?;

            assert_eq!(config.jobs_url.as_deref(), Some("http://cli/internal/jobs"));
            assert_eq!(config.type_filter.as_deref(), Some("import"));
            assert_eq!(config.success_interval_ms, 2000);
            assert_eq!(config.request_timeout(), Some(Duration::from_millis(500)));
            Ok(())
        });
    }

    #[test]
    fn env_sits_between_file_and_args() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "jobpoll.toml",
                "jobs_url = \"http://file/internal/jobs\"\nfailure_interval_ms = 1",
            )?;
            jail.set_env("JOBPOLL_FAILURE_INTERVAL_MS", "20000");
            jail.set_env("JOBPOLL_JOBS_URL", "http://env/internal/jobs");

            let overrides = Overrides {
                jobs_url: None,
                success_interval_ms: Some(100),
            };
            let config = AppConfig::load(Path::new("jobpoll.toml"), Some(&overrides))?;

            assert_eq!(config.jobs_url.as_deref(), Some("http://env/internal/jobs"));
            assert_eq!(config.failure_interval_ms, 20000);
            assert_eq!(config.success_interval_ms, 100);
            Ok(())
        });
    }

    #[test]
    fn serializes_to_toml() {
        let config = AppConfig {
            jobs_url: Some("http://host/internal/jobs".to_string()),
            ..Default::default()
        };

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("jobs_url = \"http://host/internal/jobs\""));
        assert!(!text.contains("type_filter"));
    }
}
