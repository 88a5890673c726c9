//! Runtime settings: defaults, an optional TOML file, then `LINKWATCH_*`
//! environment variables, in increasing precedence.
//!
//! ```toml
//! base_url = "http://radio-host:5000"
//! timeout_ms = 5000
//! poll_interval_ms = 2000
//! status_concurrency = 1
//! on_status_failure = "keep_stale"      # or "mark_unknown"
//! response_ordering = "last_arrival"    # or "latest_request"
//! ```

use std::path::Path;
use std::time::Duration;

use ::config::{Config, ConfigError, Environment, File};
use linkwatch_client::{FetchError, HttpClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::refresh::{RefreshOptions, StatusFailurePolicy};
use crate::store::ResponseOrdering;

/// Environment variable prefix, e.g. `LINKWATCH_BASE_URL`.
pub const ENV_PREFIX: &str = "LINKWATCH";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub status_concurrency: usize,
    pub on_status_failure: StatusFailurePolicy,
    pub response_ordering: ResponseOrdering,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            poll_interval_ms: 2000,
            status_concurrency: 1,
            on_status_failure: StatusFailurePolicy::default(),
            response_ordering: ResponseOrdering::default(),
        }
    }
}

impl Settings {
    /// Load settings, reading `path` if given. A named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SettingsError::Invalid {
                key: "base_url",
                reason: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        if self.timeout_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.status_concurrency == 0 {
            return Err(SettingsError::Invalid {
                key: "status_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_options(&self) -> RefreshOptions {
        RefreshOptions {
            concurrency: self.status_concurrency,
            on_failure: self.on_status_failure,
        }
    }

    /// Build the HTTP client these settings describe.
    pub fn http_client(&self) -> Result<HttpClient, FetchError> {
        HttpClient::builder()
            .base_url(self.base_url.as_str())
            .timeout(self.timeout())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert_eq!(settings.poll_interval(), Duration::from_secs(2));
        assert_eq!(settings.refresh_options(), RefreshOptions::default());
        assert_eq!(settings.response_ordering, ResponseOrdering::LastArrival);
        assert!(settings.validate().is_ok());
    }

    #[test]
    #[serial]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
            base_url = "http://radio-host:5000"
            timeout_ms = 2500
            status_concurrency = 4
            on_status_failure = "mark_unknown"
            response_ordering = "latest_request"
            "#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.base_url, "http://radio-host:5000");
        assert_eq!(settings.timeout(), Duration::from_millis(2500));
        assert_eq!(settings.poll_interval_ms, 2000);
        assert_eq!(
            settings.refresh_options(),
            RefreshOptions {
                concurrency: 4,
                on_failure: StatusFailurePolicy::MarkUnknown,
            }
        );
        assert_eq!(settings.response_ordering, ResponseOrdering::LatestRequest);
    }

    #[test]
    #[serial]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Settings::load(Some(path.as_path())),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    #[serial]
    fn rejects_unknown_policy() {
        let file = toml_file(r#"on_status_failure = "retry_forever""#);
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    #[serial]
    fn rejects_zero_concurrency() {
        let file = toml_file("status_concurrency = 0");
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                key: "status_concurrency",
                ..
            }
        ));
    }

    /// Sets `LINKWATCH_*` variables for the duration of a test.
    struct EnvGuard(Vec<&'static str>);

    impl EnvGuard {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self(vars.iter().map(|(key, _)| *key).collect())
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        let _env = EnvGuard::set(&[
            ("LINKWATCH_BASE_URL", "http://radio:5000"),
            ("LINKWATCH_STATUS_CONCURRENCY", "4"),
            ("LINKWATCH_ON_STATUS_FAILURE", "mark_unknown"),
        ]);

        let settings = Settings::load(None).unwrap();

        assert_eq!(settings.base_url, "http://radio:5000");
        assert_eq!(settings.status_concurrency, 4);
        assert_eq!(settings.on_status_failure, StatusFailurePolicy::MarkUnknown);
        assert_eq!(settings.timeout_ms, 10_000);
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let file = toml_file(
            r#"
            base_url = "http://from-file:5000"
            poll_interval_ms = 750
            "#,
        );
        let _env = EnvGuard::set(&[("LINKWATCH_BASE_URL", "http://from-env:5000")]);

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.base_url, "http://from-env:5000");
        assert_eq!(settings.poll_interval_ms, 750);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let settings = Settings {
            base_url: "radio-host:5000".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn http_client_uses_base_url() {
        let settings = Settings {
            base_url: "http://radio-host:5000/".to_string(),
            ..Default::default()
        };
        let client = settings.http_client().unwrap();
        assert_eq!(client.base_url(), "http://radio-host:5000");
    }
}
