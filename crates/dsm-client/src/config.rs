//! Connection settings for a DSM host

use reqwest::Url;
use secrecy::SecretString;
use std::time::Duration;

use crate::DsmError;

pub const DEFAULT_API_VERSION: u32 = 7;
pub const DEFAULT_SESSION_NAME: &str = "FileStation";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SEARCH_RESULT_LIMIT: u32 = 500;

#[derive(Debug, Clone)]
pub struct DsmConfig {
    /// Base URL of the DSM host, e.g. `https://nas.local:5001`
    pub base_url: String,
    pub account: String,
    pub password: SecretString,
    /// Version requested from `SYNO.API.Auth`
    pub api_version: u32,
    /// Session scope sent at login
    pub session_name: String,
    /// Validate the host's TLS certificate. Off by default since most NAS
    /// units serve a self-signed certificate.
    pub verify_tls: bool,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// Upper bound for background tasks (search, copy/move)
    pub task_timeout: Duration,
    pub search_result_limit: u32,
}

impl DsmConfig {
    pub fn new(
        base_url: impl Into<String>,
        account: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            account: account.into(),
            password: SecretString::from(password.into()),
            api_version: DEFAULT_API_VERSION,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            verify_tls: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            task_timeout: DEFAULT_TASK_TIMEOUT,
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
        }
    }

    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), DsmError> {
        if self.account.trim().is_empty() {
            return Err(DsmError::Configuration("account must not be empty".into()));
        }
        if self.api_version == 0 {
            return Err(DsmError::Configuration(
                "API version must be a positive integer".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(DsmError::Configuration(
                "poll interval must be greater than zero".into(),
            ));
        }
        self.webapi_base().map(|_| ())
    }

    /// `<base_url>/webapi/`, the directory holding `auth.cgi` and `entry.cgi`.
    pub(crate) fn webapi_base(&self) -> Result<Url, DsmError> {
        let trimmed = self.base_url.trim();
        if trimmed.is_empty() {
            return Err(DsmError::Configuration("base URL must not be empty".into()));
        }

        let url = Url::parse(&format!("{}/webapi/", trimmed.trim_end_matches('/')))
            .map_err(|e| DsmError::Configuration(format!("invalid base URL '{}': {}", trimmed, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DsmError::Configuration(format!(
                "unsupported URL scheme '{}', expected http or https",
                other
            ))),
        }
    }
}
