//! Command-line arguments

use std::time::Duration;

use clap::Parser;
use dsm_client::{DsmConfig, DEFAULT_API_VERSION, DEFAULT_SESSION_NAME};

/// MCP server for Synology DSM File Station
#[derive(Parser, Debug)]
#[command(name = "dsm-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// DSM base URL, e.g. https://nas.local:5001
    pub base_url: String,

    /// DSM account name
    pub account: String,

    /// DSM account password
    pub password: String,

    /// SYNO.API.Auth version used for login
    #[arg(default_value_t = DEFAULT_API_VERSION)]
    pub api_version: u32,

    /// Validate the NAS TLS certificate (self-signed certificates are accepted otherwise)
    #[arg(long)]
    pub verify_tls: bool,

    /// Session scope sent at login
    #[arg(long, default_value = DEFAULT_SESSION_NAME)]
    pub session_name: String,

    /// Delay between background task status checks, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Give up on a search or move after this many seconds
    #[arg(long, default_value_t = 120)]
    pub search_timeout_secs: u64,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Cli {
    pub fn into_config(self) -> DsmConfig {
        let mut config = DsmConfig::new(self.base_url, self.account, self.password)
            .with_api_version(self.api_version)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_task_timeout(Duration::from_secs(self.search_timeout_secs));
        config.session_name = self.session_name;
        config.verify_tls = self.verify_tls;
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_and_defaults() {
        let cli = Cli::try_parse_from(["dsm-mcp", "https://nas.local:5001", "admin", "pw"]).unwrap();
        assert_eq!(cli.api_version, 7);

        let config = cli.into_config();
        assert_eq!(config.base_url, "https://nas.local:5001");
        assert_eq!(config.session_name, "FileStation");
        assert!(!config.verify_tls);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.task_timeout, Duration::from_secs(120));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "dsm-mcp",
            "http://10.0.0.2:5000",
            "backup",
            "pw",
            "6",
            "--verify-tls",
            "--poll-interval-ms",
            "250",
            "--request-timeout-secs",
            "5",
        ])
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.api_version, 6);
        assert!(config.verify_tls);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_password_is_rejected() {
        assert!(Cli::try_parse_from(["dsm-mcp", "https://nas.local", "admin"]).is_err());
    }
}
