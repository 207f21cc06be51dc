//! Driver settings read from the environment

use crate::error::{ConfigError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254/metadata/v1";
pub const DEFAULT_LOG_FILE: &str = "/var/log/digitalocean-flex-volume.log";
pub const DEFAULT_LOG_FILTER: &str = "info";

const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 200;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Tunables of one driver invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    /// DigitalOcean API base URL (`DIGITALOCEAN_API_URL`)
    pub api_url: String,

    /// Droplet metadata base URL (`DIGITALOCEAN_METADATA_URL`)
    pub metadata_url: String,

    /// Deadline for an attach/detach action (`DOFLEX_ACTION_TIMEOUT_SECS`)
    pub action_timeout: Duration,

    /// Delay between action status checks (`DOFLEX_POLL_INTERVAL_SECS`)
    pub poll_interval: Duration,

    /// Per-request HTTP timeout (`DOFLEX_HTTP_TIMEOUT_SECS`)
    pub http_timeout: Duration,

    /// Log destination (`DOFLEX_LOG_FILE`)
    pub log_file: PathBuf,

    /// `EnvFilter` directives (`DOFLEX_LOG`)
    pub log_filter: String,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            action_timeout: Duration::from_secs(DEFAULT_ACTION_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DriverSettings {
    /// Defaults overridden by whichever variables are set
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_url: env_url("DIGITALOCEAN_API_URL", defaults.api_url),
            metadata_url: env_url("DIGITALOCEAN_METADATA_URL", defaults.metadata_url),
            action_timeout: env_secs("DOFLEX_ACTION_TIMEOUT_SECS", defaults.action_timeout)?,
            poll_interval: env_secs("DOFLEX_POLL_INTERVAL_SECS", defaults.poll_interval)?,
            http_timeout: env_secs("DOFLEX_HTTP_TIMEOUT_SECS", defaults.http_timeout)?,
            log_file: std::env::var_os("DOFLEX_LOG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            log_filter: env_string("DOFLEX_LOG", defaults.log_filter),
        })
    }
}

fn env_string(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default,
    }
}

fn env_url(name: &str, default: String) -> String {
    env_string(name, default).trim_end_matches('/').to_string()
}

fn env_secs(name: &str, default: Duration) -> Result<Duration> {
    let Ok(value) = std::env::var(name) else {
        return Ok(default);
    };

    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidSetting {
            name: name.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        })?;

    if secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            value,
            reason: "must be at least one second".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "DIGITALOCEAN_API_URL",
        "DIGITALOCEAN_METADATA_URL",
        "DOFLEX_ACTION_TIMEOUT_SECS",
        "DOFLEX_POLL_INTERVAL_SECS",
        "DOFLEX_HTTP_TIMEOUT_SECS",
        "DOFLEX_LOG_FILE",
        "DOFLEX_LOG",
    ];

    #[test]
    #[serial]
    fn test_defaults() {
        temp_env::with_vars_unset(VARS, || {
            let settings = DriverSettings::from_env().unwrap();
            assert_eq!(settings, DriverSettings::default());
            assert_eq!(settings.action_timeout, Duration::from_secs(200));
            assert_eq!(settings.poll_interval, Duration::from_secs(1));
        });
    }

    #[test]
    #[serial]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("DIGITALOCEAN_API_URL", Some("http://127.0.0.1:8080/")),
                ("DOFLEX_ACTION_TIMEOUT_SECS", Some("60")),
                ("DOFLEX_POLL_INTERVAL_SECS", Some(" 5 ")),
                ("DOFLEX_LOG_FILE", Some("/tmp/doflex.log")),
                ("DOFLEX_LOG", Some("debug")),
            ],
            || {
                let settings = DriverSettings::from_env().unwrap();
                assert_eq!(settings.api_url, "http://127.0.0.1:8080");
                assert_eq!(settings.metadata_url, DEFAULT_METADATA_URL);
                assert_eq!(settings.action_timeout, Duration::from_secs(60));
                assert_eq!(settings.poll_interval, Duration::from_secs(5));
                assert_eq!(settings.log_file, PathBuf::from("/tmp/doflex.log"));
                assert_eq!(settings.log_filter, "debug");
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_durations() {
        for bad in ["abc", "0", "-3"] {
            temp_env::with_var("DOFLEX_ACTION_TIMEOUT_SECS", Some(bad), || {
                let err = DriverSettings::from_env().unwrap_err();
                assert!(
                    matches!(
                        err,
                        ConfigError::InvalidSetting { ref name, .. }
                            if name == "DOFLEX_ACTION_TIMEOUT_SECS"
                    ),
                    "{bad}: {err}"
                );
            });
        }
    }
}
