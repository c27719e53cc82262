use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{ClientError, Result};

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_DATA_DIR: &str = ".ai-mall";

/// Client configuration, read from the environment (with `.env` support in the binary).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin every endpoint path is appended to
    pub api_base_url: String,

    /// Directory holding the persistent local storage file
    pub data_dir: PathBuf,

    /// Refetch period for the open conversation
    pub chat_poll_interval: Duration,

    /// Refetch period for the notification bell
    pub notification_poll_interval: Duration,

    /// Refetch period for vendor/admin support inboxes
    pub inbox_poll_interval: Duration,

    /// Refetch period for an open support ticket thread
    pub report_poll_interval: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            chat_poll_interval: Duration::from_secs(5),
            notification_poll_interval: Duration::from_secs(30),
            inbox_poll_interval: Duration::from_secs(5),
            report_poll_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = lookup("AI_MALL_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if api_base_url.is_empty() {
            return Err(ClientError::Config("AI_MALL_API_URL must not be empty".into()));
        }

        let data_dir = lookup("AI_MALL_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);

        Ok(Self {
            api_base_url,
            data_dir,
            chat_poll_interval: secs(&lookup, "AI_MALL_CHAT_POLL_SECS", defaults.chat_poll_interval)?,
            notification_poll_interval: secs(
                &lookup,
                "AI_MALL_NOTIFICATION_POLL_SECS",
                defaults.notification_poll_interval,
            )?,
            inbox_poll_interval: secs(&lookup, "AI_MALL_INBOX_POLL_SECS", defaults.inbox_poll_interval)?,
            report_poll_interval: secs(&lookup, "AI_MALL_REPORT_POLL_SECS", defaults.report_poll_interval)?,
            request_timeout: secs(&lookup, "AI_MALL_REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
        })
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Result<Duration> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ClientError::Config(format!("{key} must be greater than zero"))),
        Ok(n) => Ok(Duration::from_secs(n)),
        Err(_) => Err(ClientError::Config(format!("{key} must be a number of seconds, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.chat_poll_interval, Duration::from_secs(5));
        assert_eq!(config.notification_poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("AI_MALL_API_URL", "https://api.example.com/v1/"),
            ("AI_MALL_CHAT_POLL_SECS", "2"),
            ("AI_MALL_DATA_DIR", "/tmp/mall"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/v1");
        assert_eq!(config.chat_poll_interval, Duration::from_secs(2));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mall"));
    }

    #[test]
    fn bad_intervals_are_rejected() {
        let zero = ClientConfig::from_lookup(lookup_from(&[("AI_MALL_CHAT_POLL_SECS", "0")]));
        assert!(matches!(zero, Err(ClientError::Config(_))));

        let junk = ClientConfig::from_lookup(lookup_from(&[("AI_MALL_INBOX_POLL_SECS", "soon")]));
        assert!(matches!(junk, Err(ClientError::Config(_))));
    }
}
