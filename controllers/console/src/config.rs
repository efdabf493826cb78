//! Console configuration from environment variables.

use crate::error::ConsoleError;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STATE_DIR: &str = ".ipam-console";
const DEFAULT_DEBOUNCE_MS: u64 = 400;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the IPAC REST API
    pub api_url: String,
    /// Per-request timeout
    pub api_timeout: Duration,
    /// Directory holding the persisted session/theme store
    pub state_dir: PathBuf,
    /// Quiet period before the IP conflict probe runs
    pub ip_check_debounce: Duration,
    /// Default rows per page on the hosts page
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            ip_check_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConsoleError> {
        let defaults = Self::default();
        let api_url = match lookup("IPAM_API_URL") {
            Some(raw) => normalize_api_url(&raw)?,
            None => defaults.api_url,
        };

        let api_timeout = match parse::<u64>(&lookup, "IPAM_API_TIMEOUT_SECS")? {
            Some(0) => {
                return Err(ConsoleError::InvalidConfig(
                    "IPAM_API_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.api_timeout,
        };

        let state_dir = lookup("IPAM_STATE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir);

        let ip_check_debounce = parse::<u64>(&lookup, "IPAM_IP_CHECK_DEBOUNCE_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.ip_check_debounce);

        let page_size = parse::<usize>(&lookup, "IPAM_PAGE_SIZE")?
            .unwrap_or(defaults.page_size)
            .max(1);

        Ok(Self {
            api_url,
            api_timeout,
            state_dir,
            ip_check_debounce,
            page_size,
        })
    }

    /// Replace the API URL, with the same checks as `IPAM_API_URL`
    pub fn with_api_url(self, raw: &str) -> Result<Self, ConsoleError> {
        Ok(Self {
            api_url: normalize_api_url(raw)?,
            ..self
        })
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConsoleError> {
    let url = raw.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConsoleError::InvalidConfig(format!("API URL must be an http(s) URL, got '{}'", url)))
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConsoleError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConsoleError::InvalidConfig(format!("{} must be a non-negative integer, got '{}': {}", key, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("IPAM_API_URL", "https://ipac.example/api/"),
            ("IPAM_API_TIMEOUT_SECS", "3"),
            ("IPAM_STATE_DIR", "/var/lib/ipac"),
            ("IPAM_IP_CHECK_DEBOUNCE_MS", " 250 "),
            ("IPAM_PAGE_SIZE", "0"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://ipac.example/api");
        assert_eq!(config.api_timeout, Duration::from_secs(3));
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/ipac"));
        assert_eq!(config.ip_check_debounce, Duration::from_millis(250));
        assert_eq!(config.page_size, 1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for vars in [
            [("IPAM_API_URL", "ftp://ipac")],
            [("IPAM_API_TIMEOUT_SECS", "0")],
            [("IPAM_PAGE_SIZE", "ten")],
        ] {
            let err = Config::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConsoleError::InvalidConfig(_)), "{vars:?}");
        }
    }

    #[test]
    fn flag_url_overrides_environment() {
        let config = Config::default().with_api_url(" http://10.0.0.5:8080/api// ").unwrap();
        assert_eq!(config.api_url, "http://10.0.0.5:8080/api");
        assert!(Config::default().with_api_url("10.0.0.5").is_err());
    }
}
