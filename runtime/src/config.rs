//! Environment-driven configuration.
//!
//! Everything is read once at startup. [`Settings::from_lookup`] takes an
//! arbitrary key lookup so tests never touch the process environment.

use crate::types::RegionKey;
use std::path::PathBuf;
use std::str::FromStr;

/// Default landing page of the upstream price site.
pub const DEFAULT_UPSTREAM_URL: &str = "https://www.codoil.com";

/// Default AJAX endpoint path, relative to the upstream URL.
pub const DEFAULT_AJAX_PATH: &str = "/ajax/zipcode";

/// Hub base URLs tried after `HA_URL`, in priority order.
pub const DEFAULT_HUB_URLS: &[&str] = &[
    "http://supervisor/core",
    "http://homeassistant:8123",
    "http://localhost:8123",
    "http://127.0.0.1:8123",
];

/// Well-known files that may hold a supervisor token.
pub const DEFAULT_TOKEN_FILES: &[&str] = &[
    "/var/run/secrets/SUPERVISOR_TOKEN",
    "/run/secrets/SUPERVISOR_TOKEN",
];

/// Environment variables that may hold a hub token, in priority order.
pub const TOKEN_ENV_VARS: &[&str] = &["SUPERVISOR_TOKEN", "HA_TOKEN"];

/// Configuration errors. All are fatal and raised before any network call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ZIPCODE not configured")]
    MissingRegionKey,

    #[error("no hub token available (set SUPERVISOR_TOKEN or HA_TOKEN)")]
    MissingToken,

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How the zip code is submitted upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Form POST to the landing page.
    #[default]
    Form,
    /// AJAX endpoint returning a redirect URL to follow.
    Ajax,
    /// Headless Chromium filling the form.
    Browser,
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(FetchMode::Form),
            "ajax" => Ok(FetchMode::Ajax),
            "browser" => Ok(FetchMode::Browser),
            other => Err(format!("expected form, ajax or browser, got '{other}'")),
        }
    }
}

impl FetchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Form => "form",
            FetchMode::Ajax => "ajax",
            FetchMode::Browser => "browser",
        }
    }
}

/// Upstream fetch parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub ajax_path: String,
    pub mode: FetchMode,
    pub timeout_ms: u64,
    pub browser_wait_ms: u64,
    pub chromium_path: Option<PathBuf>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            ajax_path: DEFAULT_AJAX_PATH.to_string(),
            mode: FetchMode::Form,
            timeout_ms: 30_000,
            browser_wait_ms: 10_000,
            chromium_path: None,
        }
    }
}

/// A hub token together with where it came from. The value itself is never
/// logged.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSource {
    pub origin: String,
    pub token: String,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSource")
            .field("origin", &self.origin)
            .field("len", &self.token.len())
            .finish()
    }
}

/// Hub connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct HubSettings {
    /// Explicit base URL from `HA_URL`, tried first.
    pub preferred_url: Option<String>,
    /// Tokens found in environment variables.
    pub env_tokens: Vec<TokenSource>,
    /// Files probed for additional tokens.
    pub token_files: Vec<PathBuf>,
    pub timeout_ms: u64,
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `None` when `ZIPCODE` is unset; checked by [`Settings::require_region`].
    pub region: Option<RegionKey>,
    pub log_level: String,
    pub upstream: UpstreamSettings,
    pub hub: HubSettings,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let region = get("ZIPCODE").and_then(|z| RegionKey::parse(&z));
        let log_level = match get("LOG_LEVEL") {
            Some(raw) => normalize_level(&raw).ok_or_else(|| ConfigError::InvalidValue {
                name: "LOG_LEVEL",
                value: raw.clone(),
                reason: "expected trace, debug, info, warning or error".to_string(),
            })?,
            None => "info",
        }
        .to_string();

        let mode = match get("FETCH_MODE") {
            Some(raw) => raw.parse::<FetchMode>().map_err(|reason| ConfigError::InvalidValue {
                name: "FETCH_MODE",
                value: raw,
                reason,
            })?,
            None => FetchMode::default(),
        };

        let defaults = UpstreamSettings::default();
        let upstream = UpstreamSettings {
            base_url: get("UPSTREAM_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            ajax_path: get("UPSTREAM_AJAX_PATH").unwrap_or(defaults.ajax_path),
            mode,
            timeout_ms: parse_ms(&get, "FETCH_TIMEOUT_MS", defaults.timeout_ms)?,
            browser_wait_ms: parse_ms(&get, "BROWSER_WAIT_MS", defaults.browser_wait_ms)?,
            chromium_path: get("OIL_CHROMIUM_PATH").map(PathBuf::from),
        };

        url::Url::parse(&upstream.base_url).map_err(|e| ConfigError::InvalidValue {
            name: "UPSTREAM_URL",
            value: upstream.base_url.clone(),
            reason: e.to_string(),
        })?;

        let env_tokens = TOKEN_ENV_VARS
            .iter()
            .filter_map(|name| {
                get(*name).map(|token| TokenSource {
                    origin: (*name).to_string(),
                    token: token.trim().to_string(),
                })
            })
            .collect();

        let hub = HubSettings {
            preferred_url: get("HA_URL").map(|u| u.trim().trim_end_matches('/').to_string()),
            env_tokens,
            token_files: DEFAULT_TOKEN_FILES.iter().map(PathBuf::from).collect(),
            timeout_ms: parse_ms(&get, "PUBLISH_TIMEOUT_MS", 10_000)?,
        };

        Ok(Self {
            region,
            log_level,
            upstream,
            hub,
        })
    }

    /// The region key, or [`ConfigError::MissingRegionKey`].
    pub fn require_region(&self) -> Result<&RegionKey, ConfigError> {
        self.region.as_ref().ok_or(ConfigError::MissingRegionKey)
    }
}

/// Map a log level name to a tracing level. Also accepts the
/// `warning` and `critical` spellings.
pub fn normalize_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" => Some("error"),
        _ => None,
    }
}

fn parse_ms<G>(get: &G, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue {
                name,
                value: raw,
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::from_lookup(lookup(&[("ZIPCODE", "06001")])).unwrap();
        assert_eq!(s.region.as_ref().unwrap().as_str(), "06001");
        assert_eq!(s.log_level, "info");
        assert_eq!(s.upstream.mode, FetchMode::Form);
        assert_eq!(s.upstream.base_url, "https://www.codoil.com");
        assert_eq!(s.upstream.timeout_ms, 30_000);
        assert_eq!(s.upstream.browser_wait_ms, 10_000);
        assert_eq!(s.hub.timeout_ms, 10_000);
        assert!(s.hub.preferred_url.is_none());
        assert!(s.hub.env_tokens.is_empty());
        assert_eq!(s.hub.token_files.len(), 2);
    }

    #[test]
    fn test_missing_zipcode_is_reported_on_demand() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.require_region(), Err(ConfigError::MissingRegionKey));

        let s = Settings::from_lookup(lookup(&[("ZIPCODE", "   ")])).unwrap();
        assert_eq!(s.require_region(), Err(ConfigError::MissingRegionKey));
    }

    #[test]
    fn test_tokens_in_priority_order() {
        let s = Settings::from_lookup(lookup(&[
            ("ZIPCODE", "06001"),
            ("HA_TOKEN", "long-lived"),
            ("SUPERVISOR_TOKEN", "supervisor"),
        ]))
        .unwrap();
        let origins: Vec<&str> = s.hub.env_tokens.iter().map(|t| t.origin.as_str()).collect();
        assert_eq!(origins, vec!["SUPERVISOR_TOKEN", "HA_TOKEN"]);
    }

    #[test]
    fn test_fetch_mode_parsing() {
        let s = Settings::from_lookup(lookup(&[("FETCH_MODE", "Browser")])).unwrap();
        assert_eq!(s.upstream.mode, FetchMode::Browser);

        let err = Settings::from_lookup(lookup(&[("FETCH_MODE", "carrier-pigeon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "FETCH_MODE", .. }));
    }

    #[test]
    fn test_log_level_normalization() {
        let s = Settings::from_lookup(lookup(&[("LOG_LEVEL", "WARNING")])).unwrap();
        assert_eq!(s.log_level, "warn");
        let s = Settings::from_lookup(lookup(&[("LOG_LEVEL", "Debug")])).unwrap();
        assert_eq!(s.log_level, "debug");
        let err = Settings::from_lookup(lookup(&[("LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "LOG_LEVEL", .. }));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = Settings::from_lookup(lookup(&[("FETCH_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "FETCH_TIMEOUT_MS", .. }));
    }

    #[test]
    fn test_urls_lose_trailing_slash() {
        let s = Settings::from_lookup(lookup(&[
            ("UPSTREAM_URL", "http://127.0.0.1:9000/"),
            ("HA_URL", "http://hub.local:8123/"),
        ]))
        .unwrap();
        assert_eq!(s.upstream.base_url, "http://127.0.0.1:9000");
        assert_eq!(s.hub.preferred_url.as_deref(), Some("http://hub.local:8123"));
    }

    #[test]
    fn test_token_debug_hides_value() {
        let t = TokenSource {
            origin: "HA_TOKEN".into(),
            token: "secret-value".into(),
        };
        let dbg = format!("{t:?}");
        assert!(!dbg.contains("secret-value"));
        assert!(dbg.contains("len: 12"));
    }
}
