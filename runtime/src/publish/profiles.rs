//! Hub connection profile discovery.
//!
//! The deployment environment is ambiguous (supervised add-on, container
//! next to the hub, bare host), so the publisher carries an ordered list of
//! base-URL/token pairs and uses the first one the hub accepts.

use crate::config::{HubSettings, TokenSource, DEFAULT_HUB_URLS};
use std::path::Path;
use tracing::debug;

/// One base URL paired with one bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub base_url: String,
    pub token: String,
    /// Where the token came from (env var name or file path).
    pub token_origin: String,
}

impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("base_url", &self.base_url)
            .field("token_origin", &self.token_origin)
            .field("token_len", &self.token.len())
            .finish()
    }
}

impl ConnectionProfile {
    /// State write URL for `entity_id` on this profile's hub.
    pub fn state_url(&self, entity_id: &str) -> String {
        format!("{}/api/states/{entity_id}", self.base_url.trim_end_matches('/'))
    }
}

/// Candidate base URLs: `HA_URL` first when set, then the defaults, without
/// duplicates.
pub fn candidate_urls(settings: &HubSettings) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let preferred = settings.preferred_url.iter().map(String::as_str);
    for url in preferred.chain(DEFAULT_HUB_URLS.iter().copied()) {
        let url = url.trim_end_matches('/').to_string();
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Tokens from the environment, then from each readable token file.
/// Empty values and duplicates are dropped.
pub fn discover_tokens(settings: &HubSettings) -> Vec<TokenSource> {
    let mut tokens: Vec<TokenSource> = Vec::new();

    let from_files = settings
        .token_files
        .iter()
        .filter_map(|path| read_token_file(path));

    for source in settings.env_tokens.iter().cloned().chain(from_files) {
        if source.token.is_empty() || tokens.iter().any(|t| t.token == source.token) {
            continue;
        }
        tokens.push(source);
    }

    tokens
}

fn read_token_file(path: &Path) -> Option<TokenSource> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(TokenSource {
            origin: path.display().to_string(),
            token: contents.trim().to_string(),
        }),
        Err(e) => {
            debug!(path = %path.display(), "token file unavailable: {e}");
            None
        }
    }
}

/// Cross every candidate URL with every token, URL-major.
pub fn build_profiles(settings: &HubSettings) -> Vec<ConnectionProfile> {
    let tokens = discover_tokens(settings);
    candidate_urls(settings)
        .into_iter()
        .flat_map(|base_url| {
            tokens.iter().map(move |t| ConnectionProfile {
                base_url: base_url.clone(),
                token: t.token.clone(),
                token_origin: t.origin.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn hub(preferred: Option<&str>, env: &[(&str, &str)], files: Vec<PathBuf>) -> HubSettings {
        HubSettings {
            preferred_url: preferred.map(str::to_string),
            env_tokens: env
                .iter()
                .map(|(o, t)| TokenSource {
                    origin: o.to_string(),
                    token: t.to_string(),
                })
                .collect(),
            token_files: files,
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_candidate_urls_default_order() {
        let urls = candidate_urls(&hub(None, &[], vec![]));
        assert_eq!(
            urls,
            vec![
                "http://supervisor/core",
                "http://homeassistant:8123",
                "http://localhost:8123",
                "http://127.0.0.1:8123",
            ]
        );
    }

    #[test]
    fn test_preferred_url_first_and_deduplicated() {
        let urls = candidate_urls(&hub(Some("http://localhost:8123/"), &[], vec![]));
        assert_eq!(urls[0], "http://localhost:8123");
        assert_eq!(urls.len(), 4);
    }

    #[test]
    fn test_tokens_from_env_and_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  file-token  ").unwrap();
        let missing = PathBuf::from("/nonexistent/SUPERVISOR_TOKEN");

        let settings = hub(
            None,
            &[("SUPERVISOR_TOKEN", "sup"), ("HA_TOKEN", "")],
            vec![missing, file.path().to_path_buf()],
        );
        let tokens = discover_tokens(&settings);
        let values: Vec<&str> = tokens.iter().map(|t| t.token.as_str()).collect();
        assert_eq!(values, vec!["sup", "file-token"]);
        assert_eq!(tokens[1].origin, file.path().display().to_string());
    }

    #[test]
    fn test_duplicate_tokens_collapse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "same").unwrap();
        let settings = hub(None, &[("SUPERVISOR_TOKEN", "same")], vec![file.path().to_path_buf()]);
        assert_eq!(discover_tokens(&settings).len(), 1);
    }

    #[test]
    fn test_profiles_are_url_major() {
        let settings = hub(
            Some("http://hub:8123"),
            &[("SUPERVISOR_TOKEN", "a"), ("HA_TOKEN", "b")],
            vec![],
        );
        let profiles = build_profiles(&settings);
        assert_eq!(profiles.len(), 10);
        assert_eq!(profiles[0].base_url, "http://hub:8123");
        assert_eq!(profiles[0].token, "a");
        assert_eq!(profiles[1].base_url, "http://hub:8123");
        assert_eq!(profiles[1].token, "b");
        assert_eq!(profiles[2].base_url, "http://supervisor/core");
    }

    #[test]
    fn test_no_tokens_no_profiles() {
        assert!(build_profiles(&hub(None, &[], vec![])).is_empty());
    }

    #[test]
    fn test_state_url_and_debug() {
        let p = ConnectionProfile {
            base_url: "http://supervisor/core/".into(),
            token: "hunter2".into(),
            token_origin: "SUPERVISOR_TOKEN".into(),
        };
        assert_eq!(
            p.state_url("sensor.heating_oil_price_06001"),
            "http://supervisor/core/api/states/sensor.heating_oil_price_06001"
        );
        assert!(!format!("{p:?}").contains("hunter2"));
    }
}
