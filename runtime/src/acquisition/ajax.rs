//! AJAX endpoint submission.
//!
//! The endpoint answers the zip code with a small JSON document naming the
//! results page, e.g. `{"redirect": "/prices/06001"}`. That URL is resolved
//! against the upstream base and fetched with the same session.

use super::http_client::HttpClient;
use super::{landing_url, FetchError, Fetcher};
use crate::config::UpstreamSettings;
use crate::types::RegionKey;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Form field carrying the zip code to the AJAX endpoint.
pub const AJAX_ZIP_FIELD: &str = "zipcode";

/// Keys that may hold the redirect target, in lookup order.
const REDIRECT_KEYS: &[&str] = &["redirect", "redirect_url", "url"];

/// Post the zip code to the AJAX endpoint and follow the returned URL.
pub struct AjaxFetcher {
    client: HttpClient,
    base: Url,
    landing: String,
    endpoint: String,
}

impl AjaxFetcher {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, FetchError> {
        let landing = landing_url(&settings.base_url);
        let base = Url::parse(&landing)
            .map_err(|e| FetchError::InvalidUrl(format!("{landing}: {e}")))?;
        let endpoint = base
            .join(&settings.ajax_path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", settings.ajax_path)))?
            .to_string();

        Ok(Self {
            client: HttpClient::new(&settings.base_url, settings.timeout_ms)?,
            base,
            landing,
            endpoint,
        })
    }
}

#[async_trait]
impl Fetcher for AjaxFetcher {
    fn name(&self) -> &'static str {
        "ajax"
    }

    async fn fetch(&self, region: &RegionKey) -> Result<String, FetchError> {
        debug!("fetching landing page to establish session");
        self.client.get(&self.landing).await?;

        debug!(zipcode = %region, endpoint = %self.endpoint, "posting zip code to AJAX endpoint");
        let reply = self
            .client
            .post_form(
                &self.endpoint,
                &[(AJAX_ZIP_FIELD, region.as_str())],
                &[
                    ("x-requested-with", "XMLHttpRequest"),
                    ("accept", "application/json, text/javascript, */*; q=0.01"),
                ],
            )
            .await?;

        let target = parse_redirect(&reply.body, &self.base)?;
        debug!(target = %target, "following redirect");

        let page = self.client.get(target.as_str()).await?;
        Ok(page.body)
    }
}

/// Pull the redirect target out of an AJAX reply and resolve it against
/// `base`. Accepts an object with one of the known keys or a bare JSON
/// string.
pub fn parse_redirect(body: &str, base: &Url) -> Result<Url, FetchError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| FetchError::MalformedRedirect(format!("reply is not JSON: {e}")))?;

    let target = match &value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => REDIRECT_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str)),
        _ => None,
    }
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or_else(|| {
        FetchError::MalformedRedirect(format!(
            "no redirect URL in reply (expected one of {REDIRECT_KEYS:?})"
        ))
    })?;

    base.join(target)
        .map_err(|e| FetchError::MalformedRedirect(format!("bad redirect URL {target:?}: {e}")))
}
