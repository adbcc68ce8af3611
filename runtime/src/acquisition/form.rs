//! Direct form POST to the landing page.

use super::http_client::HttpClient;
use super::{landing_url, FetchError, Fetcher};
use crate::config::UpstreamSettings;
use crate::types::RegionKey;
use async_trait::async_trait;
use tracing::debug;

/// Name of the zip code input on the landing page form.
pub const ZIP_FIELD: &str = "number";

/// Warm up a session on the landing page, then post the zip code to it.
pub struct FormFetcher {
    client: HttpClient,
    landing: String,
}

impl FormFetcher {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(&settings.base_url, settings.timeout_ms)?,
            landing: landing_url(&settings.base_url),
        })
    }
}

#[async_trait]
impl Fetcher for FormFetcher {
    fn name(&self) -> &'static str {
        "form"
    }

    async fn fetch(&self, region: &RegionKey) -> Result<String, FetchError> {
        debug!("fetching landing page to establish session");
        self.client.get(&self.landing).await?;

        debug!(zipcode = %region, "submitting zip code");
        let resp = self
            .client
            .post_form(&self.landing, &[(ZIP_FIELD, region.as_str())], &[])
            .await?;

        Ok(resp.body)
    }
}
