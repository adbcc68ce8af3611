//! Upstream acquisition: turn a zip code into a response body.
//!
//! The upstream form protocol has changed over time, so each interaction
//! style is its own [`Fetcher`]:
//!
//! - [`form::FormFetcher`] posts the zip code to the landing page.
//! - [`ajax::AjaxFetcher`] posts to an AJAX endpoint and follows the
//!   redirect URL it returns.
//! - [`browser::BrowserFetcher`] drives headless Chromium through the form.

pub mod ajax;
pub mod browser;
pub mod form;
pub mod http_client;

use crate::config::{FetchMode, UpstreamSettings};
use crate::renderer::chromium::ChromiumRenderer;
use crate::types::RegionKey;
use async_trait::async_trait;

/// Fetch failures.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("blocked by upstream (HTTP 403) at {url}")]
    Blocked { url: String },

    #[error("upstream returned HTTP {status} at {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed redirect response: {0}")]
    MalformedRedirect(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("browser error: {0}")]
    Browser(String),
}

/// One upstream interaction style.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Submit `region` upstream and return the body expected to hold the price.
    async fn fetch(&self, region: &RegionKey) -> Result<String, FetchError>;
}

/// Build the fetcher selected by `settings.mode`. Browser mode launches
/// Chromium here.
pub async fn build_fetcher(settings: &UpstreamSettings) -> Result<Box<dyn Fetcher>, FetchError> {
    let fetcher: Box<dyn Fetcher> = match settings.mode {
        FetchMode::Form => Box::new(form::FormFetcher::new(settings)?),
        FetchMode::Ajax => Box::new(ajax::AjaxFetcher::new(settings)?),
        FetchMode::Browser => {
            let renderer = ChromiumRenderer::new(settings.chromium_path.clone())
                .await
                .map_err(|e| FetchError::Browser(format!("{e:#}")))?;
            Box::new(browser::BrowserFetcher::new(Box::new(renderer), settings))
        }
    };
    Ok(fetcher)
}

/// Landing page URL for a base URL, always with a trailing slash.
pub(crate) fn landing_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_url() {
        assert_eq!(landing_url("https://www.codoil.com"), "https://www.codoil.com/");
        assert_eq!(landing_url("https://www.codoil.com/"), "https://www.codoil.com/");
    }

    #[tokio::test]
    async fn test_build_http_fetchers() {
        let mut settings = UpstreamSettings::default();
        assert_eq!(build_fetcher(&settings).await.unwrap().name(), "form");

        settings.mode = FetchMode::Ajax;
        assert_eq!(build_fetcher(&settings).await.unwrap().name(), "ajax");
    }
}
