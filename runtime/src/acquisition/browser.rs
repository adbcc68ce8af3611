//! Headless-browser form submission.
//!
//! Some upstream revisions only render the price client-side, so this
//! strategy fills the zip code input in a real browser, presses Enter, and
//! waits a fixed delay before reading back the rendered HTML.

use super::{landing_url, FetchError, Fetcher};
use crate::config::UpstreamSettings;
use crate::renderer::{RenderContext, Renderer};
use crate::types::RegionKey;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// CSS selector of the zip code input on the landing page.
pub const ZIP_INPUT_SELECTOR: &str = "input#number";

/// How long to wait for the zip code input to appear.
const INPUT_WAIT_MS: u64 = 30_000;

/// Drive a renderer through the landing page form.
pub struct BrowserFetcher {
    renderer: Box<dyn Renderer>,
    landing: String,
    nav_timeout_ms: u64,
    render_wait_ms: u64,
}

impl BrowserFetcher {
    pub fn new(renderer: Box<dyn Renderer>, settings: &UpstreamSettings) -> Self {
        Self {
            renderer,
            landing: landing_url(&settings.base_url),
            nav_timeout_ms: settings.timeout_ms.max(60_000),
            render_wait_ms: settings.browser_wait_ms,
        }
    }

    async fn drive(
        &self,
        ctx: &mut dyn RenderContext,
        region: &RegionKey,
    ) -> anyhow::Result<String> {
        debug!(url = %self.landing, "navigating");
        let nav = ctx.navigate(&self.landing, self.nav_timeout_ms).await?;
        debug!(final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "page loaded");

        debug!("waiting for zip code input");
        ctx.wait_for_selector(ZIP_INPUT_SELECTOR, INPUT_WAIT_MS)
            .await?;

        debug!(zipcode = %region, "entering zip code");
        ctx.type_and_submit(ZIP_INPUT_SELECTOR, region.as_str())
            .await?;

        debug!(wait_ms = self.render_wait_ms, "waiting for results to render");
        tokio::time::sleep(Duration::from_millis(self.render_wait_ms)).await;

        ctx.get_html().await
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, region: &RegionKey) -> Result<String, FetchError> {
        let mut ctx = self
            .renderer
            .new_context()
            .await
            .map_err(|e| FetchError::Browser(format!("{e:#}")))?;

        let result = self.drive(ctx.as_mut(), region).await;

        if let Err(e) = ctx.close().await {
            warn!("failed to close browser context: {e:#}");
        }

        result.map_err(|e| FetchError::Browser(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NavigationResult;
    use anyhow::{bail, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Renderer that records what was typed and returns canned HTML.
    struct FakeRenderer {
        typed: Arc<Mutex<Vec<String>>>,
        open: Arc<AtomicUsize>,
        has_input: bool,
        html: String,
    }

    struct FakeContext {
        typed: Arc<Mutex<Vec<String>>>,
        open: Arc<AtomicUsize>,
        has_input: bool,
        html: String,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeContext {
                typed: Arc::clone(&self.typed),
                open: Arc::clone(&self.open),
                has_input: self.has_input,
                html: self.html.clone(),
            }))
        }
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }
        async fn wait_for_selector(&self, selector: &str, _timeout_ms: u64) -> Result<()> {
            if self.has_input {
                Ok(())
            } else {
                bail!("timed out waiting for {selector}")
            }
        }
        async fn type_and_submit(&self, selector: &str, text: &str) -> Result<()> {
            self.typed
                .lock()
                .unwrap()
                .push(format!("{selector}={text}"));
            Ok(())
        }
        async fn get_html(&self) -> Result<String> {
            Ok(self.html.clone())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            self.open.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fetcher(has_input: bool) -> (BrowserFetcher, Arc<Mutex<Vec<String>>>, Arc<AtomicUsize>) {
        let typed = Arc::new(Mutex::new(Vec::new()));
        let open = Arc::new(AtomicUsize::new(0));
        let renderer = FakeRenderer {
            typed: Arc::clone(&typed),
            open: Arc::clone(&open),
            has_input,
            html: "<div>$2.89<sup>9</sup></div>".to_string(),
        };
        let settings = UpstreamSettings {
            browser_wait_ms: 0,
            ..UpstreamSettings::default()
        };
        (
            BrowserFetcher::new(Box::new(renderer), &settings),
            typed,
            open,
        )
    }

    #[tokio::test]
    async fn test_fills_zip_and_returns_rendered_html() {
        let (f, typed, open) = fetcher(true);
        let region = RegionKey::parse("06001").unwrap();

        let html = f.fetch(&region).await.unwrap();
        assert!(html.contains("<sup>9</sup>"));
        assert_eq!(*typed.lock().unwrap(), vec!["input#number=06001".to_string()]);
        assert_eq!(open.load(Ordering::SeqCst), 0, "context must be closed");
    }

    #[tokio::test]
    async fn test_missing_input_is_browser_error_and_closes_context() {
        let (f, typed, open) = fetcher(false);
        let region = RegionKey::parse("06001").unwrap();

        let err = f.fetch(&region).await.unwrap_err();
        assert!(matches!(err, FetchError::Browser(ref m) if m.contains("input#number")));
        assert!(typed.lock().unwrap().is_empty());
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }
}
