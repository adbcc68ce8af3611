//! Chromium-based renderer using chromiumoxide.

use super::{NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Poll interval while waiting for a selector.
const SELECTOR_POLL_MS: u64 = 250;

/// Find the Chromium binary path.
///
/// `explicit` (from `OIL_CHROMIUM_PATH`) wins when it exists; then the
/// system PATH; then a Playwright browser cache, which is where Home
/// Assistant add-on images built for the scraper usually keep Chromium.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Explicit override
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // 2. System PATH
    for name in ["chromium", "chromium-browser", "google-chrome"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Playwright cache (~/.cache/ms-playwright/chromium-*/chrome-linux/chrome)
    if let Some(cache) = dirs::cache_dir() {
        if let Some(path) = find_in_playwright_cache(&cache.join("ms-playwright")) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

fn find_in_playwright_cache(root: &Path) -> Option<PathBuf> {
    let mut revisions: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("chromium-"))
                .unwrap_or(false)
        })
        .collect();
    // Newest revision last
    revisions.sort();

    revisions.into_iter().rev().find_map(|dir| {
        ["chrome-linux/chrome", "chrome-linux64/chrome"]
            .iter()
            .map(|rel| dir.join(rel))
            .find(|p| p.exists())
    })
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let chrome_path = find_chromium(explicit_path.as_deref())
            .context("Chromium not found. Install chromium or set OIL_CHROMIUM_PATH.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumContext { page }))
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;

                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("timed out after {timeout_ms}ms waiting for {selector}");
            }
            tokio::time::sleep(Duration::from_millis(SELECTOR_POLL_MS)).await;
        }
    }

    async fn type_and_submit(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("element {selector} not found"))?;

        element
            .click()
            .await
            .with_context(|| format!("failed to focus {selector}"))?;
        element
            .type_str(text)
            .await
            .with_context(|| format!("failed to type into {selector}"))?;
        element
            .press_key("Enter")
            .await
            .context("failed to press Enter")?;

        Ok(())
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok(html)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chrome");
        std::fs::write(&fake, b"").unwrap();
        assert_eq!(find_chromium(Some(fake.as_path())), Some(fake));
    }

    #[test]
    fn test_playwright_cache_prefers_newest_revision() {
        let dir = tempfile::tempdir().unwrap();
        for rev in ["chromium-1000", "chromium-1100"] {
            let bin = dir.path().join(rev).join("chrome-linux");
            std::fs::create_dir_all(&bin).unwrap();
            std::fs::write(bin.join("chrome"), b"").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("firefox-1400")).unwrap();

        let found = find_in_playwright_cache(dir.path()).unwrap();
        assert!(found.ends_with("chromium-1100/chrome-linux/chrome"));
    }

    #[test]
    fn test_playwright_cache_missing_root() {
        assert!(find_in_playwright_cache(Path::new("/nonexistent/ms-playwright")).is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_fill_form() {
        let renderer = ChromiumRenderer::new(None)
            .await
            .expect("failed to create renderer");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate(
            "data:text/html,<form><input id='number' name='number'></form>",
            10000,
        )
        .await
        .expect("navigation failed");

        ctx.wait_for_selector("input#number", 5000)
            .await
            .expect("input never appeared");
        ctx.type_and_submit("input#number", "06001")
            .await
            .expect("typing failed");

        let html = ctx.get_html().await.expect("get_html failed");
        assert!(html.contains("number"));

        ctx.close().await.expect("close failed");
    }
}
