//! Environment readiness check.

use crate::cli::output;
use crate::config::{ConfigError, FetchMode, Settings, TokenSource};
use crate::publish::profiles::{candidate_urls, discover_tokens};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::PathBuf;

/// What the doctor found.
#[derive(Debug)]
pub struct Readiness {
    pub tokens: Vec<TokenSource>,
    pub hub_urls: Vec<String>,
    pub chromium: Option<PathBuf>,
    pub needs_chromium: bool,
    pub ready: bool,
}

impl Readiness {
    /// Ready means a zip code, at least one hub token, and Chromium when the
    /// fetch mode needs it.
    pub fn check(settings: &Settings) -> Self {
        let tokens = discover_tokens(&settings.hub);
        let hub_urls = candidate_urls(&settings.hub);
        let chromium = find_chromium(settings.upstream.chromium_path.as_deref());
        let needs_chromium = settings.upstream.mode == FetchMode::Browser;

        let ready = settings.region.is_some()
            && !tokens.is_empty()
            && (!needs_chromium || chromium.is_some());

        Self {
            tokens,
            hub_urls,
            chromium,
            needs_chromium,
            ready,
        }
    }
}

/// Print the readiness report. Returns whether the environment is ready, so
/// the caller can exit non-zero.
pub async fn run(settings: &Result<Settings, ConfigError>) -> Result<bool> {
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "ready": false,
                    "config_error": e.to_string(),
                }));
            } else {
                println!("Oil Price Sensor Doctor");
                println!("=======================");
                println!();
                println!("[!!] Configuration error: {e}");
                println!();
                println!("Status: NOT READY");
            }
            return Ok(false);
        }
    };

    let r = Readiness::check(settings);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "ready": r.ready,
            "zipcode": settings.region.as_ref().map(|z| z.as_str()),
            "fetch_mode": settings.upstream.mode.as_str(),
            "upstream_url": settings.upstream.base_url,
            "tokens": r.tokens
                .iter()
                .map(|t| serde_json::json!({ "origin": t.origin, "length": t.token.len() }))
                .collect::<Vec<_>>(),
            "hub_urls": r.hub_urls,
            "chromium": r.chromium.as_ref().map(|p| p.display().to_string()),
        }));
        return Ok(r.ready);
    }

    println!("Oil Price Sensor Doctor");
    println!("=======================");
    println!();

    match &settings.region {
        Some(region) => println!("[OK] ZIPCODE: {region} (entity {})", region.entity_id()),
        None => println!("[!!] ZIPCODE is not set"),
    }

    println!(
        "[OK] Fetch mode: {} ({})",
        settings.upstream.mode.as_str(),
        settings.upstream.base_url
    );

    if r.tokens.is_empty() {
        println!("[!!] No hub token found (SUPERVISOR_TOKEN, HA_TOKEN or token file)");
    } else {
        for t in &r.tokens {
            println!("[OK] Token from {} ({} chars)", t.origin, t.token.len());
        }
    }

    println!("[OK] Hub URLs, in order:");
    for url in &r.hub_urls {
        println!("       {url}");
    }

    match (&r.chromium, r.needs_chromium) {
        (Some(path), _) => println!("[OK] Chromium found: {}", path.display()),
        (None, true) => println!("[!!] Chromium NOT found. Install chromium or set OIL_CHROMIUM_PATH."),
        (None, false) => println!("[??] Chromium not found (only needed for FETCH_MODE=browser)"),
    }

    println!();
    if r.ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(r.ready)
}
