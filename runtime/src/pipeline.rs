//! The fetch → extract → publish pass.
//!
//! Each stage is awaited in turn; the first failure ends the run. Nothing is
//! retried here, the scheduler that invokes the binary re-runs it later.

use crate::acquisition::{build_fetcher, FetchError, Fetcher};
use crate::config::{ConfigError, Settings};
use crate::error::{SensorError, SensorResult};
use crate::extract::{Extraction, Extractor};
use crate::publish::HubPublisher;
use crate::types::{RegionKey, SensorRecord};
use serde::Serialize;
use tracing::{error, info};

/// What a successful run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub zipcode: String,
    pub entity_id: String,
    pub state: String,
    pub fetcher: &'static str,
    pub matcher: &'static str,
    pub hub_url: String,
    pub token_origin: String,
    pub hub_status: u16,
    /// 1-based index of the profile that accepted the write.
    pub attempt: usize,
}

/// Fetch and extract only. No hub token is needed.
pub async fn scrape(settings: &Settings) -> SensorResult<Extraction> {
    let region = settings.require_region()?;
    let fetcher = build_fetcher(&settings.upstream).await?;
    scrape_with(fetcher.as_ref(), &Extractor::default(), region).await
}

/// Fetch `region` with `fetcher` and run the extractor chain over the body.
pub async fn scrape_with(
    fetcher: &dyn Fetcher,
    extractor: &Extractor,
    region: &RegionKey,
) -> SensorResult<Extraction> {
    info!(zipcode = %region, fetcher = fetcher.name(), "fetching price");

    let body = fetcher.fetch(region).await.map_err(|e| {
        log_fetch_error(&e);
        SensorError::from(e)
    })?;

    let extraction = extractor.extract(&body).map_err(|e| {
        error!(bytes = body.len(), "could not extract price: {e}");
        SensorError::from(e)
    })?;

    info!(
        zipcode = %region,
        price = %extraction.price,
        matcher = extraction.matcher,
        "found price"
    );
    Ok(extraction)
}

/// Full pass driven by `settings`.
///
/// Configuration is checked first: a missing zip code or an empty token
/// list fails before any network request.
pub async fn run(settings: &Settings) -> SensorResult<RunReport> {
    let region = settings.require_region()?;

    let publisher = HubPublisher::from_settings(&settings.hub)?;
    if publisher.profiles().is_empty() {
        error!("no hub token found in the environment or token files");
        return Err(ConfigError::MissingToken.into());
    }

    let fetcher = build_fetcher(&settings.upstream).await?;
    run_with(fetcher.as_ref(), &Extractor::default(), &publisher, region).await
}

/// Full pass over explicit collaborators.
pub async fn run_with(
    fetcher: &dyn Fetcher,
    extractor: &Extractor,
    publisher: &HubPublisher,
    region: &RegionKey,
) -> SensorResult<RunReport> {
    let extraction = scrape_with(fetcher, extractor, region).await?;
    let record = SensorRecord::now(region, extraction.price);

    let outcome = publisher.publish(&record).await?;

    Ok(RunReport {
        zipcode: region.as_str().to_string(),
        entity_id: record.entity_id,
        state: record.state,
        fetcher: fetcher.name(),
        matcher: extraction.matcher,
        hub_url: outcome.base_url,
        token_origin: outcome.token_origin,
        hub_status: outcome.status,
        attempt: outcome.attempt,
    })
}

fn log_fetch_error(err: &FetchError) {
    match err {
        FetchError::Blocked { url } => {
            error!(%url, "blocked by upstream (403), the site is refusing automated requests")
        }
        FetchError::HttpStatus { status, url } => {
            error!(%url, status, "upstream returned an error status")
        }
        other => error!("fetch failed: {other}"),
    }
}
