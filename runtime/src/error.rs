//! Top-level error type for one scrape-and-publish run.

use crate::acquisition::FetchError;
use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::publish::PublishError;

/// Every way a run can fail. Each variant maps to exit code 1.
#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Convenience result type.
pub type SensorResult<T> = Result<T, SensorError>;

impl SensorError {
    /// Short machine-readable kind, used in `--json` output.
    pub fn kind(&self) -> &'static str {
        match self {
            SensorError::Config(_) => "config",
            SensorError::Fetch(FetchError::Blocked { .. }) => "blocked",
            SensorError::Fetch(FetchError::HttpStatus { .. }) => "http",
            SensorError::Fetch(_) => "transport",
            SensorError::Extract(_) => "extract",
            SensorError::Publish(_) => "publish",
        }
    }
}
