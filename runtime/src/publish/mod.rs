//! Sensor state publishing to the home-automation hub.
//!
//! One state write per run, attempted against each [`ConnectionProfile`] in
//! order until the hub answers with a 2xx. A failed profile is logged and
//! skipped; only exhausting the whole list fails the publish.

pub mod profiles;

pub use profiles::{build_profiles, ConnectionProfile};

use crate::config::HubSettings;
use crate::types::SensorRecord;
use std::time::Duration;
use tracing::{debug, error, info};

/// Publish failures.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("no hub connection profiles (no token found)")]
    NoProfiles,

    #[error("all {} hub connection attempts failed", .attempts.len())]
    Exhausted { attempts: Vec<AttemptFailure> },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single profile was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The hub answered with a non-2xx status.
    Status { base_url: String, status: u16 },
    /// The request never got an answer.
    Transport { base_url: String, message: String },
}

/// The profile that accepted the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub base_url: String,
    pub token_origin: String,
    pub status: u16,
    /// 1-based index of the winning profile.
    pub attempt: usize,
}

/// Writes sensor records to the hub.
pub struct HubPublisher {
    client: reqwest::Client,
    profiles: Vec<ConnectionProfile>,
}

impl HubPublisher {
    /// Publisher over an explicit profile list.
    pub fn new(profiles: Vec<ConnectionProfile>, timeout_ms: u64) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { client, profiles })
    }

    /// Publisher over the profiles discovered from `settings`.
    pub fn from_settings(settings: &HubSettings) -> Result<Self, PublishError> {
        Self::new(build_profiles(settings), settings.timeout_ms)
    }

    pub fn profiles(&self) -> &[ConnectionProfile] {
        &self.profiles
    }

    /// Write `record`, trying profiles in order.
    pub async fn publish(&self, record: &SensorRecord) -> Result<PublishOutcome, PublishError> {
        if self.profiles.is_empty() {
            return Err(PublishError::NoProfiles);
        }

        let mut attempts = Vec::with_capacity(self.profiles.len());

        for (i, profile) in self.profiles.iter().enumerate() {
            let url = profile.state_url(&record.entity_id);
            debug!(
                url = %profile.base_url,
                token_origin = %profile.token_origin,
                token_len = profile.token.len(),
                "trying hub profile"
            );

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&profile.token)
                .json(record)
                .send()
                .await;

            match resp {
                Ok(r) if r.status().is_success() => {
                    let status = r.status().as_u16();
                    info!(
                        entity_id = %record.entity_id,
                        state = %record.state,
                        url = %profile.base_url,
                        "published sensor state"
                    );
                    return Ok(PublishOutcome {
                        base_url: profile.base_url.clone(),
                        token_origin: profile.token_origin.clone(),
                        status,
                        attempt: i + 1,
                    });
                }
                Ok(r) => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    let snippet: String = body.chars().take(100).collect();
                    debug!(url = %profile.base_url, status, body = %snippet, "hub rejected write");
                    attempts.push(AttemptFailure::Status {
                        base_url: profile.base_url.clone(),
                        status,
                    });
                }
                Err(e) => {
                    debug!(url = %profile.base_url, "hub connection failed: {e}");
                    attempts.push(AttemptFailure::Transport {
                        base_url: profile.base_url.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        error!(
            attempts = attempts.len(),
            "failed to push to hub after trying all connection profiles"
        );
        Err(PublishError::Exhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_profiles_fail_fast() {
        use crate::types::{PriceReading, RegionKey};
        let publisher = HubPublisher::new(Vec::new(), 1000).unwrap();
        let record = SensorRecord::now(
            &RegionKey::parse("06001").unwrap(),
            PriceReading::new(3.0).unwrap(),
        );
        assert!(matches!(
            publisher.publish(&record).await,
            Err(PublishError::NoProfiles)
        ));
    }

    #[test]
    fn test_exhausted_message_counts_attempts() {
        let err = PublishError::Exhausted {
            attempts: vec![
                AttemptFailure::Status {
                    base_url: "a".into(),
                    status: 401,
                },
                AttemptFailure::Transport {
                    base_url: "b".into(),
                    message: "refused".into(),
                },
            ],
        };
        assert_eq!(err.to_string(), "all 2 hub connection attempts failed");
    }
}
