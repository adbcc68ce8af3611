//! Price extraction from unstable upstream markup.
//!
//! The upstream page has changed shape several times, so extraction is an
//! ordered chain of independent [`PriceMatcher`]s. Each matcher either finds a
//! plausible price, reports that its pattern is absent (the chain moves on),
//! or reports that its pattern is present but broken (the chain stops).
//!
//! # Chain order
//!
//! 1. `structured`: embedded `identifier = {...};` object or a bare JSON
//!    payload carrying a `zipcodeprices` array.
//! 2. `dollar`: any `$D.DD` substring, with a trailing `<sup>D</sup>`
//!    sub-cent digit when the page was rendered. One scan in document order.
//! 3. `per_gallon`: `D.DD/gal` or `D.DD per gal`.
//!
//! The structured matcher runs first so that an empty or broken price object
//! fails the run before a stray dollar amount elsewhere on the page is used.

pub mod diagnostics;
pub mod structured;
pub mod text;

use crate::types::PriceReading;
use serde::Serialize;
use tracing::debug;

pub use structured::StructuredMatcher;
pub use text::PatternMatcher;

/// Extraction failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("price not found in page content ({bytes} bytes)")]
    NotFound { bytes: usize },

    #[error("no price candidate within the plausible range")]
    NoCandidate,

    #[error("embedded price object not found")]
    ObjectMissing,

    #[error("embedded price object is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("price object has no '{0}' array")]
    MissingField(String),

    #[error("no prices found")]
    EmptyPrices,

    #[error("malformed price string: {0:?}")]
    MalformedPrice(String),

    #[error("price {0} outside the plausible range")]
    OutOfRange(f64),
}

impl ExtractError {
    /// True when the matcher recognized its pattern but the content was
    /// unusable. Decisive errors stop the chain instead of falling through to
    /// looser matchers.
    pub fn is_decisive(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidJson(_)
                | ExtractError::MissingField(_)
                | ExtractError::EmptyPrices
                | ExtractError::MalformedPrice(_)
                | ExtractError::OutOfRange(_)
        )
    }
}

/// One price-encoding pattern.
pub trait PriceMatcher: Send + Sync {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Search `body` for this matcher's pattern.
    fn find(&self, body: &str) -> Result<PriceReading, ExtractError>;
}

/// A successful extraction and the matcher that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extraction {
    pub price: PriceReading,
    pub matcher: &'static str,
}

/// Outcome of a single matcher, as reported by [`Extractor::trace`].
#[derive(Debug, Clone, Serialize)]
pub struct MatcherReport {
    pub matcher: &'static str,
    pub price: Option<f64>,
    pub error: Option<String>,
    pub decisive: bool,
}

/// Ordered chain of price matchers.
pub struct Extractor {
    matchers: Vec<Box<dyn PriceMatcher>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_matchers(vec![
            Box::new(StructuredMatcher::default()),
            Box::new(PatternMatcher::dollar()),
            Box::new(PatternMatcher::per_gallon()),
        ])
    }
}

impl Extractor {
    pub fn with_matchers(matchers: Vec<Box<dyn PriceMatcher>>) -> Self {
        Self { matchers }
    }

    /// Names of the configured matchers, in order.
    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Run the chain over `body`.
    ///
    /// Returns the first plausible price, the first decisive error, or
    /// [`ExtractError::NotFound`] when no matcher recognized anything.
    pub fn extract(&self, body: &str) -> Result<Extraction, ExtractError> {
        for matcher in &self.matchers {
            match matcher.find(body) {
                Ok(price) => {
                    debug!(matcher = matcher.name(), %price, "price matched");
                    return Ok(Extraction {
                        price,
                        matcher: matcher.name(),
                    });
                }
                Err(e) if e.is_decisive() => {
                    debug!(matcher = matcher.name(), error = %e, "matcher failed decisively");
                    return Err(e);
                }
                Err(e) => {
                    debug!(matcher = matcher.name(), error = %e, "matcher not applicable");
                }
            }
        }

        Err(ExtractError::NotFound { bytes: body.len() })
    }

    /// Run every matcher independently and report each outcome.
    pub fn trace(&self, body: &str) -> Vec<MatcherReport> {
        self.matchers
            .iter()
            .map(|m| match m.find(body) {
                Ok(price) => MatcherReport {
                    matcher: m.name(),
                    price: Some(price.value()),
                    error: None,
                    decisive: false,
                },
                Err(e) => MatcherReport {
                    matcher: m.name(),
                    price: None,
                    decisive: e.is_decisive(),
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }
}

/// Join a dollars-and-cents fragment with an optional sub-cent fragment as
/// text, then parse. `("2.89", Some("9"))` yields `2.899`.
pub(crate) fn compose_price(main: &str, sub_cent: Option<&str>) -> Option<f64> {
    let mut text = main.trim().to_string();
    if let Some(sub) = sub_cent.map(str::trim).filter(|s| !s.is_empty()) {
        if !text.contains('.') {
            return None;
        }
        text.push_str(sub);
    }
    text.parse::<f64>().ok()
}
