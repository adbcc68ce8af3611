//! Regex matchers over the raw response text.
//!
//! Every occurrence is considered in document order and the first value
//! inside the plausible range wins. Syntactically valid but implausible
//! values (delivery fees, tank sizes, totals) are skipped.

use super::{compose_price, ExtractError, PriceMatcher};
use crate::types::PriceReading;
use regex::Regex;

/// A regex-driven matcher with a `main` capture group and an optional `sub`
/// group holding a sub-cent digit.
pub struct PatternMatcher {
    name: &'static str,
    re: Regex,
}

impl PatternMatcher {
    /// Build a matcher from a pattern that defines a `main` group and
    /// optionally a `sub` group.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            re: Regex::new(pattern)?,
        })
    }

    /// `$3.45`, or rendered `$2.89<sup>9</sup>` with the sub-cent digit
    /// kept. The plain capture stops after two decimals, so `$2.899` yields
    /// `2.89`.
    pub fn dollar() -> Self {
        Self::new(
            "dollar",
            r"(?i)\$(?P<main>\d+\.\d{2})(?:\s*<sup[^>]*>\s*(?P<sub>\d)\s*</sup>)?",
        )
        .expect("dollar regex is valid")
    }

    /// `3.45/gal`, `3.45 / gal`, `3.45 per gal`, `3.45 Per Gallon`.
    pub fn per_gallon() -> Self {
        Self::new(
            "per_gallon",
            r"(?i)(?P<main>\d+\.\d{2})\s*(?:per\s*gal|/\s*gal)",
        )
        .expect("per-gallon regex is valid")
    }

    /// All syntactic candidates in document order, plausible or not.
    pub fn candidates(&self, body: &str) -> Vec<f64> {
        self.re
            .captures_iter(body)
            .filter_map(|caps| {
                let main = caps.name("main")?.as_str();
                let sub = caps.name("sub").map(|m| m.as_str());
                compose_price(main, sub)
            })
            .collect()
    }
}

impl PriceMatcher for PatternMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn find(&self, body: &str) -> Result<PriceReading, ExtractError> {
        self.candidates(body)
            .into_iter()
            .find_map(PriceReading::new)
            .ok_or(ExtractError::NoCandidate)
    }
}
