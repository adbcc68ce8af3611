//! Embedded price-object matcher.
//!
//! Newer upstream pages ship the quote as a JavaScript assignment,
//!
//! ```text
//! var zipData = {"zipcodeprices":[{"price":"$2.89<sup>9</sup>","gallon":"150"}]};
//! ```
//!
//! and the AJAX endpoint can return the same object as a bare JSON body.
//! The price string carries dollars and cents plus an optional superscript
//! sub-cent digit, which is appended textually before parsing.

use super::{compose_price, ExtractError, PriceMatcher};
use crate::types::PriceReading;
use regex::Regex;
use serde_json::Value;

/// Field holding the array of quotes.
pub const DEFAULT_ARRAY_FIELD: &str = "zipcodeprices";

/// Field inside each quote holding the price string.
pub const DEFAULT_PRICE_FIELD: &str = "price";

/// Matcher for a JSON object embedded in a script assignment.
pub struct StructuredMatcher {
    array_field: String,
    price_field: String,
    assignment_re: Regex,
    price_re: Regex,
}

impl Default for StructuredMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_ARRAY_FIELD, DEFAULT_PRICE_FIELD)
    }
}

impl StructuredMatcher {
    pub fn new(array_field: &str, price_field: &str) -> Self {
        Self {
            array_field: array_field.to_string(),
            price_field: price_field.to_string(),
            assignment_re: Regex::new(r"[A-Za-z_$][\w$.]*\s*=\s*\{")
                .expect("assignment regex is valid"),
            price_re: Regex::new(
                r"(?i)^\s*\$?\s*(?P<main>\d+\.\d+)\s*(?:<sup[^>]*>\s*(?P<sub>\d+)\s*</sup>)?\s*$",
            )
            .expect("price string regex is valid"),
        }
    }

    /// Locate the raw object text: the body itself when it is a JSON object,
    /// otherwise the first `identifier = {...}` whose object mentions the
    /// array field.
    pub fn locate_object<'a>(&self, body: &'a str) -> Option<&'a str> {
        let needle = format!("\"{}\"", self.array_field);

        let trimmed = body.trim();
        if trimmed.starts_with('{') && trimmed.contains(&needle) {
            return Some(trimmed);
        }

        self.assignment_re.find_iter(body).find_map(|m| {
            let start = m.end() - 1;
            let object = balanced_object(&body[start..]);
            object.contains(&needle).then_some(object)
        })
    }

    /// Parse a quote's price string into a number.
    pub fn parse_price_string(&self, raw: &str) -> Option<f64> {
        let caps = self.price_re.captures(raw)?;
        let main = caps.name("main")?.as_str();
        compose_price(main, caps.name("sub").map(|m| m.as_str()))
    }
}

impl PriceMatcher for StructuredMatcher {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn find(&self, body: &str) -> Result<PriceReading, ExtractError> {
        let raw = self.locate_object(body).ok_or(ExtractError::ObjectMissing)?;

        let object: Value =
            serde_json::from_str(raw).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

        let quotes = object
            .get(&self.array_field)
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractError::MissingField(self.array_field.clone()))?;

        let first = quotes.first().ok_or(ExtractError::EmptyPrices)?;

        let price_text = first
            .get(&self.price_field)
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractError::MalformedPrice(first.to_string()))?;

        let value = self
            .parse_price_string(price_text)
            .ok_or_else(|| ExtractError::MalformedPrice(price_text.to_string()))?;

        PriceReading::new(value).ok_or(ExtractError::OutOfRange(value))
    }
}

/// Return the brace-balanced object starting at `text[0] == '{'`, skipping
/// braces inside string literals. Unterminated input returns the remainder,
/// which then fails JSON parsing.
fn balanced_object(text: &str) -> &str {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..=i];
                }
            }
            _ => {}
        }
    }

    text
}
