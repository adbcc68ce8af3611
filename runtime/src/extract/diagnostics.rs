//! Page analysis for when extraction stops working.
//!
//! When the upstream changes its markup, the useful questions are: which
//! endpoints does the page talk to, which script variables look like prices,
//! which forms exist, and where do dollar amounts appear. [`analyze_page`]
//! answers all of these from a single response body, and also reports what
//! each price matcher saw.

use super::{Extractor, MatcherReport};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

/// Maximum samples kept per finding category.
const MAX_SAMPLES: usize = 10;

/// Characters of context kept on each side of a dollar amount.
const CONTEXT_CHARS: usize = 50;

/// A form found in the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormSummary {
    pub action: Option<String>,
    pub method: String,
    /// `(name, type)` for every named field.
    pub fields: Vec<(String, String)>,
}

/// Everything [`analyze_page`] found.
#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    pub length: usize,
    pub api_urls: Vec<String>,
    pub js_price_vars: Vec<String>,
    pub forms: Vec<FormSummary>,
    pub price_elements: Vec<String>,
    pub dollar_contexts: Vec<String>,
    /// Text around the word "price", case-insensitive.
    pub price_contexts: Vec<String>,
    pub has_zip_input: bool,
    pub matchers: Vec<MatcherReport>,
}

/// Analyze a response body.
pub fn analyze_page(body: &str, extractor: &Extractor) -> PageAnalysis {
    let document = Html::parse_document(body);

    PageAnalysis {
        length: body.len(),
        api_urls: find_api_urls(body),
        js_price_vars: find_js_price_vars(body),
        forms: find_forms(&document),
        price_elements: find_price_elements(&document),
        dollar_contexts: find_dollar_contexts(body),
        price_contexts: find_price_contexts(body),
        has_zip_input: has_zip_input(&document),
        matchers: extractor.trace(body),
    }
}

fn find_api_urls(body: &str) -> Vec<String> {
    let patterns = [
        r#"(?i)https?://[^"'\s]+/api/[^"'\s]+"#,
        r#"(?i)https?://[^"'\s]+price[^"'\s]*"#,
        r#"(?i)ajax[^"'\s]*price[^"'\s]*"#,
        r#"(?i)/rest/[^"'\s]+"#,
        r#"(?i)/ajax/[^"'\s]+"#,
    ];

    let mut found: Vec<String> = Vec::new();
    for pattern in patterns {
        let re = Regex::new(pattern).expect("api url regex is valid");
        for m in re.find_iter(body) {
            let s = m.as_str().to_string();
            if !found.contains(&s) {
                found.push(s);
            }
        }
    }
    found.truncate(MAX_SAMPLES);
    found
}

fn find_js_price_vars(body: &str) -> Vec<String> {
    let re = Regex::new(
        r#"(?i)(?:price|amount|cost)["']?\s*[:=]\s*["']?\$?\d+\.?\d*(?:<sup>\d+</sup>)?"#,
    )
    .expect("js variable regex is valid");
    re.find_iter(body)
        .map(|m| m.as_str().to_string())
        .take(MAX_SAMPLES)
        .collect()
}

fn find_forms(document: &Html) -> Vec<FormSummary> {
    let form_sel = Selector::parse("form").expect("form selector is valid");
    let field_sel = Selector::parse("input, select, textarea").expect("field selector is valid");

    document
        .select(&form_sel)
        .map(|form| {
            let fields = form
                .select(&field_sel)
                .filter_map(|field| {
                    let name = field.value().attr("name")?.to_string();
                    let kind = field
                        .value()
                        .attr("type")
                        .unwrap_or(field.value().name())
                        .to_string();
                    Some((name, kind))
                })
                .collect();

            FormSummary {
                action: form.value().attr("action").map(str::to_string),
                method: form.value().attr("method").unwrap_or("get").to_uppercase(),
                fields,
            }
        })
        .collect()
}

fn find_price_elements(document: &Html) -> Vec<String> {
    let sel = Selector::parse(r#"[class*="price"], [id*="price"], [class*="cost"], [class*="amount"]"#)
        .expect("price element selector is valid");

    document
        .select(&sel)
        .map(|el| {
            el.text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .take(MAX_SAMPLES)
        .collect()
}

fn find_dollar_contexts(body: &str) -> Vec<String> {
    let re = Regex::new(r"\$\d+\.?\d*").expect("dollar regex is valid");
    re.find_iter(body)
        .map(|m| {
            let start = floor_char_boundary(body, m.start().saturating_sub(CONTEXT_CHARS));
            let end = ceil_char_boundary(body, (m.end() + CONTEXT_CHARS).min(body.len()));
            body[start..end].split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .take(MAX_SAMPLES)
        .collect()
}

fn find_price_contexts(body: &str) -> Vec<String> {
    let re = Regex::new(&format!(r"(?i).{{0,{CONTEXT_CHARS}}}price.{{0,{CONTEXT_CHARS}}}"))
        .expect("price context regex is valid");
    re.find_iter(body)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .take(MAX_SAMPLES)
        .collect()
}

fn has_zip_input(document: &Html) -> bool {
    let sel = Selector::parse("input#number").expect("zip input selector is valid");
    document.select(&sel).next().is_some()
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
