//! `diagnose`: fetch the page and report what it contains.

use crate::acquisition::build_fetcher;
use crate::cli::output::{self, Styled};
use crate::config::Settings;
use crate::extract::diagnostics::{analyze_page, PageAnalysis};
use crate::extract::Extractor;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub async fn run(settings: &Settings, save: Option<&Path>) -> Result<()> {
    let region = settings.require_region()?;
    let fetcher = build_fetcher(&settings.upstream).await?;

    info!(zipcode = %region, fetcher = fetcher.name(), "fetching page for analysis");
    let body = fetcher.fetch(region).await?;

    if let Some(path) = save {
        std::fs::write(path, &body)
            .with_context(|| format!("failed to save response to {}", path.display()))?;
        info!(path = %path.display(), bytes = body.len(), "saved response body");
    }

    let analysis = analyze_page(&body, &Extractor::default());

    if output::is_json() {
        output::print_json(&analysis);
    } else {
        print_analysis(&analysis, save);
    }

    Ok(())
}

fn print_analysis(a: &PageAnalysis, saved: Option<&Path>) {
    let s = Styled::stdout();

    println!("  {}", s.bold("Page analysis"));
    println!("  Length: {} bytes", a.length);
    if let Some(path) = saved {
        println!("  Saved:  {}", path.display());
    }
    println!(
        "  Zip input: {}",
        if a.has_zip_input { "present" } else { "not found" }
    );

    section(&s, "API-like URLs", &a.api_urls);
    section(&s, "JS price variables", &a.js_price_vars);

    println!();
    println!("  {} ({})", s.bold("Forms"), a.forms.len());
    for form in &a.forms {
        println!(
            "    {} {}",
            form.method.to_uppercase(),
            form.action.as_deref().unwrap_or("(no action)")
        );
        for (name, kind) in &form.fields {
            println!("      {name} [{kind}]");
        }
    }

    section(&s, "Price-like elements", &a.price_elements);
    section(&s, "Dollar amounts in context", &a.dollar_contexts);
    section(&s, "\"price\" in context", &a.price_contexts);

    println!();
    println!("  {}", s.bold("Matchers"));
    for m in &a.matchers {
        match (m.price, &m.error) {
            (Some(price), _) => println!("    {} {:<12} {price}", s.ok_sym(), m.matcher),
            (None, Some(err)) if m.decisive => {
                println!("    {} {:<12} {err}", s.err_sym(), m.matcher)
            }
            (None, Some(err)) => println!("    {} {:<12} {err}", s.warn_sym(), m.matcher),
            (None, None) => println!("    {} {:<12}", s.warn_sym(), m.matcher),
        }
    }
}

fn section(s: &Styled, title: &str, items: &[String]) {
    println!();
    println!("  {} ({})", s.bold(title), items.len());
    for item in items {
        println!("    {}", item.replace('\n', " "));
    }
}
