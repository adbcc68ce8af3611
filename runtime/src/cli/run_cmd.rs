//! `run`: scrape the price and publish it to the hub.

use crate::cli::output::{self, Styled};
use crate::config::Settings;
use crate::pipeline;
use anyhow::Result;

pub async fn run(settings: &Settings) -> Result<()> {
    let report = pipeline::run(settings).await?;

    if output::is_json() {
        output::print_json(&report);
    } else if !output::is_quiet() {
        let s = Styled::new();
        eprintln!(
            "  {} {} = {} $/gal",
            s.ok_sym(),
            s.bold(&report.entity_id),
            report.state
        );
        eprintln!(
            "  {}",
            s.dim(&format!(
                "via {} ({}), matcher {}",
                report.hub_url, report.token_origin, report.matcher
            ))
        );
    }

    Ok(())
}
