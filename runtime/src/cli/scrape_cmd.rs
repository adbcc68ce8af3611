//! `scrape`: fetch and extract without publishing.

use crate::cli::output::{self, Styled};
use crate::config::Settings;
use crate::pipeline;
use anyhow::Result;

pub async fn run(settings: &Settings) -> Result<()> {
    let extraction = pipeline::scrape(settings).await?;
    let zipcode = settings.require_region()?.as_str();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "zipcode": zipcode,
            "price": extraction.price.value(),
            "state": extraction.price.state_string(),
            "matcher": extraction.matcher,
            "fetch_mode": settings.upstream.mode.as_str(),
        }));
    } else if output::is_quiet() {
        println!("{}", extraction.price.state_string());
    } else {
        let s = Styled::stdout();
        println!(
            "  {} {zipcode}: {}  {}",
            s.ok_sym(),
            s.bold(&extraction.price.to_string()),
            s.dim(&format!("({} matcher)", extraction.matcher))
        );
    }

    Ok(())
}
