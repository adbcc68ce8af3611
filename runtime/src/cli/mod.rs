//! CLI subcommand implementations for the oil-price-sensor binary.

pub mod diagnose_cmd;
pub mod doctor;
pub mod output;
pub mod run_cmd;
pub mod scrape_cmd;
