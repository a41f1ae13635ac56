//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use anyhow::Result;
use nlfilter_core::{FilterOutcome, SearchResponse};
use serde::Serialize;
use std::io::Write;

/// A generated filter together with its query
#[derive(Serialize)]
pub struct FilterReport<'a> {
    pub query: &'a str,
    #[serde(flatten)]
    pub outcome: &'a FilterOutcome,
}

/// A filter and the search it drove
#[derive(Serialize)]
pub struct SearchReport<'a> {
    #[serde(flatten)]
    pub filter: FilterReport<'a>,
    pub search: &'a SearchResponse,
}

/// Print a filter report
pub fn print_filter(report: &FilterReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print!("{}", json::format(report)),
        OutputFormat::Cli => {
            let mut out = terminal::stdout();
            terminal::write_filter(&mut out, report)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// Print a search report
pub fn print_search(report: &SearchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print!("{}", json::format(report)),
        OutputFormat::Cli => {
            let mut out = terminal::stdout();
            terminal::write_search(&mut out, report)?;
            out.flush()?;
        }
    }
    Ok(())
}
