//! CLI command handlers

pub mod config;
pub mod filter;
pub mod prompt;
pub mod schema;
pub mod search;
pub mod stats;

use anyhow::{bail, Result};
use nlfilter_core::{Config, FilterOutcome, FilterPipeline};

/// Join positional words into one query
pub fn join_query(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

/// Build the pipeline for a command
pub fn pipeline(config: &Config, offline: bool) -> Result<FilterPipeline> {
    let pipeline = if offline {
        FilterPipeline::offline(&config.vocabulary)?
    } else {
        FilterPipeline::from_config(config)?
    };
    Ok(pipeline)
}

/// Generate a filter, giving up on Ctrl-C
pub async fn generate(pipeline: &FilterPipeline, query: &str) -> Result<FilterOutcome> {
    let (mut generation, handle) = pipeline.generate_filter_abortable(query);

    tokio::select! {
        result = &mut generation => match result {
            Ok(outcome) => Ok(outcome),
            Err(_) => bail!("Filter generation was cancelled"),
        },
        _ = tokio::signal::ctrl_c() => {
            handle.abort();
            bail!("Interrupted")
        }
    }
}
