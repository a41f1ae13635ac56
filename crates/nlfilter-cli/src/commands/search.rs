//! Search command

use super::{generate, join_query, pipeline};
use crate::app::{OutputFormat, SearchArgs};
use crate::output::{self, FilterReport, SearchReport};
use anyhow::Result;
use nlfilter_core::{Config, NlFilterError, SearchClient};

pub async fn run(args: SearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let query = join_query(&args.query);
    let pipeline = pipeline(config, args.offline)?;
    let client = SearchClient::from_config(config)?;

    let outcome = generate(&pipeline, &query).await?;
    let response = tokio::select! {
        response = client.search(&query, &outcome.filter, args.top_k) => response,
        _ = tokio::signal::ctrl_c() => anyhow::bail!("Interrupted"),
    };

    output::print_search(
        &SearchReport {
            filter: FilterReport {
                query: &query,
                outcome: &outcome,
            },
            search: &response,
        },
        format,
    )?;

    match response.error {
        Some(error) => Err(NlFilterError::Index(error).into()),
        None => Ok(()),
    }
}
