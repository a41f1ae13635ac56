//! Filter command

use super::{generate, join_query, pipeline};
use crate::app::{FilterArgs, OutputFormat};
use crate::output::{self, FilterReport};
use anyhow::Result;
use nlfilter_core::Config;

pub async fn run(args: FilterArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let query = join_query(&args.query);
    let pipeline = pipeline(config, args.offline)?;

    let outcome = generate(&pipeline, &query).await?;
    output::print_filter(
        &FilterReport {
            query: &query,
            outcome: &outcome,
        },
        format,
    )
}
