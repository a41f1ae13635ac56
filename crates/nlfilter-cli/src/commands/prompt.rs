//! Prompt command

use super::{join_query, pipeline};
use crate::app::{OutputFormat, PromptArgs};
use anyhow::Result;
use nlfilter_core::Config;

pub async fn run(args: PromptArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let query = join_query(&args.query);
    let pipeline = pipeline(config, false)?;
    let prompt = pipeline.prompt_for(&query);

    match format {
        OutputFormat::Json => {
            let candidates: Vec<_> = pipeline
                .chain()
                .candidates()
                .iter()
                .map(|c| format!("{} / {}", c.provider(), c.model))
                .collect();
            let value = serde_json::json!({
                "query": query,
                "prompt": prompt,
                "candidates": candidates,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Cli => println!("{}", prompt),
    }

    Ok(())
}
