//! Stats command

use crate::app::OutputFormat;
use anyhow::Result;
use nlfilter_core::{Config, SearchClient};

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let client = SearchClient::from_config(config)?;
    let stats = client.stats().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Cli => {
            println!("Index:           {}", config.index.index_name);
            println!("Vectors:         {}", stats.total_vector_count);
            println!("Dimension:       {}", stats.dimension);
            println!("Fullness:        {:.2}%", stats.index_fullness * 100.0);
        }
    }

    Ok(())
}
