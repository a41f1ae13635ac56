//! Config command

use crate::app::{ConfigAction, ConfigArgs, OutputFormat};
use anyhow::{bail, Result};
use nlfilter_core::Config;
use std::path::Path;

pub async fn run(args: ConfigArgs, path: &Path, format: OutputFormat) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = crate::load_config(path)?.redacted();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputFormat::Cli => print!("{}", serde_yaml::to_string(&config)?),
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Path => println!("{}", path.display()),
    }

    Ok(())
}
