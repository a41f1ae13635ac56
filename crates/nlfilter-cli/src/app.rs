//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nlfilter")]
#[command(
    author,
    version,
    about = "Turn natural-language queries into vector-search metadata filters"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "NLFILTER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a query into a metadata filter
    Filter(FilterArgs),

    /// Filter and run a vector search
    Search(SearchArgs),

    /// Show the prompt sent to providers
    Prompt(PromptArgs),

    /// Describe supported fields and operators
    Schema,

    /// Show index statistics
    Stats,

    /// Manage the config file
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct FilterArgs {
    /// Natural-language query
    pub query: Vec<String>,

    /// Skip providers and use the rule-based extractor
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Natural-language query
    pub query: Vec<String>,

    /// Number of results
    #[arg(short = 'n', long = "top-k")]
    pub top_k: Option<usize>,

    /// Skip providers and use the rule-based extractor
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct PromptArgs {
    /// Natural-language query
    pub query: Vec<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective config with keys masked
    Show,
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
