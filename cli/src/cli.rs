use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turn-based roleplay between AI characters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// API key for the completion endpoint
    #[arg(long, env = "GROK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// List the available models and exit
    #[arg(long, default_value_t = false)]
    pub models: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GROKPARTY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory exported conversations are written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Delay between turns in milliseconds
    #[arg(long)]
    pub turn_interval_ms: Option<u64>,

    /// Write the effective configuration to the config file and exit
    #[arg(long, default_value_t = false)]
    pub save_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a conversation without prompts and print it as JSON
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Character personality; repeat for each participant
    #[arg(long = "character", required = true)]
    pub characters: Vec<String>,

    /// Model used for every character and for speaker selection
    #[arg(short, long)]
    pub model: Option<String>,

    /// Kind of conversation
    #[arg(long = "type", default_value = "conversation")]
    pub conversation_type: String,

    #[arg(long, default_value = "anything")]
    pub topic: String,

    #[arg(long, default_value = "anywhere")]
    pub setting: String,

    #[arg(long, default_value = "friendly")]
    pub mood: String,

    /// Number of turns to generate, the opening line included
    #[arg(long, default_value_t = 10)]
    pub turns: usize,

    /// Write the JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
