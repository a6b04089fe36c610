use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dotenvy::dotenv;
use grokparty_core::{get_default_config_file, PartyConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

mod app;
mod cli;
mod controls;
mod logging;
mod output;
mod setup;

use crate::cli::{Args, Command};
use crate::output::{print_models, print_welcome};

const APP_NAME: &str = "grokparty";

fn config_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(get_default_config_file(APP_NAME)?),
    }
}

/// Loads the config file and layers command-line overrides on top.
fn load_config(args: &Args, path: &Path) -> Result<PartyConfig> {
    let file_config = PartyConfig::load_from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let overrides = PartyConfig {
        api_key: None,
        base_url: None,
        default_model: None,
        decision_model: None,
        turn_interval_ms: args.turn_interval_ms,
        pause_poll_ms: None,
        max_characters: None,
        character_search: None,
        export_dir: args.export_dir.clone(),
        log_level: args.log_level.clone(),
    };
    Ok(file_config.merge(&overrides))
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file may carry GROK_API_KEY; it must be loaded before parsing.
    dotenv().ok();

    let args = Args::parse();

    if args.models {
        print_models();
        return Ok(());
    }

    let path = config_path(&args)?;
    let config = match load_config(&args, &path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Error loading configuration: {:#}", e).red());
            return Err(e);
        }
    };
    logging::init(config.log_level.as_deref());
    debug!(
        base_url = ?config.base_url,
        default_model = config.default_model(),
        "Configuration loaded"
    );

    if args.save_config {
        config
            .save_to_file(&path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        println!("{}", format!("✓ Configuration saved to {}", path.display()).green());
        return Ok(());
    }

    let api_key = args.api_key.clone();
    match args.command {
        Some(Command::Generate(generate)) => app::run_generate(generate, api_key, &config).await,
        None => {
            print_welcome();
            if let Err(e) = app::run_interactive(api_key, &config).await {
                error!(error = %e, "Interactive session failed");
                eprintln!("{}", format!("Error: {:#}", e).red());
                return Err(e);
            }
            Ok(())
        }
    }
}
