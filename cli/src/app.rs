use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm};
use grokparty_core::{
    find_model, Character, CompletionClient, Conversation, ConversationConfig,
    ConversationExport, GrokClient, NullObserver, PartyConfig, PartyError, Scene,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::GenerateArgs;
use crate::controls::spawn_key_listener;
use crate::output::{print_controls_hint, TerminalObserver};
use crate::setup::{prompt_api_key, prompt_conversation, resolve_api_key};

/// `grokparty_conversation_<YYYYmmdd_HHMMSS>.json`
pub fn export_filename(now: DateTime<Local>) -> String {
    format!("grokparty_conversation_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Writes `export` under `dir` (current directory when `None`) and returns the path.
pub fn write_export(export: &ConversationExport, dir: Option<&Path>) -> Result<PathBuf> {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let path = dir.join(export_filename(Local::now()));
    export
        .write_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn build_client(api_key: String, config: &PartyConfig) -> Result<Arc<dyn CompletionClient>> {
    let config = PartyConfig {
        api_key: Some(api_key),
        ..config.clone()
    };
    let client = GrokClient::from_config(&config).context("Failed to create completion client")?;
    Ok(Arc::new(client))
}

/// Prompts for conversations until the user is done.
pub async fn run_interactive(api_key: Option<String>, config: &PartyConfig) -> Result<()> {
    let api_key = match resolve_api_key(api_key, config) {
        Some(key) => key,
        None => loop {
            let key = prompt_api_key()?;
            if !key.is_empty() {
                break key;
            }
            println!("{}", "API key is required to use GrokParty.".red());
        },
    };
    let client = build_client(api_key, config)?;
    println!("{}", "✓ API key configured successfully!".green());

    loop {
        let setup = prompt_conversation(config)?;
        let conversation_config =
            ConversationConfig::new(setup.scene, setup.roster, setup.decision_model)
                .with_party_config(config);

        let conversation =
            run_conversation(conversation_config, client.clone(), config.pause_poll()).await?;

        let theme = ColorfulTheme::default();
        println!();
        if Confirm::with_theme(&theme)
            .with_prompt("Would you like to export this conversation?")
            .default(false)
            .interact()?
        {
            export_conversation(&conversation, config.export_dir.as_deref());
        }

        println!();
        if !Confirm::with_theme(&theme)
            .with_prompt("Would you like to start another conversation?")
            .default(false)
            .interact()?
        {
            break;
        }
        println!("\n{}\n", "=".repeat(50));
    }

    println!("\n{}", "Goodbye!".yellow());
    Ok(())
}

/// Runs one conversation with the key listener attached and returns it once stopped.
///
/// A failed conversation is reported and handed back so its partial transcript
/// can still be exported.
async fn run_conversation(
    config: ConversationConfig,
    client: Arc<dyn CompletionClient>,
    pause_poll: Duration,
) -> Result<Conversation> {
    let mut conversation = Conversation::new(config, client, Arc::new(TerminalObserver::new()))?;
    let handle = conversation.handle();

    print_controls_hint();
    let listener = spawn_key_listener(handle.clone(), pause_poll);

    if let Err(e) = conversation.start().await {
        error!(conversation_id = %conversation.id(), error = %e, "Conversation ended with an error");
        if let Some(hint) = failure_hint(&e) {
            println!("{}", hint.yellow());
        }
    }

    // The listener exits on its own once it sees the stopped state.
    handle.stop();
    match listener.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Key listener failed"),
        Err(e) => warn!(error = %e, "Key listener task panicked"),
    }

    Ok(conversation)
}

/// Extra guidance for failures the user can usually fix themselves.
fn failure_hint(error: &PartyError) -> Option<&'static str> {
    let cause = match error {
        PartyError::ConversationFatal(inner) => inner.as_ref(),
        other => other,
    };
    cause
        .is_request_error()
        .then_some("The completion request failed. Check your API key and network connection.")
}

fn export_conversation(conversation: &Conversation, dir: Option<&Path>) {
    if conversation.transcript().is_empty() {
        println!("{}", "No conversation to export.".yellow());
        return;
    }

    match write_export(&conversation.export(), dir) {
        Ok(path) => {
            info!(path = %path.display(), "Conversation exported");
            println!(
                "{}",
                format!("✓ Conversation exported to {}", path.display()).green()
            );
        }
        Err(e) => println!("{}", format!("Error exporting conversation: {:#}", e).red()),
    }
}

/// Generates a conversation without any prompts and emits its JSON.
pub async fn run_generate(
    args: GenerateArgs,
    api_key: Option<String>,
    config: &PartyConfig,
) -> Result<()> {
    let api_key = resolve_api_key(api_key, config)
        .context("An API key is required: pass --api-key or set GROK_API_KEY")?;
    config.check_roster_size(args.characters.len())?;

    let model = args
        .model
        .unwrap_or_else(|| config.default_model().to_string());
    if find_model(&model).is_none() {
        warn!(model = %model, "Model is not in the known catalogue");
    }
    let roster = args
        .characters
        .iter()
        .enumerate()
        .map(|(index, personality)| {
            Character::new(personality, &model, crate::setup::color_for(index))
        })
        .collect();
    let scene = Scene::new(args.conversation_type, args.topic, args.setting).with_mood(args.mood);

    let conversation_config = ConversationConfig::new(scene, roster, &model)
        .with_party_config(config)
        .with_turn_interval(Duration::ZERO)
        .with_max_turns(args.turns);

    let client = build_client(api_key, config)?;
    let mut conversation = Conversation::new(conversation_config, client, Arc::new(NullObserver))?;
    info!(
        conversation_id = %conversation.id(),
        turns = args.turns,
        "Generating conversation"
    );
    conversation
        .start()
        .await
        .context("Conversation generation failed")?;

    let json = conversation.export().to_json_pretty()?;
    match args.output {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Conversation written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use grokparty_core::Transcript;

    #[test]
    fn test_export_filename() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(
            export_filename(now),
            "grokparty_conversation_20240309_070502.json"
        );
    }

    #[test]
    fn test_failure_hint_for_request_errors() {
        let fatal = PartyError::ConversationFatal(Box::new(PartyError::RequestError {
            status_code: 401,
            body: "invalid key".to_string(),
        }));
        assert!(failure_hint(&fatal).is_some());

        let config = PartyError::ConversationFatal(Box::new(PartyError::config("bad roster")));
        assert!(failure_hint(&config).is_none());
    }

    #[test]
    fn test_write_export_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");

        let mut transcript = Transcript::new();
        transcript.append("Alice", "hello");
        let roster = vec![
            Character::new("Alice", "grok-3", "red"),
            Character::new("Bob", "grok-3", "blue"),
        ];
        let export = transcript.export(&Scene::new("conversation", "anything", "anywhere"), &roster);

        let path = write_export(&export, Some(&target)).unwrap();
        assert!(path.starts_with(&target));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("grokparty_conversation_"));
        assert!(name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["messages"][0]["content"], "hello");
    }
}
