use anyhow::{Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input, Password, Select};
use grokparty_core::{find_model, Character, PartyConfig, Scene, AVAILABLE_MODELS};

use crate::output::tag_color;

pub const CONVERSATION_TYPES: [&str; 8] = [
    "conversation",
    "debate",
    "argument",
    "meeting",
    "brainstorming",
    "lighthearted",
    "joking",
    "therapy",
];

/// Display colours handed out to characters in order.
pub const CHARACTER_COLORS: [&str; 6] = ["red", "blue", "green", "yellow", "magenta", "cyan"];

pub const DEFAULT_TOPIC: &str = "anything";
pub const DEFAULT_SETTING: &str = "anywhere";

pub fn color_for(index: usize) -> &'static str {
    CHARACTER_COLORS[index % CHARACTER_COLORS.len()]
}

pub fn default_personality(index: usize) -> String {
    format!("Character {}", index + 1)
}

/// Picks the first non-empty credential from the flag/environment or the config file.
pub fn resolve_api_key(from_args: Option<String>, config: &PartyConfig) -> Option<String> {
    from_args
        .into_iter()
        .chain(config.api_key.clone())
        .find(|key| !key.trim().is_empty())
}

pub fn prompt_api_key() -> Result<String> {
    println!("{}", "Grok API key not found in environment.".yellow());
    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Please enter your Grok API key")
        .interact()
        .context("Failed to read API key")?;
    Ok(key.trim().to_string())
}

/// Everything the user chose for one conversation.
#[derive(Debug, Clone)]
pub struct ConversationSetup {
    pub scene: Scene,
    pub decision_model: String,
    pub roster: Vec<Character>,
}

pub fn prompt_conversation(config: &PartyConfig) -> Result<ConversationSetup> {
    let scene = prompt_scene()?;
    let default_decision = config
        .decision_model
        .as_deref()
        .unwrap_or_else(|| config.default_model());
    let decision_model = prompt_model("Select decision model", default_decision)?;
    let roster = prompt_roster(config)?;
    Ok(ConversationSetup {
        scene,
        decision_model,
        roster,
    })
}

fn prompt_scene() -> Result<Scene> {
    let theme = ColorfulTheme::default();
    let labels: Vec<String> = CONVERSATION_TYPES.iter().map(|t| title_case(t)).collect();
    let choice = Select::with_theme(&theme)
        .with_prompt("Select conversation type")
        .items(&labels)
        .default(0)
        .interact()
        .context("Failed to read conversation type")?;

    let topic: String = Input::with_theme(&theme)
        .with_prompt("What should they talk about?")
        .default(DEFAULT_TOPIC.to_string())
        .interact_text()
        .context("Failed to read topic")?;
    let setting: String = Input::with_theme(&theme)
        .with_prompt("Where is this conversation taking place?")
        .default(DEFAULT_SETTING.to_string())
        .interact_text()
        .context("Failed to read setting")?;
    let mood: String = Input::with_theme(&theme)
        .with_prompt("What is the mood?")
        .default(Scene::DEFAULT_MOOD.to_string())
        .interact_text()
        .context("Failed to read mood")?;

    Ok(Scene::new(CONVERSATION_TYPES[choice], topic, setting).with_mood(mood))
}

fn prompt_model(prompt: &str, default_id: &str) -> Result<String> {
    let labels: Vec<String> = AVAILABLE_MODELS
        .iter()
        .map(|m| format!("{} ({})", m.name, m.description))
        .collect();
    let default = AVAILABLE_MODELS
        .iter()
        .position(|m| m.id == default_id)
        .unwrap_or(0);

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(default)
        .interact()
        .context("Failed to read model choice")?;
    Ok(AVAILABLE_MODELS[choice].id.to_string())
}

fn prompt_roster(config: &PartyConfig) -> Result<Vec<Character>> {
    let theme = ColorfulTheme::default();
    let prompt = match config.max_characters {
        Some(max) => format!("How many characters? (2-{})", max),
        None => "How many characters? (minimum 2)".to_string(),
    };
    let count: usize = Input::with_theme(&theme)
        .with_prompt(prompt)
        .default(2)
        .validate_with(|n: &usize| config.check_roster_size(*n).map_err(|e| e.to_string()))
        .interact_text()
        .context("Failed to read character count")?;

    println!();
    println!("{}", format!("Creating {} characters:", count).bold());

    let mut roster = Vec::with_capacity(count);
    for index in 0..count {
        println!();
        println!("{}", format!("Character {}:", index + 1).bold());

        let personality: String = Input::with_theme(&theme)
            .with_prompt(format!("Describe character {}'s personality", index + 1))
            .default(default_personality(index))
            .interact_text()
            .context("Failed to read personality")?;
        let model = prompt_model(
            &format!("Select model for {}", personality),
            config.default_model(),
        )?;

        let color = color_for(index);
        let model_name = find_model(&model).map_or(model.as_str(), |m| m.name);
        println!(
            "{}",
            format!("✓ {} created with {}", personality, model_name).color(tag_color(color))
        );
        roster.push(Character::new(personality, model, color));
    }

    Ok(roster)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_cycle() {
        assert_eq!(color_for(0), "red");
        assert_eq!(color_for(5), "cyan");
        assert_eq!(color_for(6), "red");
        assert_eq!(color_for(8), "green");
    }

    #[test]
    fn test_default_personality() {
        assert_eq!(default_personality(0), "Character 1");
        assert_eq!(default_personality(2), "Character 3");
    }

    #[test]
    fn test_resolve_api_key_order() {
        let config = PartyConfig {
            api_key: Some("from-config".to_string()),
            ..PartyConfig::default()
        };
        assert_eq!(
            resolve_api_key(Some("from-flag".to_string()), &config).as_deref(),
            Some("from-flag")
        );
        assert_eq!(
            resolve_api_key(Some("  ".to_string()), &config).as_deref(),
            Some("from-config")
        );
        assert_eq!(resolve_api_key(None, &PartyConfig::default()), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("brainstorming"), "Brainstorming");
        assert_eq!(title_case(""), "");
    }
}
