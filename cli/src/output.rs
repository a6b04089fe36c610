use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use colored::*;
use grokparty_core::{
    Character, ConversationConfig, ConversationObserver, ConversationState, PartyError, Turn,
    AVAILABLE_MODELS,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Writes one line with a carriage return so output stays aligned in raw mode.
pub fn emit(text: &str) {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "{}\r\n", text.replace('\n', "\r\n"));
    let _ = stdout.flush();
}

/// Colour for a character's display tag; unknown names fall back to white.
pub fn tag_color(tag: &str) -> Color {
    Color::from(tag)
}

pub fn print_welcome() {
    println!();
    println!("{}", "🤖 Welcome to GrokParty!".bold());
    println!();
    println!("Choose your characters, set the scene, and watch them interact in real-time!");
    println!();
}

/// Prints the model catalogue as an aligned table
pub fn print_models() {
    let id_width = AVAILABLE_MODELS.iter().map(|m| m.id.len()).max().unwrap_or(0);
    let name_width = AVAILABLE_MODELS.iter().map(|m| m.name.len()).max().unwrap_or(0);

    println!("{}", "Available models:".bold());
    for model in AVAILABLE_MODELS.iter() {
        println!(
            "  {}  {:name_width$}  {}",
            format!("{:id_width$}", model.id).cyan(),
            model.name,
            model.description.dimmed(),
            name_width = name_width,
        );
    }
}

pub fn print_controls_hint() {
    println!();
    println!("{}", "Starting conversation...".green().bold());
    println!("{}", "Press 'p' to pause/resume, 's' to stop".dimmed());
    println!();
}

fn field(label: &str, value: &str) -> String {
    format!("{} {}", format!("{:<13}", label).bold(), value)
}

fn render_conversation_info(config: &ConversationConfig) -> String {
    let participants = config
        .roster
        .iter()
        .map(|c| {
            c.personality()
                .color(tag_color(c.display_tag()))
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(", ");

    let rule = "─".repeat(50).blue().to_string();
    [
        rule.clone(),
        format!("{}", "Conversation Info".blue().bold()),
        field("Type:", &config.scene.conversation_type),
        field("Topic:", &config.scene.topic),
        field("Setting:", &config.scene.setting),
        field("Mood:", &config.scene.mood),
        field("Participants:", &participants),
        rule,
    ]
    .join("\n")
}

fn render_turn(turn: &Turn, character: &Character) -> String {
    let color = tag_color(character.display_tag());
    format!(
        "{} {}\n{}\n",
        "▌".color(color),
        turn.speaker.color(color).bold(),
        turn.content
    )
}

/// Renders conversation events to the terminal.
#[derive(Default)]
pub struct TerminalObserver {
    spinner: Mutex<Option<ProgressBar>>,
    last_state: Mutex<Option<ConversationState>>,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(bar) = spinner.take() {
                bar.finish_and_clear();
            }
        }
    }

    /// Prints without tearing an active spinner.
    fn print_around_spinner(&self, text: &str) {
        match self.spinner.lock() {
            Ok(spinner) => match spinner.as_ref() {
                Some(bar) => bar.suspend(|| emit(text)),
                None => emit(text),
            },
            Err(_) => emit(text),
        }
    }
}

impl ConversationObserver for TerminalObserver {
    fn on_conversation_started(&self, config: &ConversationConfig) {
        emit(&render_conversation_info(config));
        emit("");
    }

    fn on_speaker_thinking(&self, character: &Character) {
        self.clear_spinner();

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!(
            "{} is thinking...",
            character
                .personality()
                .color(tag_color(character.display_tag()))
        ));
        spinner.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn on_turn(&self, turn: &Turn, character: &Character) {
        self.clear_spinner();
        emit(&render_turn(turn, character));
    }

    fn on_state_changed(&self, state: ConversationState) {
        let previous = self
            .last_state
            .lock()
            .ok()
            .and_then(|mut last| last.replace(state));

        let message = match (previous, state) {
            (_, ConversationState::Paused) => {
                "Conversation paused. Press 'p' to resume.".yellow().to_string()
            }
            (Some(ConversationState::Paused), ConversationState::Running) => {
                "Conversation resumed.".green().to_string()
            }
            (_, ConversationState::Stopped) => {
                self.clear_spinner();
                "Conversation stopped.".red().to_string()
            }
            _ => return,
        };
        self.print_around_spinner(&message);
    }

    fn on_error(&self, error: &PartyError) {
        self.clear_spinner();
        emit(&format!("{} {}", "Error in conversation:".red().bold(), error));
    }
}
