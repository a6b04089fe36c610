//! Append-only conversation history and its JSON export.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::character::{Character, Scene};
use crate::errors::PartyResult;

/// One produced utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// The `"<speaker>: <content>"` line used in prompts.
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker, self.content)
    }
}

/// Ordered turns of a single conversation. Only ever appended to.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn stamped with the current time and returns it.
    pub fn append(&mut self, speaker: impl Into<String>, content: impl Into<String>) -> &Turn {
        self.turns.push(Turn {
            speaker: speaker.into(),
            content: content.into(),
            timestamp: Utc::now(),
        });
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Newline-joined rendering of every turn, oldest first.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(Turn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Maps the transcript onto the export document.
    ///
    /// Each turn goes through [`parse_export_line`] on its rendered line, so
    /// entries without a recoverable speaker are left out.
    pub fn export(&self, scene: &Scene, roster: &[Character]) -> ConversationExport {
        let messages = self
            .turns
            .iter()
            .filter_map(|turn| {
                parse_export_line(&turn.render()).map(|(speaker, content)| ExportedMessage {
                    speaker,
                    content,
                    timestamp: turn.timestamp.to_rfc3339(),
                })
            })
            .collect();

        ConversationExport {
            conversation_type: scene.conversation_type.clone(),
            topic: scene.topic.clone(),
            setting: scene.setting.clone(),
            participants: roster
                .iter()
                .map(|character| character.personality().to_string())
                .collect(),
            messages,
        }
    }
}

/// Splits a rendered line at its first colon into trimmed speaker and content.
///
/// Returns `None` when there is no colon or it is the first character.
pub fn parse_export_line(line: &str) -> Option<(String, String)> {
    match line.find(':') {
        Some(index) if index > 0 => Some((
            line[..index].trim().to_string(),
            line[index + 1..].trim().to_string(),
        )),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub speaker: String,
    pub content: String,
    pub timestamp: String,
}

/// The flat JSON document written when a conversation is exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationExport {
    #[serde(rename = "type")]
    pub conversation_type: String,
    pub topic: String,
    pub setting: String,
    pub participants: Vec<String>,
    pub messages: Vec<ExportedMessage>,
}

impl ConversationExport {
    pub fn to_json_pretty(&self) -> PartyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document as pretty-printed UTF-8 JSON.
    pub fn write_to(&self, path: &Path) -> PartyResult<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
