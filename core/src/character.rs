//! Conversation participants and their prompt construction.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{CompletionClient, DEFAULT_TEMPERATURE};
use crate::errors::PartyResult;
use crate::types::ChatMessage;

/// The scene every character is placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Free-form kind of exchange ("debate", "therapy", ...). Treated as opaque text.
    pub conversation_type: String,
    pub topic: String,
    pub setting: String,
    pub mood: String,
}

impl Scene {
    pub const DEFAULT_MOOD: &'static str = "friendly";

    pub fn new(
        conversation_type: impl Into<String>,
        topic: impl Into<String>,
        setting: impl Into<String>,
    ) -> Self {
        Self {
            conversation_type: conversation_type.into(),
            topic: topic.into(),
            setting: setting.into(),
            mood: Self::DEFAULT_MOOD.to_string(),
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = mood.into();
        self
    }
}

/// A role-played participant backed by its own model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    personality: String,
    model: String,
    display_tag: String,
}

impl Character {
    pub fn new(
        personality: impl Into<String>,
        model: impl Into<String>,
        display_tag: impl Into<String>,
    ) -> Self {
        Self {
            personality: personality.into(),
            model: model.into(),
            display_tag: display_tag.into(),
        }
    }

    /// The persona description. Also the name this character is matched by.
    pub fn personality(&self) -> &str {
        &self.personality
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Presentation hint for renderers (a colour name in the terminal app).
    pub fn display_tag(&self) -> &str {
        &self.display_tag
    }

    /// Builds the system + user message pair for this character's next line.
    pub fn build_prompt(&self, history: &str, scene: &Scene) -> Vec<ChatMessage> {
        let system = format!(
            "Assume the personality of {}.\n\
             Roleplay as them and never break character.\n\
             Do not speak as anyone else.\n\
             Your responses should be around one to three sentences long, preferably one.\n\
             Do not preface them with your name.",
            self.personality
        );

        let user = format!(
            "You're the next speaker in a {} about {}.\n\
             The setting is {}.\n\
             The mood is {}.\n\
             Here are the last few messages:\n\
             \n\
             {}\n\
             \n\
             [Stay focused on the main topic, but feel free to explore different aspects of it. \
             Only move to closely related subjects if the current discussion has reached a natural conclusion.]",
            scene.conversation_type, scene.topic, scene.setting, scene.mood, history
        );

        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }

    /// Instruction used in place of history for the very first line.
    pub fn opening_instruction(&self, scene: &Scene, others: &[&str]) -> String {
        format!(
            "start a {} about {} with {}. the setting is {}.",
            scene.conversation_type,
            scene.topic,
            others.join(", "),
            scene.setting
        )
    }

    /// Generates this character's reply using its own model.
    pub async fn respond(
        &self,
        client: &dyn CompletionClient,
        history: &str,
        scene: &Scene,
        search_enabled: bool,
    ) -> PartyResult<String> {
        let messages = self.build_prompt(history, scene);
        debug!(
            speaker = %self.personality,
            model = %self.model,
            "Requesting character reply"
        );
        client
            .complete(&self.model, &messages, DEFAULT_TEMPERATURE, search_enabled)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedClient;
    use crate::types::Role;

    fn scene() -> Scene {
        Scene::new("debate", "tabs versus spaces", "a lighthouse").with_mood("tense")
    }

    #[test]
    fn test_prompt_has_system_then_user() {
        let pirate = Character::new("a grumpy pirate", "grok-3", "red");
        let messages = pirate.build_prompt("Ada: Hello there", &scene());

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);

        assert!(messages[0]
            .content
            .starts_with("Assume the personality of a grumpy pirate."));
        assert!(messages[0].content.contains("never break character"));
        assert!(messages[0].content.contains("Do not preface them with your name."));

        let user = &messages[1].content;
        assert!(user.contains("next speaker in a debate about tabs versus spaces"));
        assert!(user.contains("The setting is a lighthouse."));
        assert!(user.contains("The mood is tense."));
        assert!(user.contains("\n\nAda: Hello there\n\n"));
        assert!(user.contains("natural conclusion"));
    }

    #[test]
    fn test_default_mood() {
        assert_eq!(Scene::new("meeting", "budget", "an office").mood, "friendly");
    }

    #[test]
    fn test_opening_instruction_names_others() {
        let host = Character::new("Ada", "grok-3", "blue");
        let text = host.opening_instruction(&scene(), &["Bob", "Cy"]);
        assert_eq!(
            text,
            "start a debate about tabs versus spaces with Bob, Cy. the setting is a lighthouse."
        );
    }

    #[tokio::test]
    async fn test_respond_uses_own_model() {
        let client = ScriptedClient::new(vec![Ok("Arr.".to_string())]);
        let pirate = Character::new("a grumpy pirate", "grok-3-fast", "red");

        let reply = pirate
            .respond(&client, "history", &scene(), true)
            .await
            .unwrap();

        assert_eq!(reply, "Arr.");
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "grok-3-fast");
        assert_eq!(calls[0].temperature, DEFAULT_TEMPERATURE);
        assert!(calls[0].search_enabled);
        assert_eq!(calls[0].messages.len(), 2);
    }
}
