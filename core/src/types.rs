use serde::{Deserialize, Serialize};

/// Role of a message in a chat completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message sent to the completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for the chat completions endpoint
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_parameters: Option<SearchParameters>,
}

/// Live search augmentation settings
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchParameters {
    pub mode: String,
    pub return_citations: bool,
    pub max_search_results: u32,
    pub sources: Vec<SearchSource>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
            return_citations: true,
            max_search_results: 10,
            sources: vec![
                SearchSource::country("web", "us"),
                SearchSource::country("news", "us"),
                SearchSource::new("x"),
            ],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl SearchSource {
    pub fn new(source_type: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            country: None,
        }
    }

    pub fn country(source_type: &str, country: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            country: Some(country.to_string()),
        }
    }
}

/// Response from the chat completions endpoint
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// A model offered by the completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const AVAILABLE_MODELS: [ModelInfo; 5] = [
    ModelInfo {
        id: "grok-4",
        name: "Grok 4",
        description: "Latest flagship model",
    },
    ModelInfo {
        id: "grok-3-mini",
        name: "Grok 3 Mini",
        description: "Efficient next-generation model",
    },
    ModelInfo {
        id: "grok-3-fast",
        name: "Grok 3 Fast",
        description: "High-speed processing model",
    },
    ModelInfo {
        id: "grok-3-mini-fast",
        name: "Grok 3 Mini Fast",
        description: "Optimized for speed and efficiency",
    },
    ModelInfo {
        id: "grok-3",
        name: "Grok 3",
        description: "Advanced conversational model",
    },
];

/// Looks up a catalogue entry by model id.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    AVAILABLE_MODELS.iter().find(|model| model.id == id)
}
