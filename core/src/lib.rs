// Core GrokParty functionality:
// - Completion client for the remote chat endpoint
// - Characters and prompt construction
// - Transcript accumulation and export
// - Speaker selection and the conversation lifecycle controller
// - Configuration loading
// - Shared error types

// Export client module - Completion client for the chat endpoint
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

pub mod character;
pub use character::{Character, Scene};

pub mod transcript;
pub use transcript::{parse_export_line, ConversationExport, ExportedMessage, Transcript, Turn};

pub mod selector;
pub use selector::{parse_decision, SelectionOutcome, SpeakerSelector};

pub mod conversation;
pub use conversation::{
    ControlCommand, Conversation, ConversationConfig, ConversationHandle, ConversationObserver,
    ConversationState, NullObserver,
};

#[cfg(test)]
pub(crate) mod test_utils;
