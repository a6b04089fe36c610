use thiserror::Error;

/// Errors raised while configuring or running a conversation
#[derive(Error, Debug)]
pub enum PartyError {
    /// The completion endpoint answered with a non-success status
    #[error("Request Error: {status_code} - {body}")]
    RequestError { status_code: u16, body: String },

    /// The completion endpoint could not be reached
    #[error("Transport Error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Response Error: {0}")]
    ResponseError(String),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Invalid State: {0}")]
    InvalidState(String),

    /// An error escaped the turn loop and ended the conversation
    #[error("Conversation stopped: {0}")]
    ConversationFatal(#[source] Box<PartyError>),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl PartyError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// True for failures of the completion call itself (status or transport).
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::RequestError { .. } | Self::Transport(_))
    }
}

/// Result type for GrokParty operations
pub type PartyResult<T> = Result<T, PartyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_display() {
        let err = PartyError::RequestError {
            status_code: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Request Error: 429 - rate limited");
        assert!(err.is_request_error());
    }

    #[test]
    fn test_fatal_wraps_source() {
        let inner = PartyError::ResponseError("No choices in response".to_string());
        let err = PartyError::ConversationFatal(Box::new(inner));
        assert!(!err.is_request_error());
        assert!(err.to_string().contains("No choices in response"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
