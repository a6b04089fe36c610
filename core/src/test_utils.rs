use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::CompletionClient;
use crate::errors::{PartyError, PartyResult};
use crate::types::ChatMessage;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub search_enabled: bool,
}

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Completion client that replays queued results and records every call.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<PartyResult<String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
    hook: Option<CallHook>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<PartyResult<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
            hook: None,
        }
    }

    /// Answers every call that has no queued result with `reply`.
    pub fn repeating(reply: &str) -> Self {
        let mut client = Self::new(Vec::new());
        client.fallback = Some(reply.to_string());
        client
    }

    /// Runs `hook` with the zero-based call index before each call returns.
    pub fn with_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        search_enabled: bool,
    ) -> PartyResult<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
                temperature,
                search_enabled,
            });
            calls.len() - 1
        };

        if let Some(hook) = &self.hook {
            hook(index);
        }

        let next = self.responses.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(reply)) => Ok(reply.clone()),
            (None, None) => Err(PartyError::RequestError {
                status_code: 500,
                body: "script exhausted".to_string(),
            }),
        }
    }
}
