//! Conversation lifecycle controller.
//!
//! A [`Conversation`] owns the transcript and drives the turn loop. Control
//! commands arrive through a cloneable [`ConversationHandle`], typically held
//! by a task listening for user input. Both sides share the lifecycle state
//! through a `watch` channel so the loop can sleep until the state changes
//! while paused.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::character::{Character, Scene};
use crate::client::CompletionClient;
use crate::config::{PartyConfig, DEFAULT_TURN_INTERVAL_MS};
use crate::errors::{PartyError, PartyResult};
use crate::selector::SpeakerSelector;
use crate::transcript::{ConversationExport, Transcript, Turn};

/// Lifecycle of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationState {
    Idle,
    Running,
    Paused,
    /// Terminal.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

impl ConversationState {
    /// Transition table. `None` means the command is a no-op in this state.
    pub fn apply(self, command: ControlCommand) -> Option<ConversationState> {
        use ConversationState::*;
        match (self, command) {
            (Idle, ControlCommand::Start) => Some(Running),
            (Running, ControlCommand::Pause) => Some(Paused),
            (Paused, ControlCommand::Resume) => Some(Running),
            (Running | Paused, ControlCommand::Stop) => Some(Stopped),
            _ => None,
        }
    }

    pub fn is_stopped(self) -> bool {
        self == ConversationState::Stopped
    }
}

/// Receives conversation events, e.g. to render them.
#[allow(unused_variables)]
pub trait ConversationObserver: Send + Sync {
    fn on_conversation_started(&self, config: &ConversationConfig) {}

    /// A speaker was chosen and their reply has been requested.
    fn on_speaker_thinking(&self, character: &Character) {}

    fn on_turn(&self, turn: &Turn, character: &Character) {}

    fn on_state_changed(&self, state: ConversationState) {}

    /// The conversation is ending because of `error`.
    fn on_error(&self, error: &PartyError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ConversationObserver for NullObserver {}

/// Everything needed to set up one conversation.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub scene: Scene,
    pub roster: Vec<Character>,
    /// Model used for speaker-selection queries.
    pub decision_model: String,
    /// Stop after this many turns, the opening line included.
    pub max_turns: Option<usize>,
    /// Delay between turns so a human can follow along.
    pub turn_interval: Duration,
    /// Whether character replies may use live search.
    pub character_search: bool,
}

impl ConversationConfig {
    pub fn new(scene: Scene, roster: Vec<Character>, decision_model: impl Into<String>) -> Self {
        Self {
            scene,
            roster,
            decision_model: decision_model.into(),
            max_turns: None,
            turn_interval: Duration::from_millis(DEFAULT_TURN_INTERVAL_MS),
            character_search: true,
        }
    }

    /// Applies pacing and search settings from the application config.
    pub fn with_party_config(mut self, config: &PartyConfig) -> Self {
        self.turn_interval = config.turn_interval();
        self.character_search = config.character_search_enabled();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_turn_interval(mut self, turn_interval: Duration) -> Self {
        self.turn_interval = turn_interval;
        self
    }

    pub fn validate(&self) -> PartyResult<()> {
        if self.roster.len() < 2 {
            return Err(PartyError::config(format!(
                "A conversation needs at least 2 characters, got {}",
                self.roster.len()
            )));
        }
        if self.max_turns == Some(0) {
            return Err(PartyError::config("max_turns must be at least 1"));
        }
        Ok(())
    }
}

struct ControlState {
    state: watch::Sender<ConversationState>,
    observer: Arc<dyn ConversationObserver>,
}

/// Cloneable control surface for a running conversation.
#[derive(Clone)]
pub struct ConversationHandle {
    inner: Arc<ControlState>,
}

impl ConversationHandle {
    fn new(observer: Arc<dyn ConversationObserver>) -> Self {
        let (state, _) = watch::channel(ConversationState::Idle);
        Self {
            inner: Arc::new(ControlState { state, observer }),
        }
    }

    pub fn state(&self) -> ConversationState {
        *self.inner.state.borrow()
    }

    /// Applies `command`, returning whether the state changed.
    ///
    /// `Start` only comes from [`Conversation::start`], so outside callers go
    /// through `pause`, `resume` and `stop`.
    fn send(&self, command: ControlCommand) -> bool {
        let mut next = None;
        self.inner.state.send_if_modified(|state| match state.apply(command) {
            Some(new_state) => {
                *state = new_state;
                next = Some(new_state);
                true
            }
            None => false,
        });

        match next {
            Some(state) => {
                info!(?command, ?state, "Conversation state changed");
                self.inner.observer.on_state_changed(state);
                true
            }
            None => {
                debug!(?command, current = ?self.state(), "Ignoring control command");
                false
            }
        }
    }

    pub fn pause(&self) -> bool {
        self.send(ControlCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(ControlCommand::Resume)
    }

    pub fn stop(&self) -> bool {
        self.send(ControlCommand::Stop)
    }

    /// Pauses a running conversation or resumes a paused one.
    pub fn toggle_pause(&self) -> bool {
        match self.state() {
            ConversationState::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.inner.state.subscribe()
    }
}

/// Drives one turn-based roleplay from the opening line until stopped.
pub struct Conversation {
    id: Uuid,
    config: ConversationConfig,
    client: Arc<dyn CompletionClient>,
    selector: SpeakerSelector,
    transcript: Transcript,
    current_speaker: Option<usize>,
    handle: ConversationHandle,
    observer: Arc<dyn ConversationObserver>,
    rng: StdRng,
}

impl Conversation {
    pub fn new(
        config: ConversationConfig,
        client: Arc<dyn CompletionClient>,
        observer: Arc<dyn ConversationObserver>,
    ) -> PartyResult<Self> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            selector: SpeakerSelector::new(config.decision_model.clone()),
            config,
            client,
            transcript: Transcript::new(),
            current_speaker: None,
            handle: ConversationHandle::new(observer.clone()),
            observer,
            rng: StdRng::from_entropy(),
        })
    }

    /// Replaces the random source, e.g. for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn handle(&self) -> ConversationHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> ConversationState {
        self.handle.state()
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn export(&self) -> ConversationExport {
        self.transcript.export(&self.config.scene, &self.config.roster)
    }

    /// Runs the conversation until it is stopped.
    ///
    /// Produces the opening turn, then keeps taking turns while running. An
    /// error while producing a turn stops the conversation and is returned as
    /// [`PartyError::ConversationFatal`].
    pub async fn start(&mut self) -> PartyResult<()> {
        if !self.handle.send(ControlCommand::Start) {
            return Err(PartyError::invalid_state(format!(
                "Conversation cannot start from {:?}",
                self.state()
            )));
        }

        info!(
            conversation_id = %self.id,
            participants = self.config.roster.len(),
            decision_model = %self.selector.decision_model(),
            conversation_type = %self.config.scene.conversation_type,
            "Starting conversation"
        );
        self.observer.on_conversation_started(&self.config);

        let result = match self.open().await {
            Ok(()) => self.continue_conversation().await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            error!(conversation_id = %self.id, error = %e, "Error in conversation loop");
            self.handle.stop();
            self.observer.on_error(&e);
            return Err(PartyError::ConversationFatal(Box::new(e)));
        }

        info!(
            conversation_id = %self.id,
            turns = self.transcript.len(),
            "Conversation finished"
        );
        Ok(())
    }

    async fn open(&mut self) -> PartyResult<()> {
        let index = self.rng.gen_range(0..self.config.roster.len());
        let first = &self.config.roster[index];

        let others: Vec<&str> = self
            .config
            .roster
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, character)| character.personality())
            .collect();
        let intro = first.opening_instruction(&self.config.scene, &others);

        self.take_turn(index, &intro).await
    }

    async fn continue_conversation(&mut self) -> PartyResult<()> {
        let mut state_rx = self.handle.subscribe();

        loop {
            if wait_while_paused(&mut state_rx).await.is_stopped() {
                break;
            }

            if self.turn_limit_reached() {
                info!(conversation_id = %self.id, "Turn limit reached");
                self.handle.stop();
                break;
            }

            if !self.config.turn_interval.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.turn_interval) => {}
                    _ = wait_until_stopped(&mut state_rx) => {}
                }
            }

            match self.state() {
                ConversationState::Stopped => break,
                ConversationState::Paused => continue,
                _ => {}
            }

            let next = self
                .selector
                .select_next(
                    self.client.as_ref(),
                    &self.config.scene.conversation_type,
                    &self.config.roster,
                    &self.transcript,
                    self.current_speaker,
                    &mut self.rng,
                )
                .await?;

            // A pause that landed during the decision query holds the reply back too.
            match self.state() {
                ConversationState::Stopped => break,
                ConversationState::Paused => continue,
                _ => {}
            }

            let history = self.transcript.render();
            self.take_turn(next, &history).await?;
        }

        Ok(())
    }

    /// Asks the character at `index` for a line and appends it.
    ///
    /// A reply that arrives after the conversation was stopped is dropped.
    async fn take_turn(&mut self, index: usize, history: &str) -> PartyResult<()> {
        let character = &self.config.roster[index];
        self.observer.on_speaker_thinking(character);

        let reply = character
            .respond(
                self.client.as_ref(),
                history,
                &self.config.scene,
                self.config.character_search,
            )
            .await?;

        if self.state().is_stopped() {
            debug!(
                conversation_id = %self.id,
                speaker = %character.personality(),
                "Discarding reply received after stop"
            );
            return Ok(());
        }

        self.current_speaker = Some(index);
        let number = self.transcript.len() + 1;
        let turn = self.transcript.append(character.personality(), reply);
        debug!(
            conversation_id = %self.id,
            speaker = %turn.speaker,
            turn = number,
            "Turn produced"
        );
        self.observer.on_turn(turn, character);
        Ok(())
    }

    fn turn_limit_reached(&self) -> bool {
        self.config
            .max_turns
            .is_some_and(|max| self.transcript.len() >= max)
    }
}

/// Waits until the state is anything but paused and returns it.
async fn wait_while_paused(rx: &mut watch::Receiver<ConversationState>) -> ConversationState {
    loop {
        let state = *rx.borrow_and_update();
        if state != ConversationState::Paused {
            return state;
        }
        if rx.changed().await.is_err() {
            return state;
        }
    }
}

async fn wait_until_stopped(rx: &mut watch::Receiver<ConversationState>) {
    while !rx.borrow_and_update().is_stopped() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
