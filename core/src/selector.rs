//! Next-speaker selection.
//!
//! Two participants simply alternate. Larger rosters ask the decision model
//! who should speak next and fall back to a random other participant when the
//! answer is unusable or the call fails.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::character::Character;
use crate::client::{CompletionClient, DECISION_TEMPERATURE};
use crate::errors::{PartyError, PartyResult};
use crate::transcript::Transcript;
use crate::types::ChatMessage;

/// Result of reading the decision model's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Index into the roster of the named character.
    Matched(usize),
    Fallback,
}

/// Reads a `"<name>|<reason>"` answer and finds the named character.
///
/// The name must equal a personality exactly after trimming; anything else is
/// a fallback.
pub fn parse_decision(response: &str, roster: &[Character]) -> SelectionOutcome {
    let name = response.split('|').next().unwrap_or_default().trim();
    roster
        .iter()
        .position(|character| character.personality() == name)
        .map_or(SelectionOutcome::Fallback, SelectionOutcome::Matched)
}

#[derive(Debug, Clone)]
pub struct SpeakerSelector {
    decision_model: String,
}

impl SpeakerSelector {
    pub fn new(decision_model: impl Into<String>) -> Self {
        Self {
            decision_model: decision_model.into(),
        }
    }

    pub fn decision_model(&self) -> &str {
        &self.decision_model
    }

    /// Meta-query asking the decision model for the next speaker.
    pub fn build_decision_prompt(
        &self,
        conversation_type: &str,
        roster: &[Character],
        transcript: &Transcript,
    ) -> Vec<ChatMessage> {
        let names = roster
            .iter()
            .map(Character::personality)
            .collect::<Vec<_>>()
            .join(", ");

        vec![ChatMessage::user(format!(
            "Based on this {} history and listed participants,\n\
             reply with the name of the most likely next speaker as it appears before their line\n\
             and an explanation of your reasoning in the format of \"<name>|<reason>\" and nothing else.\n\
             Avoid a round-robin style conversation.\n\
             \n\
             Participant names: {}\n\
             \n\
             {}\n",
            conversation_type,
            names,
            transcript.render()
        ))]
    }

    /// Picks the roster index of the next speaker.
    pub async fn select_next<R: Rng + Send>(
        &self,
        client: &dyn CompletionClient,
        conversation_type: &str,
        roster: &[Character],
        transcript: &Transcript,
        current: Option<usize>,
        rng: &mut R,
    ) -> PartyResult<usize> {
        if roster.len() < 2 {
            return Err(PartyError::config(
                "Speaker selection needs at least 2 characters",
            ));
        }

        if roster.len() == 2 {
            return Ok(match current {
                Some(index) => 1 - index.min(1),
                None => 0,
            });
        }

        let messages = self.build_decision_prompt(conversation_type, roster, transcript);
        let outcome = match client
            .complete(&self.decision_model, &messages, DECISION_TEMPERATURE, false)
            .await
        {
            Ok(response) => {
                let outcome = parse_decision(&response, roster);
                if outcome == SelectionOutcome::Fallback {
                    debug!(response = %response, "Decision did not name a participant");
                }
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Error determining next speaker");
                SelectionOutcome::Fallback
            }
        };

        match outcome {
            SelectionOutcome::Matched(index) => Ok(index),
            SelectionOutcome::Fallback => Ok(Self::random_other(roster.len(), current, rng)),
        }
    }

    /// Uniform choice among every index except `current`.
    fn random_other<R: Rng>(len: usize, current: Option<usize>, rng: &mut R) -> usize {
        let candidates: Vec<usize> = (0..len).filter(|&i| Some(i) != current).collect();
        // len >= 2, so at least one candidate remains
        *candidates.choose(rng).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedClient;
    use crate::types::Role;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trio() -> Vec<Character> {
        vec![
            Character::new("Ada", "grok-3", "red"),
            Character::new("Bob", "grok-3", "blue"),
            Character::new("Cy", "grok-3", "green"),
        ]
    }

    fn transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.append("Ada", "Shall we begin?");
        transcript
    }

    #[test]
    fn test_parse_decision() {
        let roster = trio();
        assert_eq!(
            parse_decision("Bob|he was asked a question", &roster),
            SelectionOutcome::Matched(1)
        );
        assert_eq!(
            parse_decision("  Cy  | quiet so far", &roster),
            SelectionOutcome::Matched(2)
        );
        assert_eq!(parse_decision("Cy", &roster), SelectionOutcome::Matched(2));
        assert_eq!(
            parse_decision("bob|wrong case", &roster),
            SelectionOutcome::Fallback
        );
        assert_eq!(
            parse_decision("Bob.|punctuation", &roster),
            SelectionOutcome::Fallback
        );
        assert_eq!(parse_decision("", &roster), SelectionOutcome::Fallback);
    }

    #[tokio::test]
    async fn test_pair_alternates_without_calls() {
        let roster = vec![
            Character::new("Ada", "grok-3", "red"),
            Character::new("Bob", "grok-3", "blue"),
        ];
        let client = ScriptedClient::new(Vec::new());
        let selector = SpeakerSelector::new("grok-3-mini");
        let mut rng = StdRng::seed_from_u64(7);

        let mut current = Some(0);
        for _ in 0..6 {
            let next = selector
                .select_next(&client, "chat", &roster, &transcript(), current, &mut rng)
                .await
                .unwrap();
            assert_ne!(Some(next), current);
            current = Some(next);
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_decision_query_parameters() {
        let client = ScriptedClient::new(vec![Ok("Cy|has not spoken".to_string())]);
        let selector = SpeakerSelector::new("grok-3-mini");
        assert_eq!(selector.decision_model(), "grok-3-mini");
        let mut rng = StdRng::seed_from_u64(7);

        let next = selector
            .select_next(&client, "meeting", &trio(), &transcript(), Some(0), &mut rng)
            .await
            .unwrap();
        assert_eq!(next, 2);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "grok-3-mini");
        assert_eq!(calls[0].temperature, DECISION_TEMPERATURE);
        assert!(!calls[0].search_enabled);
        assert_eq!(calls[0].messages.len(), 1);
        assert_eq!(calls[0].messages[0].role, Role::User);

        let prompt = &calls[0].messages[0].content;
        assert!(prompt.contains("Based on this meeting history"));
        assert!(prompt.contains("Participant names: Ada, Bob, Cy"));
        assert!(prompt.contains("Ada: Shall we begin?"));
        assert!(prompt.contains("Avoid a round-robin"));
    }

    #[tokio::test]
    async fn test_mismatch_never_reselects_current() {
        let selector = SpeakerSelector::new("grok-3-mini");
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..25 {
            let client = ScriptedClient::new(vec![Ok("Dave|not invited".to_string())]);
            let next = selector
                .select_next(&client, "chat", &trio(), &transcript(), Some(1), &mut rng)
                .await
                .unwrap();
            assert_ne!(next, 1);
        }
    }

    #[tokio::test]
    async fn test_failed_call_falls_back() {
        let selector = SpeakerSelector::new("grok-3-mini");
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..25 {
            let client = ScriptedClient::new(vec![Err(PartyError::RequestError {
                status_code: 503,
                body: "unavailable".to_string(),
            })]);
            let next = selector
                .select_next(&client, "chat", &trio(), &transcript(), Some(2), &mut rng)
                .await
                .unwrap();
            assert!(next < 2);
        }
    }

    #[tokio::test]
    async fn test_single_character_is_rejected() {
        let selector = SpeakerSelector::new("grok-3-mini");
        let client = ScriptedClient::new(Vec::new());
        let roster = vec![Character::new("Ada", "grok-3", "red")];
        let mut rng = StdRng::seed_from_u64(1);

        let result = selector
            .select_next(&client, "chat", &roster, &transcript(), None, &mut rng)
            .await;
        assert!(matches!(result, Err(PartyError::ConfigError(_))));
    }
}
