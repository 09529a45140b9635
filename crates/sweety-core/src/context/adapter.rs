use super::history::{Turn, TurnRole};
use crate::llm::Message;

/// Turn the transcript into the message history a prompt template consumes.
///
/// Order and roles are carried over one-to-one; calling this twice on the same
/// turns yields equal results.
pub fn adapt(turns: &[Turn]) -> Vec<Message> {
    turns.iter().map(to_message).collect()
}

fn to_message(turn: &Turn) -> Message {
    match turn.role() {
        TurnRole::User => Message::user(turn.text()),
        TurnRole::Assistant => Message::assistant(turn.text()),
    }
}
