use crate::llm::Message;

/// A chat prompt laid out as: system instruction, then prior history, then the
/// new human input.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system_instruction: String,
}

impl PromptTemplate {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    /// Compose the outbound request. The system message is always first,
    /// even when the instruction is blank.
    pub fn render(&self, history: Vec<Message>, input: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(&self.system_instruction));
        messages.extend(history);
        messages.push(Message::user(input));
        messages
    }
}
