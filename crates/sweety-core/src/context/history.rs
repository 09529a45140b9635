use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One message of the transcript. Fields are read-only once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    role: TurnRole,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered, append-only list of turns for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn at the end. No validation or deduplication.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in conversation order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of completed user/assistant pairs.
    pub fn rounds(&self) -> usize {
        self.turns
            .chunks(2)
            .filter(|pair| {
                matches!(
                    pair,
                    [a, b] if a.role == TurnRole::User && b.role == TurnRole::Assistant
                )
            })
            .count()
    }

    pub fn estimate_tokens(&self) -> usize {
        self.turns.iter().map(|t| t.text.len() / 4).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("one"));
        transcript.append(Turn::assistant("two"));
        transcript.append(Turn::user("three"));

        let texts: Vec<&str> = transcript.all().iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(transcript.last().map(|t| t.role()), Some(TurnRole::User));
    }

    #[test]
    fn test_append_does_not_deduplicate() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("same"));
        transcript.append(Turn::user("same"));
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_rounds_counts_complete_pairs() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.rounds(), 0);
        transcript.append(Turn::user("hi"));
        assert_eq!(transcript.rounds(), 0);
        transcript.append(Turn::assistant("hello"));
        assert_eq!(transcript.rounds(), 1);
    }

    #[test]
    fn test_estimate_tokens() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("12345678"));
        transcript.append(Turn::assistant("1234"));
        assert_eq!(transcript.estimate_tokens(), 3);
    }
}
