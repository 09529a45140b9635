use crate::error::SweetyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Events emitted during streaming LLM responses.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    Usage(Usage),
    Done,
    Error(String),
}

/// The LLM client trait. Replies are always streamed.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send a chat request and get a stream of events.
    ///
    /// A well-behaved stream ends with exactly one `Done` or one `Error`.
    async fn chat_stream(
        &self,
        messages: &[Message],
    ) -> Result<futures::channel::mpsc::UnboundedReceiver<StreamEvent>, SweetyError>;
}
