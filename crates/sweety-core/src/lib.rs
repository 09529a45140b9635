pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod session;

// Re-export key types
pub use chat::{ChatEvent, ChatReply, ConversationRunner};
pub use config::Settings;
pub use context::{adapt, PromptTemplate, Transcript, Turn, TurnRole};
pub use error::SweetyError;
pub use llm::{LlmClient, Message, OllamaClient, Role, StreamEvent, Usage};
pub use session::{Session, SessionId, SessionStore, DEFAULT_SESSION_ID};
