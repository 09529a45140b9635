mod runner;

pub use runner::{ChatEvent, ChatReply, ConversationRunner};
