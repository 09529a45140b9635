mod adapter;
mod history;
mod prompt;

pub use adapter::adapt;
pub use history::{Transcript, Turn, TurnRole};
pub use prompt::PromptTemplate;
