mod traits;
mod ollama;

pub use traits::*;
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL, DEFAULT_TEMPERATURE};
