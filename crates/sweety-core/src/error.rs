use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweetyError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SweetyError {
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SweetyError>;
