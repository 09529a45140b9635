use crate::error::SweetyError;
use crate::llm::traits::*;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Client for a local Ollama server, talking to `/api/chat` directly.
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OllamaClient {
    /// Build a client for `base_url`. Fails if the URL does not parse or the
    /// HTTP client cannot be constructed; no request is made here.
    pub fn try_new(base_url: &str, model: impl Into<String>) -> Result<Self, SweetyError> {
        Self::build(base_url, model.into(), None)
    }

    /// Like [`OllamaClient::try_new`] but with an overall per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SweetyError> {
        Self::build(base_url, model.into(), Some(timeout))
    }

    fn build(base_url: &str, model: String, timeout: Option<Duration>) -> Result<Self, SweetyError> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| SweetyError::Config(format!("Invalid Ollama URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SweetyError::Config(format!(
                "Invalid Ollama URL '{base_url}': expected http or https"
            )));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn request_body<'a>(&'a self, messages: &'a [Message]) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model,
            messages,
            stream: true,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }

    async fn post_chat(&self, body: &OllamaChatRequest<'_>) -> Result<reqwest::Response, SweetyError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SweetyError::Llm(format!("Ollama not reachable at {}: {e}", self.base_url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OllamaErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(SweetyError::Llm(format!("Ollama API error ({status}): {detail}")));
        }

        Ok(response)
    }

    /// Check if Ollama is reachable and responsive.
    pub async fn check_health(&self) -> Result<(), SweetyError> {
        self.list_models().await.map(|_| ()).map_err(|e| {
            SweetyError::Llm(format!(
                "Ollama is not responding at {}. Is it running? ({e})",
                self.base_url
            ))
        })
    }

    /// List the models installed on the Ollama server.
    pub async fn list_models(&self) -> Result<Vec<String>, SweetyError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SweetyError::Llm(format!(
                "Ollama returned {} for /api/tags",
                response.status()
            )));
        }
        let tags: OllamaTags = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChatChunk {
    fn usage(&self) -> Option<Usage> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (input, output) => Some(Usage {
                input_tokens: input.unwrap_or(0),
                output_tokens: output.unwrap_or(0),
            }),
        }
    }
}

/// Translate one NDJSON line of an Ollama chat stream into stream events.
///
/// The returned events end with `Done` or `Error` when the line terminates
/// the stream.
pub(crate) fn events_for_line(line: &str) -> Vec<StreamEvent> {
    let chunk: OllamaChatChunk = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => {
            return vec![StreamEvent::Error(format!(
                "Failed to parse Ollama stream chunk: {e}"
            ))]
        }
    };

    if let Some(error) = chunk.error {
        return vec![StreamEvent::Error(error)];
    }

    let mut events = Vec::new();
    if let Some(ref msg) = chunk.message {
        if !msg.content.is_empty() {
            events.push(StreamEvent::TextDelta(msg.content.clone()));
        }
    }
    if chunk.done {
        if let Some(usage) = chunk.usage() {
            events.push(StreamEvent::Usage(usage));
        }
        events.push(StreamEvent::Done);
    }
    events
}

fn is_terminal(event: &StreamEvent) -> bool {
    matches!(event, StreamEvent::Done | StreamEvent::Error(_))
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>, SweetyError> {
        let body = self.request_body(messages);
        let response = self.post_chat(&body).await?;

        tracing::debug!(model = %self.model, messages = messages.len(), "ollama stream opened");

        let (tx, rx) = mpsc::unbounded();
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            use futures::StreamExt;
            // Bytes, not String: a multi-byte character may straddle two chunks.
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.unbounded_send(StreamEvent::Error(e.to_string()));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    for event in events_for_line(line) {
                        let terminal = is_terminal(&event);
                        let _ = tx.unbounded_send(event);
                        if terminal {
                            return;
                        }
                    }
                }
            }

            // Trailing line without a newline.
            let rest = String::from_utf8_lossy(&buffer);
            let rest = rest.trim();
            if !rest.is_empty() {
                for event in events_for_line(rest) {
                    let terminal = is_terminal(&event);
                    let _ = tx.unbounded_send(event);
                    if terminal {
                        return;
                    }
                }
            }

            let _ = tx.unbounded_send(StreamEvent::Error(
                "Stream ended before the model signalled completion".to_string(),
            ));
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_chunk_yields_delta() {
        let events = events_for_line(
            r#"{"model":"gemma2:2b","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        );
        assert_eq!(events, vec![StreamEvent::TextDelta("Hi".into())]);
    }

    #[test]
    fn test_done_chunk_reports_usage_then_done() {
        let events = events_for_line(
            r#"{"message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":12,"eval_count":3}"#,
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::Usage(Usage {
                    input_tokens: 12,
                    output_tokens: 3
                }),
                StreamEvent::Done,
            ]
        );
    }

    #[test]
    fn test_error_chunk() {
        let events = events_for_line(r#"{"error":"model 'nope' not found"}"#);
        assert_eq!(events, vec![StreamEvent::Error("model 'nope' not found".into())]);
    }

    #[test]
    fn test_garbage_line_is_an_error() {
        let events = events_for_line("not json");
        assert!(matches!(events.as_slice(), [StreamEvent::Error(_)]));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(OllamaClient::try_new("not a url", "gemma2:2b").is_err());
        assert!(OllamaClient::try_new("ftp://localhost:11434", "gemma2:2b").is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = OllamaClient::try_new("http://localhost:11434/", "gemma2:2b").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "gemma2:2b");
        assert_eq!(client.temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_request_body_shape() {
        let client = OllamaClient::try_new(DEFAULT_OLLAMA_URL, "gemma2:2b")
            .unwrap()
            .with_temperature(0.5);
        let messages = vec![Message::system("be nice"), Message::user("Hello")];
        let body = serde_json::to_value(client.request_body(&messages)).unwrap();
        assert_eq!(body["model"], "gemma2:2b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["temperature"], 0.5);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }
}
