use crate::context::{adapt, PromptTemplate, Turn};
use crate::error::SweetyError;
use crate::llm::{LlmClient, StreamEvent, Usage};
use crate::session::{Session, SessionId};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Events emitted while a reply streams in - the shared CLI/UI interface.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Started { session: SessionId },
    TextDelta(String),
    Usage(Usage),
    Complete { reply: String },
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Sends one user message at a time through the prompt template to the model
/// and records the finished round in the session transcript.
///
/// The client is built once by the caller and shared; the runner never
/// constructs one itself.
pub struct ConversationRunner {
    llm: Arc<dyn LlmClient>,
    prompt: PromptTemplate,
}

impl ConversationRunner {
    pub fn new(llm: Arc<dyn LlmClient>, prompt: PromptTemplate) -> Self {
        Self { llm, prompt }
    }

    /// Handle a submission without observing the stream.
    pub async fn run(
        &self,
        session: &mut Session,
        user_text: impl Into<String>,
    ) -> Result<ChatReply, SweetyError> {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        self.handle(session, user_text, tx).await
    }

    /// Handle a submission, relaying fragments through `event_tx` as they
    /// arrive.
    ///
    /// The user turn and the assembled reply are appended to the transcript
    /// only once the backend signals completion. On any failure the
    /// transcript is left as it was.
    pub async fn handle(
        &self,
        session: &mut Session,
        user_text: impl Into<String>,
        event_tx: UnboundedSender<ChatEvent>,
    ) -> Result<ChatReply, SweetyError> {
        let user_text = user_text.into();

        let history = adapt(session.transcript().all());
        let messages = self.prompt.render(history, &user_text);

        tracing::debug!(
            session = %session.id(),
            model = %self.llm.model(),
            messages = messages.len(),
            "submitting chat request"
        );
        let _ = event_tx.send(ChatEvent::Started {
            session: session.id().clone(),
        });

        let mut stream = match self.llm.chat_stream(&messages).await {
            Ok(stream) => stream,
            Err(e) => return Err(fail(&event_tx, e)),
        };

        let mut reply = String::new();
        let mut usage = None;

        loop {
            match stream.next().await {
                Some(StreamEvent::TextDelta(text)) => {
                    reply.push_str(&text);
                    let _ = event_tx.send(ChatEvent::TextDelta(text));
                }
                Some(StreamEvent::Usage(u)) => {
                    usage = Some(u);
                    let _ = event_tx.send(ChatEvent::Usage(u));
                }
                Some(StreamEvent::Done) => break,
                Some(StreamEvent::Error(e)) => {
                    return Err(fail(&event_tx, SweetyError::stream(e)));
                }
                None => {
                    return Err(fail(
                        &event_tx,
                        SweetyError::stream("stream closed before completion"),
                    ));
                }
            }
        }

        let transcript = session.transcript_mut();
        transcript.append(Turn::user(user_text));
        transcript.append(Turn::assistant(reply.clone()));

        let _ = event_tx.send(ChatEvent::Complete {
            reply: reply.clone(),
        });

        Ok(ChatReply {
            content: reply,
            usage,
        })
    }
}

fn fail(event_tx: &UnboundedSender<ChatEvent>, error: SweetyError) -> SweetyError {
    tracing::warn!(%error, "chat request failed; round not recorded");
    let _ = event_tx.send(ChatEvent::Error(error.to_string()));
    error
}
