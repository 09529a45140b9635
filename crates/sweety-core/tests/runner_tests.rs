use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::sync::{Arc, Mutex};
use sweety_core::{
    adapt, ChatEvent, ConversationRunner, LlmClient, Message, PromptTemplate, Role,
    Session, SessionId, StreamEvent, SweetyError, TurnRole, Usage,
};
use tokio::sync::mpsc::unbounded_channel;

const SYSTEM: &str = "You are Sweety.";

/// Mock LLM that replays scripted stream event sequences and records every
/// request it receives.
struct MockLlm {
    responses: Mutex<Vec<Vec<StreamEvent>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    fail_to_connect: bool,
}

impl MockLlm {
    /// Responses are served in the order given.
    fn new(mut responses: Vec<Vec<StreamEvent>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_to_connect: false,
        }
    }

    fn unreachable() -> Self {
        Self {
            fail_to_connect: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    fn model(&self) -> &str {
        "mock"
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
    ) -> Result<UnboundedReceiver<StreamEvent>, SweetyError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if self.fail_to_connect {
            return Err(SweetyError::Llm("connection refused".into()));
        }

        let events = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| vec![StreamEvent::Done]);

        let (tx, rx) = unbounded();
        for event in events {
            tx.unbounded_send(event).unwrap();
        }
        Ok(rx)
    }
}

fn reply(parts: &[&str]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = parts
        .iter()
        .map(|p| StreamEvent::TextDelta(p.to_string()))
        .collect();
    events.push(StreamEvent::Done);
    events
}

fn runner_with(mock: MockLlm) -> (ConversationRunner, Arc<Mutex<Vec<Vec<Message>>>>) {
    let requests = mock.requests.clone();
    let runner = ConversationRunner::new(Arc::new(mock), PromptTemplate::new(SYSTEM));
    (runner, requests)
}

#[tokio::test]
async fn test_first_message_has_no_prior_history() {
    let (runner, requests) = runner_with(MockLlm::new(vec![reply(&["Hi ", "there", " 💖"])]));
    let mut session = Session::new(SessionId::default());

    let answer = runner.run(&mut session, "Hello").await.unwrap();
    assert_eq!(answer.content, "Hi there 💖");

    let sent = requests.lock().unwrap()[0].clone();
    assert_eq!(sent, vec![Message::system(SYSTEM), Message::user("Hello")]);

    let turns = session.transcript().all();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role(), TurnRole::User);
    assert_eq!(turns[0].text(), "Hello");
    assert_eq!(turns[1].role(), TurnRole::Assistant);
    assert_eq!(turns[1].text(), "Hi there 💖");
}

#[tokio::test]
async fn test_second_message_carries_first_round() {
    let (runner, requests) = runner_with(MockLlm::new(vec![
        reply(&["Hi!"]),
        reply(&["Great, thanks!"]),
    ]));
    let mut session = Session::new(SessionId::default());

    runner.run(&mut session, "Hello").await.unwrap();
    runner.run(&mut session, "How are you?").await.unwrap();

    let sent = requests.lock().unwrap()[1].clone();
    assert_eq!(
        sent,
        vec![
            Message::system(SYSTEM),
            Message::user("Hello"),
            Message::assistant("Hi!"),
            Message::user("How are you?"),
        ]
    );
}

#[tokio::test]
async fn test_n_rounds_give_2n_alternating_turns() {
    let inputs = ["one", "two", "three", "four"];
    let replies: Vec<Vec<StreamEvent>> = inputs
        .iter()
        .map(|i| reply(&["re: ", *i]))
        .collect();
    let (runner, _) = runner_with(MockLlm::new(replies));
    let mut session = Session::new(SessionId::default());

    for input in inputs {
        runner.run(&mut session, input).await.unwrap();
    }

    let turns = session.transcript().all();
    assert_eq!(turns.len(), 2 * inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        assert_eq!(turns[2 * i].role(), TurnRole::User);
        assert_eq!(turns[2 * i].text(), *input);
        assert_eq!(turns[2 * i + 1].role(), TurnRole::Assistant);
        assert_eq!(turns[2 * i + 1].text(), format!("re: {input}"));
    }
    assert_eq!(session.transcript().rounds(), inputs.len());
}

#[tokio::test]
async fn test_mid_stream_error_keeps_previous_rounds_only() {
    let (runner, _) = runner_with(MockLlm::new(vec![
        reply(&["Hi!"]),
        vec![
            StreamEvent::TextDelta("I am".into()),
            StreamEvent::Error("connection reset".into()),
        ],
    ]));
    let mut session = Session::new(SessionId::default());

    runner.run(&mut session, "Hello").await.unwrap();
    let err = runner.run(&mut session, "How are you?").await.unwrap_err();
    assert!(matches!(err, SweetyError::Stream(_)));

    let texts: Vec<&str> = session.transcript().all().iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["Hello", "Hi!"]);
}

#[tokio::test]
async fn test_stream_closed_without_done_is_an_error() {
    let (runner, _) = runner_with(MockLlm::new(vec![vec![StreamEvent::TextDelta(
        "partial".into(),
    )]]));
    let mut session = Session::new(SessionId::default());

    let err = runner.run(&mut session, "Hello").await.unwrap_err();
    assert!(matches!(err, SweetyError::Stream(_)));
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_propagates() {
    let (runner, _) = runner_with(MockLlm::unreachable());
    let mut session = Session::new(SessionId::default());
    let (tx, mut rx) = unbounded_channel();

    let err = runner.handle(&mut session, "Hello", tx).await.unwrap_err();
    assert!(matches!(err, SweetyError::Llm(_)));
    assert!(session.transcript().is_empty());

    assert!(matches!(rx.recv().await, Some(ChatEvent::Started { .. })));
    assert!(matches!(rx.recv().await, Some(ChatEvent::Error(_))));
}

#[tokio::test]
async fn test_events_relay_fragments_in_order() {
    let usage = Usage {
        input_tokens: 10,
        output_tokens: 2,
    };
    let (runner, _) = runner_with(MockLlm::new(vec![vec![
        StreamEvent::TextDelta("Hel".into()),
        StreamEvent::TextDelta("lo".into()),
        StreamEvent::Usage(usage),
        StreamEvent::Done,
    ]]));
    let mut session = Session::new(SessionId::new("events"));
    let (tx, mut rx) = unbounded_channel();

    let answer = runner.handle(&mut session, "Hi", tx).await.unwrap();
    assert_eq!(answer.usage, Some(usage));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            ChatEvent::Started {
                session: SessionId::new("events")
            },
            ChatEvent::TextDelta("Hel".into()),
            ChatEvent::TextDelta("lo".into()),
            ChatEvent::Usage(usage),
            ChatEvent::Complete {
                reply: "Hello".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_adapter_is_order_preserving_and_idempotent() {
    let (runner, _) = runner_with(MockLlm::new(vec![reply(&["a1"]), reply(&["a2"])]));
    let mut session = Session::new(SessionId::default());
    runner.run(&mut session, "u1").await.unwrap();
    runner.run(&mut session, "u2").await.unwrap();

    let first = adapt(session.transcript().all());
    let second = adapt(session.transcript().all());
    assert_eq!(first, second);

    let pairs: Vec<(Role, &str)> = first
        .iter()
        .map(|m| (m.role.clone(), m.content.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Role::User, "u1"),
            (Role::Assistant, "a1"),
            (Role::User, "u2"),
            (Role::Assistant, "a2"),
        ]
    );
}

#[tokio::test]
async fn test_empty_reply_is_still_recorded() {
    let (runner, _) = runner_with(MockLlm::new(vec![vec![StreamEvent::Done]]));
    let mut session = Session::new(SessionId::default());
    let answer = runner.run(&mut session, "Hello").await.unwrap();
    assert_eq!(answer.content, "");
    assert_eq!(session.transcript().len(), 2);
}
