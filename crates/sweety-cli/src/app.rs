use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Terminal,
};
use std::io::{self, Write};
use std::sync::Arc;
use sweety_core::{
    ChatEvent, ConversationRunner, OllamaClient, SessionId, SessionStore, Settings,
};
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};
use crate::theme::Theme;

/// Appended to a reply while it is still streaming in.
const STREAM_CURSOR: &str = "▌";

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(runner: &ConversationRunner, prompt: &str) -> Result<()> {
    let mut sessions = SessionStore::new();
    let session = sessions.start(SessionId::default());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ChatEvent>();

    let printer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(event) = event_rx.recv().await {
            match event {
                ChatEvent::TextDelta(text) => {
                    print!("{text}");
                    let _ = stdout.flush();
                }
                // The error itself is reported by main.
                ChatEvent::Complete { .. } | ChatEvent::Error(_) => println!(),
                _ => {}
            }
        }
    });

    let result = runner.handle(session, prompt, event_tx).await;
    printer.await?;
    result?;
    Ok(())
}

// ── Conversation worker ─────────────────────────────────────────────────

/// Requests from the UI. The worker handles them one at a time, so a
/// submission always drains its stream before the next one starts.
enum WorkerRequest {
    Submit(String),
    NewSession,
    Inspect,
}

enum WorkerEvent {
    Chat(ChatEvent),
    SessionStarted(SessionId),
    Summary(SessionSummary),
    Notice(String),
}

struct SessionSummary {
    id: SessionId,
    turns: usize,
    rounds: usize,
    tokens: usize,
    started_at: String,
}

async fn run_worker(
    runner: ConversationRunner,
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    let mut sessions = SessionStore::new();
    let mut current = SessionId::default();
    sessions.start(current.clone());
    let _ = events.send(WorkerEvent::SessionStarted(current.clone()));

    while let Some(request) = requests.recv().await {
        match request {
            WorkerRequest::Submit(text) => {
                let Some(session) = sessions.get_mut(&current) else {
                    continue;
                };

                let (chat_tx, mut chat_rx) = mpsc::unbounded_channel();
                let forward_to = events.clone();
                let forward = tokio::spawn(async move {
                    while let Some(ev) = chat_rx.recv().await {
                        if forward_to.send(WorkerEvent::Chat(ev)).is_err() {
                            break;
                        }
                    }
                });

                // Failures reach the UI as ChatEvent::Error.
                let _ = runner.handle(session, text, chat_tx).await;
                let _ = forward.await;
            }
            WorkerRequest::NewSession => {
                sessions.end(&current);
                current = SessionId::generate();
                sessions.start(current.clone());
                let _ = events.send(WorkerEvent::SessionStarted(current.clone()));
            }
            WorkerRequest::Inspect => {
                if let Some(session) = sessions.get(&current) {
                    let transcript = session.transcript();
                    let _ = events.send(WorkerEvent::Summary(SessionSummary {
                        id: current.clone(),
                        turns: transcript.len(),
                        rounds: transcript.rounds(),
                        tokens: transcript.estimate_tokens(),
                        started_at: session
                            .started_at()
                            .with_timezone(&chrono::Local)
                            .format("%H:%M")
                            .to_string(),
                    }));
                }
            }
        }
    }

    sessions.end(&current);
}

// ── Interactive TUI ─────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Clone)]
struct ChatMessage {
    role: MessageRole,
    content: String,
    timestamp: String,
    /// Reply still arriving; rendered with the stream cursor.
    streaming: bool,
}

struct AppState {
    // Input
    input: String,
    /// Cursor position in chars, not bytes.
    cursor_pos: usize,
    input_history: Vec<String>,
    history_pos: Option<usize>,

    // Chat
    messages: Vec<ChatMessage>,
    scroll_offset: usize,

    // Processing state
    is_processing: bool,

    // Status
    status_text: String,
    model_name: String,
    base_url: String,
    temperature: f32,
    session_id: Option<SessionId>,
    turns: usize,
    total_tokens_in: u64,
    total_tokens_out: u64,

    // Display
    persona_name: String,
    title: String,
    caption: String,
    should_quit: bool,
    theme: Theme,
}

impl AppState {
    fn new(settings: &Settings) -> Self {
        let mut state = Self {
            input: String::new(),
            cursor_pos: 0,
            input_history: Vec::new(),
            history_pos: None,

            messages: Vec::new(),
            scroll_offset: 0,

            is_processing: false,

            status_text: "Ready".into(),
            model_name: settings.llm.model.clone(),
            base_url: settings.llm.base_url.clone(),
            temperature: settings.llm.temperature,
            session_id: None,
            turns: 0,
            total_tokens_in: 0,
            total_tokens_out: 0,

            persona_name: settings.persona.name.clone(),
            title: settings.persona.title.clone(),
            caption: settings.persona.caption.clone(),
            should_quit: false,
            theme: Theme::by_name(&settings.ui.theme),
        };
        state.add_message(
            MessageRole::System,
            "Type a message and press Enter. /help for commands, Ctrl+C to quit.".into(),
        );
        state
    }

    fn add_message(&mut self, role: MessageRole, content: String) {
        self.messages.push(ChatMessage {
            role,
            content,
            timestamp: now_str(),
            streaming: false,
        });
        self.scroll_to_bottom();
    }

    fn streaming_reply(&mut self) -> Option<&mut ChatMessage> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && m.streaming)
    }

    fn scroll_to_bottom(&mut self) {
        // Will be resolved on next draw
        self.scroll_offset = usize::MAX;
    }

    fn push_history(&mut self, input: String) {
        if !input.is_empty() && self.input_history.last() != Some(&input) {
            self.input_history.push(input);
        }
        self.history_pos = None;
    }

    fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => self.input_history.len().saturating_sub(1),
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        self.input = self.input_history[pos].clone();
        self.cursor_pos = self.input.chars().count();
    }

    fn history_next(&mut self) {
        let Some(pos) = self.history_pos else {
            return;
        };
        if pos + 1 >= self.input_history.len() {
            self.history_pos = None;
            self.input.clear();
            self.cursor_pos = 0;
        } else {
            self.history_pos = Some(pos + 1);
            self.input = self.input_history[pos + 1].clone();
            self.cursor_pos = self.input.chars().count();
        }
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }
}

pub async fn run_tui(
    settings: Settings,
    runner: ConversationRunner,
    ollama: Arc<OllamaClient>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &settings, runner, ollama).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    settings: &Settings,
    runner: ConversationRunner,
    ollama: Arc<OllamaClient>,
) -> Result<()> {
    let mut state = AppState::new(settings);

    let (request_tx, request_rx) = mpsc::unbounded_channel::<WorkerRequest>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkerEvent>();

    tokio::spawn(run_worker(runner, request_rx, event_tx.clone()));
    tokio::spawn(check_backend(ollama.clone(), event_tx.clone()));

    loop {
        terminal.draw(|f| draw_ui(f, &mut state))?;

        // Process worker events (non-blocking)
        while let Ok(worker_event) = event_rx.try_recv() {
            handle_worker_event(&mut state, worker_event);
        }

        // Handle keyboard input with timeout
        if event::poll(std::time::Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut state, key, &request_tx, &ollama, &event_tx);
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

/// Report early when the endpoint is down or the model is missing; the first
/// message would fail anyway, but with less context.
async fn check_backend(ollama: Arc<OllamaClient>, events: mpsc::UnboundedSender<WorkerEvent>) {
    use sweety_core::LlmClient;

    let notice = if let Err(e) = ollama.check_health().await {
        Some(format!("{e}\nStart it with `ollama serve` or pass --base-url."))
    } else {
        match ollama.list_models().await {
            Ok(models) => {
                let model = ollama.model();
                let installed = models
                    .iter()
                    .any(|m| m == model || m.strip_suffix(":latest") == Some(model));
                (!installed).then(|| {
                    format!("Model '{model}' is not installed. Run `ollama pull {model}`.")
                })
            }
            Err(_) => None,
        }
    };

    if let Some(text) = notice {
        tracing::warn!("{text}");
        let _ = events.send(WorkerEvent::Notice(text));
    }
}

fn handle_worker_event(state: &mut AppState, event: WorkerEvent) {
    match event {
        WorkerEvent::SessionStarted(id) => {
            state.session_id = Some(id);
            state.turns = 0;
            state.total_tokens_in = 0;
            state.total_tokens_out = 0;
        }
        WorkerEvent::Chat(ChatEvent::Started { .. }) => {
            state.messages.push(ChatMessage {
                role: MessageRole::Assistant,
                content: String::new(),
                timestamp: now_str(),
                streaming: true,
            });
            state.status_text = format!("{} is typing...", state.persona_name);
            state.scroll_to_bottom();
        }
        WorkerEvent::Chat(ChatEvent::TextDelta(text)) => {
            if let Some(reply) = state.streaming_reply() {
                reply.content.push_str(&text);
            }
            state.scroll_to_bottom();
        }
        WorkerEvent::Chat(ChatEvent::Usage(usage)) => {
            state.total_tokens_in += u64::from(usage.input_tokens);
            state.total_tokens_out += u64::from(usage.output_tokens);
        }
        WorkerEvent::Chat(ChatEvent::Complete { reply }) => {
            if let Some(msg) = state.streaming_reply() {
                msg.content = reply;
                msg.streaming = false;
            }
            state.turns += 2;
            state.is_processing = false;
            state.status_text = "Ready".into();
            state.scroll_to_bottom();
        }
        WorkerEvent::Chat(ChatEvent::Error(e)) => {
            state.is_processing = false;
            state.status_text = "Error".into();

            // A partial reply stays on screen but never enters the history.
            let partial = match state.streaming_reply() {
                Some(msg) if !msg.content.is_empty() => {
                    msg.streaming = false;
                    true
                }
                _ => false,
            };
            if partial {
                state.add_message(
                    MessageRole::System,
                    format!("Reply interrupted: {e}\nThis exchange was not added to the conversation."),
                );
            } else {
                state
                    .messages
                    .retain(|m| !(m.role == MessageRole::Assistant && m.streaming));
                state.add_message(MessageRole::System, format!("Error: {e}"));
            }
        }
        WorkerEvent::Summary(summary) => {
            state.add_message(
                MessageRole::System,
                format!(
                    "Conversation {}: {} turns ({} rounds), ~{} tokens, started {}",
                    summary.id, summary.turns, summary.rounds, summary.tokens, summary.started_at
                ),
            );
        }
        WorkerEvent::Notice(text) => {
            state.add_message(MessageRole::System, text);
        }
    }
}

fn handle_key(
    state: &mut AppState,
    key: KeyEvent,
    request_tx: &mpsc::UnboundedSender<WorkerRequest>,
    ollama: &Arc<OllamaClient>,
    event_tx: &mpsc::UnboundedSender<WorkerEvent>,
) {
    match (key.modifiers, key.code) {
        // Quit
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            state.should_quit = true;
        }

        // Submit input
        (_, KeyCode::Enter) => {
            if state.input.trim().is_empty() || state.is_processing {
                return;
            }

            let input = std::mem::take(&mut state.input);
            state.cursor_pos = 0;
            state.push_history(input.clone());

            match commands::handle_command(&input) {
                CommandResult::NotACommand => {
                    state.add_message(MessageRole::User, input.clone());
                    state.is_processing = true;
                    state.status_text = "Sending...".into();
                    let _ = request_tx.send(WorkerRequest::Submit(input));
                }
                result => handle_command_result(state, result, request_tx, ollama, event_tx),
            }
        }

        // Input editing
        (_, KeyCode::Backspace) => {
            if state.cursor_pos > 0 && !state.is_processing {
                let idx = byte_index(&state.input, state.cursor_pos - 1);
                state.input.remove(idx);
                state.cursor_pos -= 1;
            }
        }
        (_, KeyCode::Delete) => {
            if state.cursor_pos < state.input_len() && !state.is_processing {
                let idx = byte_index(&state.input, state.cursor_pos);
                state.input.remove(idx);
            }
        }
        (_, KeyCode::Left) => {
            state.cursor_pos = state.cursor_pos.saturating_sub(1);
        }
        (_, KeyCode::Right) => {
            if state.cursor_pos < state.input_len() {
                state.cursor_pos += 1;
            }
        }
        (KeyModifiers::CONTROL, KeyCode::Char('a')) | (_, KeyCode::Home) => {
            state.cursor_pos = 0;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('e')) | (_, KeyCode::End) => {
            state.cursor_pos = state.input_len();
        }

        // Scroll (Shift+arrows, must come before bare arrows)
        (KeyModifiers::SHIFT, KeyCode::Up) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(1);
        }
        (KeyModifiers::SHIFT, KeyCode::Down) => {
            state.scroll_offset = state.scroll_offset.saturating_add(1);
        }
        (_, KeyCode::PageUp) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(20);
        }
        (_, KeyCode::PageDown) => {
            state.scroll_offset = state.scroll_offset.saturating_add(20);
        }

        // History navigation
        (_, KeyCode::Up) => {
            if !state.is_processing {
                state.history_prev();
            }
        }
        (_, KeyCode::Down) => {
            if !state.is_processing {
                state.history_next();
            }
        }

        // Kill line (Ctrl+U)
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            let idx = byte_index(&state.input, state.cursor_pos);
            state.input.drain(..idx);
            state.cursor_pos = 0;
        }

        // Kill to end of line (Ctrl+K)
        (KeyModifiers::CONTROL, KeyCode::Char('k')) => {
            let idx = byte_index(&state.input, state.cursor_pos);
            state.input.truncate(idx);
        }

        // Delete word backward (Ctrl+W)
        (KeyModifiers::CONTROL, KeyCode::Char('w')) => {
            let new_pos = word_boundary_left(&state.input, state.cursor_pos);
            let start = byte_index(&state.input, new_pos);
            let end = byte_index(&state.input, state.cursor_pos);
            state.input.drain(start..end);
            state.cursor_pos = new_pos;
        }

        // Tab completion for commands
        (_, KeyCode::Tab) => {
            if state.input.starts_with('/') {
                if let Some(completion) = commands::complete_command(&state.input) {
                    state.input = completion;
                    state.cursor_pos = state.input_len();
                }
            }
        }

        // Regular character input
        (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if !state.is_processing {
                let idx = byte_index(&state.input, state.cursor_pos);
                state.input.insert(idx, c);
                state.cursor_pos += 1;
            }
        }

        _ => {}
    }
}

fn handle_command_result(
    state: &mut AppState,
    result: CommandResult,
    request_tx: &mpsc::UnboundedSender<WorkerRequest>,
    ollama: &Arc<OllamaClient>,
    event_tx: &mpsc::UnboundedSender<WorkerEvent>,
) {
    match result {
        CommandResult::Message(text) => state.add_message(MessageRole::System, text),
        CommandResult::Quit => state.should_quit = true,
        CommandResult::NewSession => {
            state.messages.clear();
            state.add_message(MessageRole::System, "New conversation started.".into());
            let _ = request_tx.send(WorkerRequest::NewSession);
        }
        CommandResult::ShowHistory => {
            let _ = request_tx.send(WorkerRequest::Inspect);
        }
        CommandResult::ShowStatus => {
            let session = state
                .session_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".into());
            let text = format!(
                "Model: {}\nEndpoint: {}\nTemperature: {}\nConversation: {} ({} turns)\nTokens: {} in / {} out",
                state.model_name,
                state.base_url,
                state.temperature,
                session,
                state.turns,
                format_tokens(state.total_tokens_in),
                format_tokens(state.total_tokens_out),
            );
            state.add_message(MessageRole::System, text);
        }
        CommandResult::ListModels => {
            let ollama = ollama.clone();
            let events = event_tx.clone();
            tokio::spawn(async move {
                let text = match ollama.list_models().await {
                    Ok(models) if models.is_empty() => "No models installed.".to_string(),
                    Ok(models) => format!("Installed models:\n  {}", models.join("\n  ")),
                    Err(e) => format!("Could not list models: {e}"),
                };
                let _ = events.send(WorkerEvent::Notice(text));
            });
        }
        CommandResult::ThemeChanged(name) => {
            if Theme::exists(&name) {
                state.theme = Theme::by_name(&name);
                state.add_message(MessageRole::System, format!("Theme set to {}.", state.theme.name));
            } else {
                state.add_message(
                    MessageRole::System,
                    format!(
                        "Unknown theme '{name}'. Available: {}",
                        Theme::all_names().join(", ")
                    ),
                );
            }
        }
        CommandResult::NotACommand => {}
    }
}

// ── Drawing ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(5),    // chat
            Constraint::Length(3), // input
            Constraint::Length(1), // status
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], state);

    let chat_area = main_chunks[1];
    let theme = &state.theme;
    let chat_lines = build_chat_lines(&state.messages, &state.persona_name, theme);

    // Replies are long paragraphs, so count rows after wrapping to the
    // inner width, not logical lines.
    let inner_width = chat_area.width.saturating_sub(2);
    let chat = Paragraph::new(Text::from(chat_lines)).wrap(Wrap { trim: false });
    let total_lines = chat.line_count(inner_width);

    // Calculate visible height (area height - 2 for borders)
    let visible_height = chat_area.height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);
    if state.scroll_offset > max_scroll {
        state.scroll_offset = max_scroll;
    }

    let chat = chat
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .scroll((state.scroll_offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(chat, chat_area);

    if total_lines > visible_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(state.scroll_offset);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            chat_area,
            &mut scrollbar_state,
        );
    }

    draw_input(f, main_chunks[2], state);
    draw_status_bar(f, main_chunks[3], state);
}

fn draw_header(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let lines = vec![
        Line::from(Span::styled(
            format!(" 💖 {}", state.title),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {}", state.caption),
            Style::default().fg(theme.muted),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_message_lines(msg: &ChatMessage, persona: &str, theme: &Theme) -> Vec<Line<'static>> {
    let (prefix, color) = match msg.role {
        MessageRole::User => ("You > ".to_string(), theme.user_color),
        MessageRole::Assistant => (format!("{persona} > "), theme.assistant_color),
        MessageRole::System => (String::new(), theme.system_color),
    };

    let body = if msg.streaming {
        format!("{}{STREAM_CURSOR}", msg.content)
    } else {
        msg.content.clone()
    };

    let stamp = if msg.role == MessageRole::System {
        String::new()
    } else {
        format!("{} ", msg.timestamp)
    };
    let indent = " ".repeat(stamp.chars().count() + prefix.chars().count());

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut raw_lines: Vec<&str> = body.lines().collect();
    if raw_lines.is_empty() {
        raw_lines.push("");
    }

    for (i, raw_line) in raw_lines.into_iter().enumerate() {
        if i == 0 {
            lines.push(Line::from(vec![
                Span::styled(stamp.clone(), Style::default().fg(theme.muted)),
                Span::styled(
                    prefix.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(raw_line.to_string(), Style::default().fg(color)),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(raw_line.to_string(), Style::default().fg(color)),
            ]));
        }
    }

    lines
}

fn build_chat_lines(messages: &[ChatMessage], persona: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut chat_lines = Vec::new();
    for msg in messages {
        chat_lines.extend(render_message_lines(msg, persona, theme));
        chat_lines.push(Line::raw(""));
    }
    chat_lines
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let input_style = if state.is_processing {
        Style::default().fg(theme.muted)
    } else {
        Style::default().fg(theme.fg)
    };

    let title = if state.is_processing {
        " Waiting for reply... "
    } else if state.input.starts_with('/') {
        " Command "
    } else {
        " Type a message... "
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let (offset, cursor_col) = input_window(state.cursor_pos, inner_width);

    let input = Paragraph::new(state.input.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(if state.input.starts_with('/') {
                    theme.accent
                } else {
                    theme.border
                })),
        )
        .style(input_style)
        .scroll((0, offset));
    f.render_widget(input, area);

    if !state.is_processing {
        let cursor_x = area.x.saturating_add(1).saturating_add(cursor_col);
        f.set_cursor_position((cursor_x, area.y.saturating_add(1)));
    }
}

/// Horizontal scroll for the input box: keeps the cursor inside a field
/// `width` chars wide. Returns the scroll offset and the cursor column.
fn input_window(cursor_pos: usize, width: usize) -> (u16, u16) {
    let width = width.max(1);
    let offset = cursor_pos.saturating_sub(width - 1);
    let clamp = |n: usize| n.min(u16::MAX as usize) as u16;
    (clamp(offset), clamp(cursor_pos - offset))
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let session = state
        .session_id
        .as_ref()
        .map(|id| shorten_id(id.as_str()))
        .unwrap_or_else(|| "-".into());

    let tokens_str = if state.total_tokens_in > 0 || state.total_tokens_out > 0 {
        format!(
            "| {}in/{}out ",
            format_tokens(state.total_tokens_in),
            format_tokens(state.total_tokens_out),
        )
    } else {
        String::new()
    };

    let status_color = if state.status_text == "Error" {
        theme.error
    } else {
        theme.muted
    };

    let status_spans = vec![
        Span::styled(
            format!(" {} ", state.model_name),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("| {session} "), Style::default().fg(theme.accent)),
        Span::styled(
            format!("| {} turns ", state.turns),
            Style::default().fg(theme.muted),
        ),
        Span::styled(tokens_str, Style::default().fg(theme.muted)),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(state.status_text.clone(), Style::default().fg(status_color)),
    ];
    f.render_widget(Paragraph::new(Line::from(status_spans)), area);
}

// ── Helper functions ────────────────────────────────────────────────────

/// Byte offset of the `char_pos`-th character, or the string length.
fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Char position of the start of the word left of `pos`.
fn word_boundary_left(s: &str, pos: usize) -> usize {
    let chars: Vec<char> = s.chars().take(pos).collect();
    let mut i = chars.len();
    while i > 0 && chars[i - 1] == ' ' {
        i -= 1;
    }
    while i > 0 && chars[i - 1] != ' ' {
        i -= 1;
    }
    i
}

fn shorten_id(id: &str) -> String {
    if id.chars().count() > 12 {
        id.chars().take(8).collect()
    } else {
        id.to_string()
    }
}

fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn now_str() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}
