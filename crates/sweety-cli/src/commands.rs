/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// End the current session and start a fresh one.
    NewSession,
    /// Quit the application.
    Quit,
    /// Change the theme.
    ThemeChanged(String),
    /// Show the transcript size of the current session.
    ShowHistory,
    /// Show status (model, endpoint, session).
    ShowStatus,
    /// List models installed on the Ollama server.
    ListModels,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub const COMMANDS: &[&str] = &[
    "/help", "/new", "/clear", "/history", "/status", "/models", "/theme", "/version", "/quit",
    "/exit",
];

pub fn handle_command(input: &str) -> CommandResult {
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.trim().splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/new" | "/clear" => CommandResult::NewSession,
        "/history" => CommandResult::ShowHistory,
        "/status" => CommandResult::ShowStatus,
        "/models" => CommandResult::ListModels,
        "/theme" => {
            if arg.is_empty() {
                let themes = crate::theme::Theme::all_names().join(", ");
                CommandResult::Message(format!(
                    "Available themes: {themes}\nUsage: /theme <theme-name>"
                ))
            } else {
                CommandResult::ThemeChanged(arg.to_string())
            }
        }
        "/version" => CommandResult::Message(format!("Sweety v{}", env!("CARGO_PKG_VERSION"))),
        _ => CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands.")),
    }
}

/// Complete a partially typed command when exactly one matches.
pub fn complete_command(input: &str) -> Option<String> {
    let matches: Vec<&&str> = COMMANDS.iter().filter(|c| c.starts_with(input)).collect();

    if matches.len() == 1 {
        Some(format!("{} ", matches[0]))
    } else {
        None
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
Sweety commands

  /new, /clear        End this conversation and start a fresh one
  /history            Show how many turns this conversation holds
  /status             Show model, endpoint and session
  /models             List models installed on the Ollama server
  /theme <name>       Change color theme
  /version            Show version information
  /help, /h           Show this help message
  /quit, /exit, /q    Quit

  Enter sends, Up/Down recalls input, PageUp/PageDown scrolls, Ctrl+C quits.";

    CommandResult::Message(help_text.into())
}
