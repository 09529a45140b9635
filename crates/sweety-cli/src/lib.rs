// Library interface for sweety-cli so integration tests can reach the
// command parser and themes. main.rs declares the same files as modules;
// the path attributes keep them single-sourced.

#[path = "commands.rs"]
pub mod commands;

#[path = "theme.rs"]
pub mod theme;

pub use commands::{complete_command, handle_command, CommandResult};
pub use theme::Theme;
