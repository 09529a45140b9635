use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use sweety_core::{ConversationRunner, LlmClient, Settings};

mod app;
mod commands;
mod theme;

#[derive(Parser)]
#[command(name = "sweety")]
#[command(about = "Sweety - chat with a local Ollama model")]
#[command(version)]
struct Cli {
    /// Send a single message, stream the reply and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Color theme (dark, rose, dracula)
    #[arg(long)]
    theme: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so it stays silent unless RUST_LOG asks otherwise.
    let default_filter = if cli.prompt.is_some() { "warn" } else { "off" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load();

    if let Some(model) = cli.model {
        settings.llm.model = model;
    }
    if let Some(base_url) = cli.base_url {
        settings.llm.base_url = base_url;
    }
    if let Some(temperature) = cli.temperature {
        settings.llm.temperature = temperature;
    }
    if let Some(theme) = cli.theme {
        settings.ui.theme = theme;
    }

    // Built once and shared for the life of the process.
    let ollama = Arc::new(
        settings
            .build_ollama_client()
            .context("could not set up the Ollama client")?,
    );
    let llm: Arc<dyn LlmClient> = ollama.clone();
    let runner = ConversationRunner::new(llm, settings.prompt_template());

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&runner, &prompt).await?;
    } else {
        app::run_tui(settings, runner, ollama).await?;
    }

    Ok(())
}
