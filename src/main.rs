//! gemchat: a terminal chat client for Gemini
//!
//! Setup:
//! ```bash
//! export API_KEY=your-key   # or GEMINI_API_KEY, or [auth] api_key in config.toml
//! cargo run -- --model gemini-2.5-flash
//! ```

mod commands;
mod view;

use anyhow::Result;
use clap::Parser;
use commands::{Command, HELP, SUGGESTIONS, parse_command};
use gemchat_attachment::{AttachmentSlot, SelectedFile};
use gemchat_core::{ChatConfig, Error, GeminiBackend, UploadedImage};
use gemchat_session::{ChatController, SessionOptions, TurnOutcome};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use view::LiveView;

#[derive(Parser, Debug)]
#[command(name = "gemchat")]
#[command(about = "Chat with Gemini from the terminal, with streamed markdown rendering")]
struct Cli {
    /// Path to config.toml (searched upward from the current directory by default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to chat with
    #[arg(short, long)]
    model: Option<String>,

    /// Seconds to wait for the next chunk before failing the turn
    #[arg(short, long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    gemchat_telemetry::init_telemetry();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::info!(
        model = %config.model.model_name,
        provider = %config.model.provider,
        "Starting gemchat"
    );

    let backend = Arc::new(GeminiBackend::from_config(&config));
    if !backend.has_credential() {
        tracing::warn!("No API key configured; sending is disabled");
    }
    let controller = Arc::new(ChatController::new(
        backend,
        SessionOptions::from_config(&config),
    ));
    let attachments = AttachmentSlot::new(config.attachments.max_bytes);
    let mut live = LiveView::new();

    view::print_welcome(&SUGGESTIONS);
    if let Some(error) = controller.snapshot().error {
        view::print_banner(&error);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(attachments.current().is_some())?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Nothing => {}
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::NewChat => {
                let _ = controller.start_new_chat();
                attachments.remove();
                view::print_welcome(&SUGGESTIONS);
                if let Some(error) = controller.snapshot().error {
                    view::print_banner(&error);
                }
            }
            Command::Attach(path) => {
                attach(&attachments, &path, config.attachments.max_bytes).await
            }
            Command::RemoveAttachment => {
                if attachments.remove() {
                    println!("Attachment removed.");
                }
            }
            Command::Suggest(n) => {
                let (_, prompt) = SUGGESTIONS[n - 1];
                println!("{}", prompt);
                run_turn(&controller, &mut live, prompt.to_string(), attachments.take()).await?;
            }
            Command::Send(text) => {
                run_turn(&controller, &mut live, text, attachments.take()).await?;
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ChatConfig> {
    let mut config = match &cli.config {
        Some(path) => ChatConfig::load_from(path)?,
        None => ChatConfig::load()?,
    };

    if let Some(model) = &cli.model {
        config.model.model_name = model.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.chat.turn_timeout_secs = Some(timeout);
    }

    Ok(config)
}

fn print_prompt(has_attachment: bool) -> Result<()> {
    let marker = if has_attachment { "📎 " } else { "" };
    print!("\n{}> ", marker);
    std::io::stdout().flush()?;
    Ok(())
}

async fn attach(attachments: &AttachmentSlot, path: &Path, max_bytes: u64) {
    let selected = match SelectedFile::from_path_with_limit(path, max_bytes).await {
        Ok(file) => file,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    let name = selected.name.clone();
    match attachments.select(selected).await {
        Ok(Some(image)) => println!("Attached {} ({})", name, image.mime_type),
        Ok(None) => {}
        Err(e) => println!("{}", e),
    }
}

/// Send one turn and redraw the reply until it settles
async fn run_turn(
    controller: &Arc<ChatController>,
    live: &mut LiveView,
    text: String,
    image: Option<UploadedImage>,
) -> Result<()> {
    let mut updates = controller.subscribe();
    let mut turn = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.send_turn(&text, image).await })
    };

    view::print_model_label();

    let result = loop {
        tokio::select! {
            Ok(()) = updates.changed() => live.draw(&controller.snapshot())?,
            joined = &mut turn => break joined?,
        }
    };

    match result {
        Ok(outcome) => {
            if let TurnOutcome::Failed { error, .. } = &outcome {
                tracing::debug!(error = %error, "Turn failed");
            }
            live.finish(&controller.snapshot())?;
        }
        Err(e @ Error::Config(_)) => {
            let banner = controller.snapshot().error.unwrap_or_else(|| e.to_string());
            view::print_banner(&banner);
        }
        Err(e) if e.is_user_facing() => view::print_banner(&e.to_string()),
        Err(e) => tracing::warn!(error = %e, "Turn rejected"),
    }

    Ok(())
}
