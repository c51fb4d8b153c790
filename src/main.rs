//! promptbox CLI - Stream chat-completion answers into the terminal

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use promptbox::{
    api::{
        compose_prompt, AudioClip, ChatClient, ImageAttachment, StreamOutcome, StreamRequest,
        StreamingProvider, Transcriber, TranscriptionClient,
    },
    config::Settings,
    tui::AnswerPane,
    voice::VoiceTurn,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "promptbox")]
#[command(about = "Stream answers from an OpenAI-compatible chat API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Settings file (default: ~/.config/promptbox/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the answer (Ctrl-C cancels)
    Ask {
        /// The prompt
        prompt: String,

        /// Extra context appended after the prompt
        #[arg(long)]
        context: Option<String>,

        /// Read extra context from a file
        #[arg(long, conflicts_with = "context")]
        context_file: Option<PathBuf>,

        /// Attach an image (repeatable)
        #[arg(short, long)]
        image: Vec<PathBuf>,

        /// Model to use for this request
        #[arg(short, long)]
        model: Option<String>,

        /// Temperature for this request
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Transcribe an audio file
    Transcribe {
        /// Audio file (webm, mp3, wav, ...)
        audio: PathBuf,
    },

    /// Transcribe an audio file, then answer it
    Voice {
        /// Audio file (webm, mp3, wav, ...)
        audio: PathBuf,
    },

    /// Manage prompt history
    #[command(subcommand)]
    History(HistoryCommands),

    /// Manage settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List prompts, most recent first
    List {
        /// Only show prompts containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Remove one prompt
    Remove { prompt: String },

    /// Remove all prompts
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize settings file with defaults
    Init {
        /// Overwrite existing settings
        #[arg(long)]
        force: bool,
    },

    /// Show current settings (API key masked)
    Show,

    /// Set a value
    Set {
        /// Setting key (e.g., chat.model, ui.dark_mode)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show settings file path
    Path,

    /// Validate settings
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = cli.config.unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load_from(&path)?;

    match cli.command {
        Commands::Ask {
            prompt,
            context,
            context_file,
            image,
            model,
            temperature,
        } => {
            let context = match context_file {
                Some(file) => tokio::fs::read_to_string(&file).await?,
                None => context.unwrap_or_default(),
            };
            run_ask(&mut settings, &path, &prompt, &context, &image, model, temperature).await?;
        }
        Commands::Transcribe { audio } => {
            run_transcribe(&settings, &audio).await?;
        }
        Commands::Voice { audio } => {
            run_voice(&settings, &audio).await?;
        }
        Commands::History(cmd) => {
            run_history_command(&mut settings, &path, cmd)?;
        }
        Commands::Config(cmd) => {
            run_config_command(&mut settings, &path, cmd)?;
        }
    }

    Ok(())
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling");
            token.cancel();
        }
    });
}

async fn run_ask(
    settings: &mut Settings,
    path: &Path,
    prompt: &str,
    context: &str,
    images: &[PathBuf],
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<()> {
    let mut attachments = Vec::with_capacity(images.len());
    for image in images {
        attachments.push(ImageAttachment::from_path(image).await?);
    }

    let mut request = StreamRequest::from_settings(settings)?
        .with_user(compose_prompt(prompt, context), &attachments);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    if let Some(temperature) = temperature {
        request = request.with_temperature(temperature);
    }

    settings.history.record(prompt);
    settings.save_to(path)?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let client = ChatClient::new();
    let pane = AnswerPane::new(settings.ui.dark_mode);
    let summary = pane
        .show(client.stream_answer(request.with_cancel(cancel)))
        .await;

    if let StreamOutcome::Failed(e) = summary.outcome {
        bail!(e);
    }

    Ok(())
}

fn transcription_client(settings: &Settings) -> TranscriptionClient {
    TranscriptionClient::new(settings.base_url()).with_model(&settings.voice.transcription_model)
}

async fn run_transcribe(settings: &Settings, audio: &Path) -> Result<()> {
    let Some(api_key) = settings.api_key() else {
        bail!("No API key configured. Run: promptbox config set chat.api_key <key>");
    };

    let clip = AudioClip::from_path(audio).await?;
    let transcript = transcription_client(settings).transcribe(&api_key, clip).await?;
    println!("{}", transcript);

    Ok(())
}

async fn run_voice(settings: &Settings, audio: &Path) -> Result<()> {
    let clip = AudioClip::from_path(audio).await?;
    let transcriber = transcription_client(settings);
    let client = ChatClient::new();
    let pane = AnswerPane::new(settings.ui.dark_mode);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let turn = VoiceTurn::new(&transcriber, &client, settings);
    let transcript = turn.transcribe(clip).await?;
    pane.renderer()
        .render_system(&format!("Transcription: {}", transcript));

    let (answer, outcome) = turn
        .answer(&transcript, cancel, |delta| pane.renderer().render_delta(delta))
        .await?;
    if !answer.is_empty() {
        pane.renderer().end_answer();
    }

    match outcome {
        StreamOutcome::Completed => Ok(()),
        StreamOutcome::Cancelled => {
            pane.renderer().render_warning("Cancelled");
            Ok(())
        }
        StreamOutcome::Failed(e) => bail!(e),
    }
}

fn run_history_command(settings: &mut Settings, path: &Path, cmd: HistoryCommands) -> Result<()> {
    match cmd {
        HistoryCommands::List { filter } => {
            for prompt in settings.history.filter(filter.as_deref().unwrap_or("")) {
                println!("{}", prompt);
            }
        }
        HistoryCommands::Remove { prompt } => {
            if settings.history.remove(&prompt) {
                settings.save_to(path)?;
                println!("Removed.");
            } else {
                println!("Not in history: {}", prompt);
            }
        }
        HistoryCommands::Clear => {
            settings.history.clear();
            settings.save_to(path)?;
            println!("History cleared.");
        }
    }
    Ok(())
}

fn run_config_command(settings: &mut Settings, path: &Path, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                println!("Settings file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Settings::default().save_to(path)?;

            println!("Settings file created at: {}", path.display());
            println!();
            println!("Next steps:");
            println!("  promptbox config set chat.api_key <your key>, or");
            println!("  export OPENAI_API_KEY=<your key>");
        }
        ConfigCommands::Show => {
            println!("{}", toml::to_string_pretty(&settings.masked())?);
            println!(
                "OPENAI_API_KEY: {}",
                if std::env::var("OPENAI_API_KEY").is_ok() { "set" } else { "not set" }
            );
        }
        ConfigCommands::Set { key, value } => {
            settings.set(&key, &value)?;
            settings.save_to(path)?;
            println!(
                "Set {} = {}",
                key,
                if key.ends_with("api_key") { "***" } else { value.as_str() }
            );
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            if path.exists() {
                println!("(file exists)");
            } else {
                println!("(file does not exist - run 'config init' to create)");
            }
        }
        ConfigCommands::Validate => match settings.validate() {
            Ok(()) => {
                println!("Settings are valid!");
                println!("  Model: {}", settings.model());
                println!("  Endpoint: {}", settings.chat_endpoint());
            }
            Err(e) => {
                println!("Settings validation failed:");
                println!("  {}", e);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["promptbox", "ask", "-l", "debug", "hello"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Ask { .. }));
    }

    #[test]
    fn test_context_and_context_file_conflict() {
        let err = Cli::try_parse_from([
            "promptbox",
            "ask",
            "hello",
            "--context",
            "inline",
            "--context-file",
            "notes.txt",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
