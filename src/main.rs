use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod ai;
mod app;
mod config;
mod content;
mod db;
mod display;
mod error;
mod models;

use ai::{ProviderKind, ReqwestTransport};
use app::App;
use config::Settings;
use error::{AppError, Result};
use models::{GenerationOutcome, NewPost, STATUS_DRAFT};

#[derive(Parser)]
#[command(name = "post-summary")]
#[command(version, about = "AI-written summaries for blog posts, via Gemini or ChatGPT")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the user config directory)
    #[arg(long, short, global = true, env = "POST_SUMMARY_CONFIG")]
    config: Option<PathBuf>,

    /// API key, overriding the one in the settings file
    #[arg(long, global = true, env = "POST_SUMMARY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// AI provider, overriding the settings file
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize text from a file or stdin without storing anything
    Generate {
        #[arg(help = "File to summarize (stdin when omitted)")]
        file: Option<PathBuf>,
        #[arg(long, short, help = "Target length in characters (50-1000)")]
        length: Option<i64>,
    },

    /// Check that an API key is accepted by the provider
    ValidateKey {
        #[arg(help = "Key to check (defaults to the configured key)")]
        key: Option<String>,
    },

    /// Store a new post
    AddPost {
        #[arg(long, short)]
        title: String,
        #[arg(long, short, help = "HTML content file (stdin when omitted)")]
        file: Option<PathBuf>,
        #[arg(long, default_value = "post", help = "Post type: post, page")]
        post_type: String,
        #[arg(long, help = "Enable or disable summaries for this post")]
        enabled: Option<bool>,
        #[arg(long, help = "Publish right away")]
        publish: bool,
    },

    /// Save a post from the editor, with its summary options
    EditPost {
        id: i64,
        #[arg(long, short)]
        title: Option<String>,
        #[arg(long, short, help = "New HTML content file")]
        file: Option<PathBuf>,
        #[arg(long, help = "Enable or disable summaries for this post")]
        enabled: Option<bool>,
        #[arg(long, help = "Request a new summary on the next save or publish")]
        regenerate: bool,
    },

    /// Publish a post, generating its summary when enabled
    Publish { id: i64 },

    /// Generate a new summary for a post right away
    Regenerate { id: i64 },

    /// Show the summary state of a post as JSON
    Status { id: i64 },

    /// Print the themed HTML summary block of a post
    Render { id: i64 },

    /// Show the settings in use (API key redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Only warnings and errors unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let mut settings = Settings::load_from(&config_path)?;
    if let Some(key) = cli.api_key {
        settings.api_key = Some(key);
    }
    if let Some(provider) = cli.provider {
        settings.api_provider = provider.slug().to_string();
    }

    match cli.command {
        Commands::Config => {
            show_config(&config_path, &settings)?;
            return Ok(());
        }
        Commands::Generate {
            length: Some(length),
            ..
        } => settings.char_count = length,
        _ => {}
    }
    let settings = settings.sanitized();

    let transport = Arc::new(ReqwestTransport::new()?);
    let app = App::new(settings, transport).await?;

    match cli.command {
        Commands::Generate { file, .. } => {
            let content = read_input(file.as_deref())?;
            let summary = app.test_summary(&content).await?;
            println!("{}", summary);
        }
        Commands::ValidateKey { key } => {
            let key = key.or_else(|| app.settings.api_key.clone()).unwrap_or_default();
            let provider = app.settings.provider();
            app.validate_api_key(&key, provider).await?;
            println!("{} API key is valid", provider.name());
        }
        Commands::AddPost {
            title,
            file,
            post_type,
            enabled,
            publish,
        } => {
            let content = read_input(file.as_deref())?;
            let id = app
                .add_post(NewPost {
                    post_type: post_type.trim().to_lowercase(),
                    title,
                    content,
                    status: STATUS_DRAFT.to_string(),
                })
                .await?;
            app.save_post_meta(id, enabled, false).await?;
            println!("Added post {}", id);
            if publish {
                report(id, &app.publish(id).await?);
            }
        }
        Commands::EditPost {
            id,
            title,
            file,
            enabled,
            regenerate,
        } => {
            let content = match file {
                Some(path) => Some(read_input(Some(&path))?),
                None => None,
            };
            let outcome = app.save_post(id, title, content, enabled, regenerate).await?;
            report(id, &outcome);
        }
        Commands::Publish { id } => {
            report(id, &app.publish(id).await?);
        }
        Commands::Regenerate { id } => {
            let summary = app.regenerate_now(id).await?;
            println!("{}", summary);
        }
        Commands::Status { id } => {
            let status = app.check_update(id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Render { id } => match app.render(id).await? {
            Some(html) => println!("{}", html),
            None => eprintln!("Post {} has no summary to display", id),
        },
        Commands::Config => {}
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    Ok(content)
}

fn report(post_id: i64, outcome: &GenerationOutcome) {
    match outcome {
        GenerationOutcome::Generated(summary) => {
            println!("Post summary generated successfully!\n{}", summary)
        }
        GenerationOutcome::Regenerated(summary) => {
            println!("Post summary regenerated successfully!\n{}", summary)
        }
        GenerationOutcome::Skipped(reason) => {
            println!("Post {}: no summary generated ({})", post_id, reason)
        }
        GenerationOutcome::Failed(err) => eprintln!("AI Post Summary Error: {}", err),
    }
}

fn show_config(path: &Path, settings: &Settings) -> Result<()> {
    let mut shown = settings.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("********".to_string());
    }
    let content = toml::to_string_pretty(&shown).map_err(|e| AppError::Config(e.to_string()))?;
    println!("# {}\n{}", path.display(), content);
    Ok(())
}
