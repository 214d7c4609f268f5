//! chatline - terminal client for a remote chat backend
//!
#![doc = "chatline - terminal client for a remote chat backend"]
#![doc = "Main entry point for the chatline application."]

use anyhow::Result;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatline::backend::{ChatBackend, HttpBackend, SessionId};
use chatline::cli::{Cli, Commands};
use chatline::commands;
use chatline::commands::chat::ChatSession;
use chatline::commands::sessions::SessionsArgs;
use chatline::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/chatline.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(&config.backend)?);

    // Execute command
    match cli.command {
        Commands::Sessions {
            page_size,
            skip,
            all,
            json,
        } => {
            let args = SessionsArgs {
                page_size: config.sessions.effective_page_size(page_size)?,
                skip,
                all,
                json,
            };
            tracing::debug!("Listing sessions: {:?}", args);
            commands::sessions::list_sessions(backend, args).await
        }
        Commands::Browse => {
            tracing::info!("Starting session browser");
            commands::browse::run_browse(backend, &config).await
        }
        Commands::Messages { session_id, json } => {
            let session_id = parse_session_id(&session_id);
            commands::messages::show_messages(backend.as_ref(), &session_id, json).await
        }
        Commands::Chat { session } => {
            let session = ChatSession::new(session.as_deref().map(parse_session_id));
            if let Some(id) = session.session_id() {
                tracing::debug!("Continuing session: {}", id);
            }
            commands::chat::run_chat(backend.as_ref(), &config.chat, session).await?;
            Ok(())
        }
        Commands::Prompt {
            session_id,
            text,
            file,
        } => {
            let session_id = parse_session_id(&session_id);
            commands::prompt::run_prompt(backend.as_ref(), &session_id, text, file.as_deref())
                .await
        }
        Commands::Reset { session_id } => {
            let session_id = parse_session_id(&session_id);
            commands::reset::reset_session(backend.as_ref(), &session_id).await
        }
    }
}

fn parse_session_id(raw: &str) -> SessionId {
    // FromStr for SessionId is infallible
    raw.parse().unwrap_or_else(|_| SessionId::Text(raw.to_string()))
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chatline=debug"
    } else {
        "chatline=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
