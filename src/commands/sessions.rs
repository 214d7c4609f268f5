//! Non-interactive session listing

use crate::backend::{ChatBackend, Session, SessionPage};
use crate::error::Result;
use crate::loader::SessionLoader;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

/// Options for `chatline sessions`
#[derive(Debug, Clone)]
pub struct SessionsArgs {
    /// Window size
    pub page_size: usize,
    /// Offset of the first session (single-page mode only)
    pub skip: usize,
    /// Load every page through the paginated loader
    pub all: bool,
    /// Print JSON
    pub json: bool,
}

/// Print sessions as a table or JSON
///
/// With `all`, pages are pulled through [`SessionLoader`] until the backend
/// reports no more. If a page fails, the sessions loaded before the failure
/// are still printed and the error is returned.
pub async fn list_sessions(backend: Arc<dyn ChatBackend>, args: SessionsArgs) -> Result<()> {
    let (page, halted) = if args.all {
        let mut loader = SessionLoader::new(backend, args.page_size);
        loader.load_all().await;
        let state = loader.state();
        let page = SessionPage {
            total: state.total().unwrap_or(state.sessions().len()),
            data: state.sessions().to_vec(),
        };
        (page, state.error().cloned())
    } else {
        (backend.list_sessions(args.skip, args.page_size).await?, None)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else if page.data.is_empty() {
        if halted.is_none() {
            println!("{}", "No chat sessions found.".yellow());
        }
    } else {
        session_table(&page.data).printstd();
        println!("Showing {} of {} sessions.", page.data.len(), page.total);
    }

    match halted {
        Some(error) => Err(anyhow::anyhow!(error.message)),
        None => Ok(()),
    }
}

/// Build the session table
pub fn session_table(sessions: &[Session]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "System Prompt".bold(),
        "Created At".bold()
    ]);

    for session in sessions {
        let prompt = session
            .system_prompt
            .as_deref()
            .map(|p| truncate(p, 50))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(prettytable::row![
            session.id.to_string().cyan(),
            prompt,
            format_created_at(&session.created_at)
        ]);
    }

    table
}

/// Creation time in the local timezone
pub fn format_created_at(created_at: &DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// First line of `text`, cut to `max` characters with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let count = first_line.chars().count();
    if count > max || first_line.len() < text.trim_end().len() {
        let kept: String = first_line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        first_line.to_string()
    }
}
