//! Message thread view

use crate::backend::{ChatBackend, ChatMessage, Role, SessionId};
use crate::error::{ChatlineError, Result};
use crate::markdown;
use colored::Colorize;

/// Fetch and print the thread of one session
///
/// A 404 from the backend is reported as a missing session.
pub async fn show_messages(
    backend: &dyn ChatBackend,
    session_id: &SessionId,
    json: bool,
) -> Result<()> {
    let messages = fetch_thread(backend, session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else {
        println!("{}", format!("=== Session {} ===", session_id).bold());
        print_thread(&messages);
    }
    Ok(())
}

/// Fetch a thread, turning a 404 into a readable message
pub async fn fetch_thread(
    backend: &dyn ChatBackend,
    session_id: &SessionId,
) -> Result<Vec<ChatMessage>> {
    backend.messages(session_id).await.map_err(|e| {
        let not_found = matches!(
            e.downcast_ref::<ChatlineError>(),
            Some(ChatlineError::NotFound(_))
        );
        if not_found {
            ChatlineError::NotFound(format!("Session {} not found", session_id)).into()
        } else {
            e
        }
    })
}

/// Print messages with role headers and formatted content
pub fn print_thread(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("{}", "No messages yet.".yellow());
        return;
    }
    for message in messages {
        print_message(message);
    }
}

/// Print one message
pub fn print_message(message: &ChatMessage) {
    println!("{}", format_message(message));
}

/// Header line plus formatted body
pub fn format_message(message: &ChatMessage) -> String {
    let header = match message.role {
        Role::User => message.role.label().blue().bold(),
        Role::Assistant => message.role.label().green().bold(),
        Role::System => message.role.label().magenta().bold(),
    };
    let stamp = message
        .timestamp
        .as_deref()
        .map(|t| format!(" {}", t.dimmed()))
        .unwrap_or_default();
    format!("{}{}\n{}\n", header, stamp, markdown::render(&message.content))
}
