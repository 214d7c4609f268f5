//! System prompt editing

use crate::backend::{ChatBackend, PromptUpdate, PromptUpdateAck, SessionId};
use crate::error::{ChatlineError, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

/// Submit a new system prompt for a session
///
/// The prompt is required: empty or whitespace-only text is rejected
/// before any request is made.
///
/// # Errors
///
/// Returns `ChatlineError::InvalidInput` for an empty prompt, otherwise
/// whatever the backend reports
pub async fn submit_prompt(
    backend: &dyn ChatBackend,
    session_id: &SessionId,
    prompt: &str,
) -> Result<PromptUpdateAck> {
    if prompt.trim().is_empty() {
        return Err(ChatlineError::InvalidInput("System prompt cannot be empty".to_string()).into());
    }

    let update = PromptUpdate {
        session_id: session_id.clone(),
        system_prompt: prompt.to_string(),
    };
    let ack = backend.set_system_prompt(&update).await?;
    tracing::info!("Updated system prompt for session {}", session_id);
    Ok(ack)
}

/// Edit a prompt on one line, starting from `current`
///
/// Returns `None` when the user cancels with Ctrl-C or Ctrl-D.
pub fn edit_interactively(rl: &mut DefaultEditor, current: &str) -> Result<Option<String>> {
    println!(
        "{}",
        "Edit the system prompt (Enter to save, Ctrl-C to cancel):".cyan()
    );
    match rl.readline_with_initial("prompt> ", (current, "")) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Run `chatline prompt`
///
/// The prompt comes from `text`, else from `file`, else from an
/// interactive one-line editor.
pub async fn run_prompt(
    backend: &dyn ChatBackend,
    session_id: &SessionId,
    text: Option<String>,
    file: Option<&Path>,
) -> Result<()> {
    let prompt = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            ChatlineError::InvalidInput(format!(
                "Failed to read prompt file {}: {}",
                path.display(),
                e
            ))
        })?,
        (None, None) => {
            let mut rl = DefaultEditor::new()?;
            match edit_interactively(&mut rl, "")? {
                Some(prompt) => prompt,
                None => {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }
    };

    let ack = submit_prompt(backend, session_id, &prompt).await?;
    println!(
        "{}",
        format!("System prompt for session {} {}.", ack.session_id, ack.status).green()
    );
    Ok(())
}
