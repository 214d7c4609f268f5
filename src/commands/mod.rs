/*!
Command handlers for the CLI

Each subcommand of `chatline` has a handler here. Handlers take the backend
as a trait object so they can be driven by the HTTP client in `main` and by
mocks in tests.

- `sessions` prints one page, or every page, of sessions
- `browse` is the interactive scrolling list
- `messages` prints a session's thread
- `chat` is the interactive chat loop
- `prompt` edits a session's system prompt
- `reset` clears a session's history
*/

pub mod browse;
pub mod chat;
pub mod messages;
pub mod prompt;
pub mod sessions;
pub mod special_commands;

// Session reset command handler
pub mod reset {
    //! Clear the message history of a session.

    use crate::backend::{ChatBackend, SessionId};
    use crate::error::Result;
    use colored::Colorize;

    /// Ask the backend to delete every message of `session_id`
    pub async fn reset_session(backend: &dyn ChatBackend, session_id: &SessionId) -> Result<()> {
        let ack = backend.reset(session_id).await?;
        tracing::info!("Reset session {}: {}", ack.session_id, ack.status);
        println!(
            "{}",
            format!("Session {} history cleared.", ack.session_id).green()
        );
        Ok(())
    }

}
