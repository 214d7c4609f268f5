//! Interactive chat loop
//!
//! A readline loop that posts each line to the backend and prints the
//! assistant's reply. The local thread is updated optimistically: the user
//! message is appended before the request goes out and stays there if the
//! request fails.

use crate::backend::{ChatBackend, ChatMessage, ChatRequest, SessionId};
use crate::commands::messages::{fetch_thread, format_message, print_thread};
use crate::commands::prompt::{edit_interactively, submit_prompt};
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::ChatConfig;
use crate::error::{ChatlineError, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Local view of one conversation
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    session_id: Option<SessionId>,
    system_prompt: Option<String>,
    thread: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a conversation, optionally continuing an existing session
    pub fn new(session_id: Option<SessionId>) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    /// Seed the prompt shown when editing
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Session id, once the backend has assigned one
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Last prompt set from this conversation
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Messages seen so far
    pub fn thread(&self) -> &[ChatMessage] {
        &self.thread
    }

    fn require_session(&self) -> Result<&SessionId> {
        self.session_id.as_ref().ok_or_else(|| {
            ChatlineError::InvalidInput(
                "No session yet. Send a message to start one.".to_string(),
            )
            .into()
        })
    }

    /// Send a user message and append the reply
    ///
    /// The session id returned by the backend is adopted, so the first
    /// message of a fresh conversation creates its session.
    pub async fn send(&mut self, backend: &dyn ChatBackend, content: &str) -> Result<&ChatMessage> {
        self.thread.push(ChatMessage::user(content));

        let request = ChatRequest {
            session_id: self.session_id.clone(),
            content: content.to_string(),
        };
        let reply = backend.chat(&request).await?;

        if self.session_id.as_ref() != Some(&reply.session) {
            tracing::debug!("Chat session is now {}", reply.session);
            self.session_id = Some(reply.session);
        }
        self.thread.push(ChatMessage::assistant(reply.reply));
        Ok(&self.thread[self.thread.len() - 1])
    }

    /// Re-fetch the thread from the backend
    pub async fn refresh(&mut self, backend: &dyn ChatBackend) -> Result<()> {
        let session_id = self.require_session()?.clone();
        self.thread = fetch_thread(backend, &session_id).await?;
        Ok(())
    }

    /// Clear the session's history on the backend and locally
    pub async fn reset(&mut self, backend: &dyn ChatBackend) -> Result<()> {
        let session_id = self.require_session()?.clone();
        let ack = backend.reset(&session_id).await?;
        tracing::info!("Session {} reset: {}", ack.session_id, ack.status);
        self.thread.clear();
        Ok(())
    }

    /// Replace the session's system prompt
    pub async fn set_prompt(&mut self, backend: &dyn ChatBackend, prompt: &str) -> Result<()> {
        let session_id = self.require_session()?.clone();
        let ack = submit_prompt(backend, &session_id, prompt).await?;
        self.system_prompt = Some(ack.system_prompt);
        Ok(())
    }
}

/// Run the interactive chat loop
///
/// With `session`, the existing thread is loaded and printed first.
/// Returns the final state so callers can pick up the session id.
pub async fn run_chat(
    backend: &dyn ChatBackend,
    config: &ChatConfig,
    mut session: ChatSession,
) -> Result<ChatSession> {
    let mut rl = DefaultEditor::new()?;
    let history_path = config.history_path();
    if let Some(path) = &history_path {
        if rl.load_history(path).is_err() {
            tracing::debug!("No readline history at {}", path.display());
        }
    }

    match session.session_id() {
        Some(id) => {
            println!("{}", format!("Continuing session {}", id).bold());
            if let Err(e) = session.refresh(backend).await {
                eprintln!("{} {}", "Error:".red(), e);
            } else {
                print_thread(session.thread());
            }
        }
        None => println!("{}", "New chat. Type /help for commands.".bold()),
    }

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e.to_string().yellow());
                        continue;
                    }
                };

                let outcome = match command {
                    SpecialCommand::Exit => break,
                    SpecialCommand::Help => {
                        print_help();
                        Ok(())
                    }
                    SpecialCommand::ShowSession => {
                        match session.session_id() {
                            Some(id) => println!("Session: {}", id.to_string().cyan()),
                            None => println!("No session yet."),
                        }
                        Ok(())
                    }
                    SpecialCommand::History => session
                        .refresh(backend)
                        .await
                        .map(|_| print_thread(session.thread())),
                    SpecialCommand::Reset => session
                        .reset(backend)
                        .await
                        .map(|_| println!("{}", "History cleared.".green())),
                    SpecialCommand::Prompt(text) => {
                        handle_prompt(&mut rl, backend, &mut session, text).await
                    }
                    SpecialCommand::None => session
                        .send(backend, trimmed)
                        .await
                        .map(|reply| println!("{}", format_message(reply))),
                };

                if let Err(e) = outcome {
                    eprintln!("{} {}\n", "Error:".red(), e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        save_history(&mut rl, path);
    }
    println!("Goodbye!");
    Ok(session)
}

async fn handle_prompt(
    rl: &mut DefaultEditor,
    backend: &dyn ChatBackend,
    session: &mut ChatSession,
    text: Option<String>,
) -> Result<()> {
    session.require_session()?;
    let prompt = match text {
        Some(text) => text,
        None => {
            let current = session.system_prompt().unwrap_or("").to_string();
            match edit_interactively(rl, &current)? {
                Some(prompt) => prompt,
                None => {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }
    };
    session.set_prompt(backend, &prompt).await?;
    println!("{}", "System prompt updated.".green());
    Ok(())
}

fn save_history(rl: &mut DefaultEditor, path: &std::path::Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = rl.save_history(path) {
        tracing::warn!("Failed to save readline history: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatReply, MockChatBackend, PromptUpdateAck, ResetAck, Role};

    fn reply(text: &str, session: i64) -> ChatReply {
        ChatReply {
            reply: text.to_string(),
            session: SessionId::Int(session),
            history: vec![],
        }
    }

    #[tokio::test]
    async fn test_first_message_adopts_session() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .withf(|r| r.session_id.is_none() && r.content == "hello")
            .times(1)
            .returning(|_| Ok(reply("hi!", 42)));

        let mut chat = ChatSession::new(None);
        let answer = chat.send(&mock, "hello").await.unwrap();
        assert_eq!(answer.content, "hi!");
        assert_eq!(chat.session_id(), Some(&SessionId::Int(42)));
        assert_eq!(chat.thread().len(), 2);
        assert_eq!(chat.thread()[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_followup_sends_session_id() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .withf(|r| r.session_id == Some(SessionId::Int(7)))
            .times(1)
            .returning(|_| Ok(reply("sure", 7)));

        let mut chat = ChatSession::new(Some(SessionId::Int(7)));
        chat.send(&mock, "again").await.unwrap();
        assert_eq!(chat.session_id(), Some(&SessionId::Int(7)));
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_message() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .times(1)
            .returning(|_| Err(ChatlineError::Network("connection refused".to_string()).into()));

        let mut chat = ChatSession::new(None);
        let err = chat.send(&mock, "anyone there?").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(chat.thread().len(), 1);
        assert_eq!(chat.thread()[0].content, "anyone there?");
        assert!(chat.session_id().is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_thread() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat().returning(|_| Ok(reply("ok", 3)));
        mock.expect_reset()
            .withf(|id| *id == SessionId::Int(3))
            .times(1)
            .returning(|id| {
                Ok(ResetAck {
                    status: "reset".to_string(),
                    session_id: id.clone(),
                })
            });

        let mut chat = ChatSession::new(None);
        chat.send(&mock, "hi").await.unwrap();
        chat.reset(&mock).await.unwrap();
        assert!(chat.thread().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_prompt_replaced_after_update() {
        let mut mock = MockChatBackend::new();
        mock.expect_set_system_prompt()
            .withf(|u| u.session_id == SessionId::Int(4) && u.system_prompt == "Be verbose.")
            .times(1)
            .returning(|u| {
                Ok(PromptUpdateAck {
                    status: "updated".to_string(),
                    session_id: u.session_id.clone(),
                    system_prompt: u.system_prompt.clone(),
                })
            });

        let mut chat = ChatSession::new(Some(SessionId::Int(4)))
            .with_system_prompt(Some("Be terse.".to_string()));
        assert_eq!(chat.system_prompt(), Some("Be terse."));

        chat.set_prompt(&mock, "Be verbose.").await.unwrap();
        assert_eq!(chat.system_prompt(), Some("Be verbose."));
    }

    #[tokio::test]
    async fn test_commands_need_a_session() {
        let mock = MockChatBackend::new();
        let mut chat = ChatSession::new(None);
        assert!(chat.reset(&mock).await.is_err());
        assert!(chat.refresh(&mock).await.is_err());
        assert!(chat.set_prompt(&mock, "x").await.is_err());
    }
}
