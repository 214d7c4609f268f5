//! Backend module for chatline
//!
//! This module contains the chat backend abstraction and its HTTP
//! implementation. Every piece of persistent state (sessions, messages,
//! system prompts) lives behind this trait.

pub mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::{
    ChatMessage, ChatReply, ChatRequest, PromptUpdate, PromptUpdateAck, ResetAck, Role, Session,
    SessionId, SessionPage,
};

use crate::error::Result;
use async_trait::async_trait;

/// Remote chat backend
///
/// One method per endpoint. Implementations map transport failures,
/// non-success statuses and undecodable bodies onto
/// [`ChatlineError`](crate::error::ChatlineError) variants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fetch the session window starting at `skip`, at most `limit` long
    async fn list_sessions(&self, skip: usize, limit: usize) -> Result<SessionPage>;

    /// Fetch the full message thread of a session
    async fn messages(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>>;

    /// Send a user message and wait for the assistant reply
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Replace the system prompt of a session
    async fn set_system_prompt(&self, update: &PromptUpdate) -> Result<PromptUpdateAck>;

    /// Delete every message of a session
    async fn reset(&self, session_id: &SessionId) -> Result<ResetAck>;
}
