//! HTTP implementation of [`ChatBackend`]
//!
//! Talks JSON to the chat backend over `reqwest`. Each call maps its
//! failure onto one of three kinds: the request never completed
//! (`Network`), the backend refused it (`Server` / `NotFound`), or the
//! body could not be decoded (`MalformedResponse`).

use crate::backend::types::ErrorBody;
use crate::backend::{
    ChatBackend, ChatMessage, ChatReply, ChatRequest, PromptUpdate, PromptUpdateAck, ResetAck,
    SessionId, SessionPage,
};
use crate::config::BackendConfig;
use crate::error::{ChatlineError, Result};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Chat backend reached over plain HTTP
///
/// # Examples
///
/// ```
/// use chatline::backend::HttpBackend;
/// use chatline::config::BackendConfig;
///
/// let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
/// assert_eq!(backend.base_url().as_str(), "http://127.0.0.1:8000/");
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ChatlineError::Config(format!("Invalid backend URL {}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ChatlineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized chat backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ChatlineError::Config(format!("Invalid endpoint {}: {}", path, e)).into())
    }

    /// Send a request and decode a JSON body, classifying every failure
    async fn execute<T: DeserializeOwned>(&self, what: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Request for {} failed: {}", what, e);
            if e.is_timeout() {
                ChatlineError::Network(format!("{} timed out", what))
            } else {
                ChatlineError::Network(format!("Failed to reach backend for {}: {}", what, e))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ChatlineError::Network(format!("Failed to read {} response: {}", what, e))
        })?;

        if !status.is_success() {
            let detail = error_detail(&body);
            tracing::error!("Backend returned {} for {}: {}", status, what, detail);
            if status == StatusCode::NOT_FOUND {
                return Err(ChatlineError::NotFound(detail).into());
            }
            return Err(ChatlineError::Server {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            ChatlineError::MalformedResponse(format!("{}: {}", what, e)).into()
        })
    }
}

/// Pull a human-readable message out of an error body
///
/// Prefers the FastAPI `detail` field; validation errors arrive as a list
/// and are rendered as compact JSON.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_sessions(&self, skip: usize, limit: usize) -> Result<SessionPage> {
        let url = self.endpoint("sessions")?;
        tracing::debug!("Fetching sessions: skip={}, limit={}", skip, limit);
        let request = self.client.get(url).query(&[("skip", skip), ("limit", limit)]);
        self.execute("sessions", request).await
    }

    async fn messages(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let mut url = self.endpoint("messages/")?;
        url.path_segments_mut()
            .map_err(|_| ChatlineError::Config("Backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&session_id.to_string());
        tracing::debug!("Fetching messages for session {}", session_id);
        self.execute("messages", self.client.get(url)).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.endpoint("chat")?;
        tracing::debug!("Posting chat message (session={:?})", request.session_id);
        self.execute("chat", self.client.post(url).json(request)).await
    }

    async fn set_system_prompt(&self, update: &PromptUpdate) -> Result<PromptUpdateAck> {
        let url = self.endpoint("set_system_prompt")?;
        tracing::debug!("Updating system prompt for session {}", update.session_id);
        self.execute("set_system_prompt", self.client.post(url).json(update)).await
    }

    async fn reset(&self, session_id: &SessionId) -> Result<ResetAck> {
        let url = self.endpoint("reset")?;
        tracing::debug!("Resetting session {}", session_id);
        let request = self
            .client
            .post(url)
            .query(&[("session_id", session_id.to_string())]);
        self.execute("reset", request).await
    }
}
