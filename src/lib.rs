//! chatline - terminal client library for a remote chat backend
//!
//! This library provides the pieces behind the `chatline` binary: a typed
//! client for the backend's HTTP API, an incrementally paginated session
//! loader driven by scroll position, and the terminal views built on top.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `backend`: The `ChatBackend` trait, its HTTP implementation, and wire types
//! - `loader`: Pagination state machine, scroll observer, and async driver
//! - `commands`: Handlers for each CLI subcommand
//! - `markdown`: Light markdown formatting for message content
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatline::{Config, HttpBackend, SessionLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let backend = Arc::new(HttpBackend::new(&config.backend)?);
//!     let mut loader = SessionLoader::new(backend, config.sessions.page_size);
//!     loader.load_all().await;
//!     println!("{} sessions", loader.sessions().len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod loader;
pub mod markdown;

// Re-export commonly used types
pub use backend::{ChatBackend, HttpBackend, Session, SessionId, SessionPage};
pub use config::Config;
pub use error::{ChatlineError, Result};
pub use loader::{LoaderState, ScrollObserver, SessionLoader};
