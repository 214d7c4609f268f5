//! Command-line interface definition for chatline
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for listing and browsing sessions, reading a
//! message thread, chatting, and editing a session's system prompt.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chatline - terminal client for a remote chat backend
///
/// Browse chat sessions page by page, read and continue conversations,
/// and edit per-session system prompts.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/chatline.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for chatline
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print chat sessions as a table or JSON
    Sessions {
        /// Sessions per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,

        /// Offset of the first session to print
        #[arg(long, default_value = "0")]
        skip: usize,

        /// Keep fetching pages until every session is loaded
        #[arg(short, long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Interactively scroll through sessions, loading pages on demand
    Browse,

    /// Print the message thread of a session
    Messages {
        /// Session identifier
        session_id: String,

        /// Print JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive chat, optionally continuing a session
    Chat {
        /// Session to continue; a new session is created when omitted
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Set the system prompt of a session
    Prompt {
        /// Session identifier
        session_id: String,

        /// New prompt text
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the new prompt from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Clear the message history of a session
    Reset {
        /// Session identifier
        session_id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
