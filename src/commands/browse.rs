//! Interactive session browser
//!
//! A line-command viewport over [`SessionLoader`]. Every movement reports
//! the new scroll position to the [`ScrollObserver`], which decides when the
//! next page is pulled in. Prompt edits made here live in a local overlay
//! and never touch the loader state.

use crate::backend::{ChatBackend, Session, SessionId};
use crate::commands::chat::{run_chat, ChatSession};
use crate::commands::messages::show_messages;
use crate::commands::prompt::{edit_interactively, submit_prompt};
use crate::commands::sessions::{format_created_at, truncate};
use crate::config::{Config, SessionsConfig};
use crate::error::Result;
use crate::loader::{ScrollMetrics, ScrollObserver, SessionLoader};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::HashMap;
use std::sync::Arc;

/// Rows taken by one session block, including the blank separator
pub const ENTRY_LINES: usize = 4;

/// A line command typed at the browser prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    /// Scroll one row down
    LineDown,
    /// Scroll one row up
    LineUp,
    /// Scroll one viewport down
    PageDown,
    /// Scroll one viewport up
    PageUp,
    /// Jump to the first row
    Top,
    /// Jump to the last loaded row
    Bottom,
    /// Show the thread of the n-th listed session (1-based)
    Open(usize),
    /// Edit the system prompt of the n-th listed session (1-based)
    Edit(usize),
    /// Continue chatting in the n-th listed session (1-based)
    Chat(usize),
    /// Start a chat in a fresh session
    New,
    /// Show the key help
    Help,
    /// Leave the browser
    Quit,
    /// Anything unrecognised
    Unknown(String),
}

/// Parse one line of browser input
///
/// Movement keys are case-sensitive (`g` is top, `G` is bottom). An empty
/// line pages down.
pub fn parse_browse_command(input: &str) -> BrowseCommand {
    let trimmed = input.trim();
    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (trimmed, ""),
    };
    let index = arg.parse::<usize>().ok().filter(|n| *n > 0);
    let unknown = || BrowseCommand::Unknown(trimmed.to_string());

    match word {
        "o" | "open" => index.map_or_else(unknown, BrowseCommand::Open),
        "e" | "edit" => index.map_or_else(unknown, BrowseCommand::Edit),
        "c" | "chat" => index.map_or_else(unknown, BrowseCommand::Chat),
        _ if !arg.is_empty() => unknown(),
        "j" | "down" => BrowseCommand::LineDown,
        "k" | "up" => BrowseCommand::LineUp,
        "" | "f" | "space" | "pgdn" => BrowseCommand::PageDown,
        "b" | "pgup" => BrowseCommand::PageUp,
        "g" => BrowseCommand::Top,
        "G" => BrowseCommand::Bottom,
        "new" => BrowseCommand::New,
        "?" | "help" => BrowseCommand::Help,
        "q" | "quit" | "exit" => BrowseCommand::Quit,
        _ => unknown(),
    }
}

/// Viewport state of the session browser
pub struct SessionBrowser {
    loader: SessionLoader,
    overrides: HashMap<SessionId, String>,
    scroll_rows: usize,
    viewport_lines: usize,
    line_height: f64,
}

impl SessionBrowser {
    /// Wrap a loader with the configured viewport geometry
    pub fn new(loader: SessionLoader, config: &SessionsConfig) -> Self {
        Self {
            loader,
            overrides: HashMap::new(),
            scroll_rows: 0,
            viewport_lines: config.viewport_lines.max(1),
            line_height: config.line_height,
        }
    }

    /// Underlying loader
    pub fn loader(&self) -> &SessionLoader {
        &self.loader
    }

    /// First visible row
    pub fn scroll_rows(&self) -> usize {
        self.scroll_rows
    }

    /// Prompt to display for a session, preferring local edits
    pub fn prompt_for<'a>(&'a self, session: &'a Session) -> Option<&'a str> {
        self.overrides
            .get(&session.id)
            .map(String::as_str)
            .or(session.system_prompt.as_deref())
    }

    /// Record a prompt edited from this view
    pub fn apply_prompt(&mut self, session_id: SessionId, prompt: String) {
        self.overrides.insert(session_id, prompt);
    }

    /// The n-th listed session, 1-based
    pub fn session_at(&self, n: usize) -> Option<&Session> {
        n.checked_sub(1).and_then(|i| self.loader.sessions().get(i))
    }

    /// Chat state for continuing the n-th listed session, seeded with the
    /// prompt shown for it
    pub fn chat_session_for(&self, n: usize) -> Option<ChatSession> {
        self.session_at(n).map(|session| {
            ChatSession::new(Some(session.id.clone()))
                .with_system_prompt(self.prompt_for(session).map(str::to_string))
        })
    }

    /// Carry a prompt set during a chat back into the overlay
    pub fn absorb_chat(&mut self, chat: &ChatSession) {
        if let (Some(id), Some(prompt)) = (chat.session_id(), chat.system_prompt()) {
            self.apply_prompt(id.clone(), prompt.to_string());
        }
    }

    fn content_rows(&self) -> usize {
        self.loader.sessions().len() * ENTRY_LINES
    }

    fn max_offset(&self) -> usize {
        self.content_rows().saturating_sub(self.viewport_lines)
    }

    /// Current geometry in observer units
    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_offset: self.scroll_rows as f64 * self.line_height,
            viewport_height: self.viewport_lines as f64 * self.line_height,
            content_height: self.content_rows() as f64 * self.line_height,
        }
    }

    /// Load the first page, then keep loading while the viewport is short
    pub async fn start(&mut self, observer: &mut ScrollObserver) {
        self.loader.start().await;
        self.settle(observer).await;
    }

    /// Move to `row`, clamped to the loaded content, and report the move
    pub async fn scroll_to(&mut self, observer: &mut ScrollObserver, row: usize) {
        self.scroll_rows = row.min(self.max_offset());
        self.settle(observer).await;
    }

    /// Move by `delta` rows
    pub async fn scroll_by(&mut self, observer: &mut ScrollObserver, delta: isize) {
        let row = self.scroll_rows.saturating_add_signed(delta);
        self.scroll_to(observer, row).await;
    }

    /// Apply one movement command; other commands are ignored
    pub async fn navigate(&mut self, observer: &mut ScrollObserver, command: &BrowseCommand) {
        let page = self.viewport_lines as isize;
        match command {
            BrowseCommand::LineDown => self.scroll_by(observer, 1).await,
            BrowseCommand::LineUp => self.scroll_by(observer, -1).await,
            BrowseCommand::PageDown => self.scroll_by(observer, page).await,
            BrowseCommand::PageUp => self.scroll_by(observer, -page).await,
            BrowseCommand::Top => self.scroll_to(observer, 0).await,
            BrowseCommand::Bottom => self.scroll_to(observer, usize::MAX).await,
            _ => {}
        }
    }

    async fn settle(&mut self, observer: &mut ScrollObserver) {
        while self.loader.on_scroll(observer, self.metrics()).await {}
    }

    /// Status line under the list, if any
    pub fn status_line(&self) -> Option<String> {
        let state = self.loader.state();
        if state.is_loading() {
            Some("Loading sessions...".to_string())
        } else if state.is_empty_and_complete() {
            Some("No chat sessions found.".to_string())
        } else if let Some(error) = state.error() {
            Some(error.message.clone())
        } else if state.total().is_some() && !state.has_more() {
            Some(format!("End of list. {} sessions.", state.sessions().len()))
        } else {
            None
        }
    }

    fn content_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.content_rows());
        for (i, session) in self.loader.sessions().iter().enumerate() {
            let prompt = self
                .prompt_for(session)
                .map(|p| truncate(p, 60))
                .unwrap_or_else(|| "(default)".to_string());
            lines.push(format!("{:>3}. Session {}", i + 1, session.id.to_string().cyan()));
            lines.push(format!("     Prompt:  {}", prompt));
            lines.push(format!(
                "     Created: {}",
                format_created_at(&session.created_at).dimmed()
            ));
            lines.push(String::new());
        }
        lines
    }

    /// Visible rows followed by the status line
    pub fn render_viewport(&self) -> Vec<String> {
        let mut visible: Vec<String> = self
            .content_lines()
            .into_iter()
            .skip(self.scroll_rows)
            .take(self.viewport_lines)
            .collect();

        match self.status_line() {
            Some(status) if self.loader.state().error().is_some() => {
                visible.push(status.red().to_string())
            }
            Some(status) => visible.push(status.yellow().to_string()),
            None => visible.push("-- more --".dimmed().to_string()),
        }
        visible
    }
}

fn print_browse_help() {
    println!(
        r#"
Browser Commands
================

  j / down        Scroll one line down
  k / up          Scroll one line up
  Enter / f       Scroll one page down
  b / pgup        Scroll one page up
  g / G           Jump to top / bottom
  open N          Show the messages of session N
  edit N          Edit the system prompt of session N
  chat N          Continue chatting in session N
  new             Chat in a new session
  q               Quit
"#
    );
}

/// Run `chatline browse`
///
/// The scroll observer is attached for the lifetime of the view and
/// detached when it ends, however it ends.
pub async fn run_browse(backend: Arc<dyn ChatBackend>, config: &Config) -> Result<()> {
    let mut observer = ScrollObserver::new(config.sessions.scroll_threshold);
    let mut subscription = observer.attach();

    let loader = SessionLoader::new(Arc::clone(&backend), config.sessions.page_size);
    let mut browser = SessionBrowser::new(loader, &config.sessions);

    println!("{}", "Loading sessions...".yellow());
    browser.start(&mut subscription).await;

    let mut rl = DefaultEditor::new()?;
    loop {
        println!();
        for line in browser.render_viewport() {
            println!("{}", line);
        }

        let line = match rl.readline("browse> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let command = parse_browse_command(&line);
        match &command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => print_browse_help(),
            BrowseCommand::Unknown(input) => {
                println!("{}", format!("Unknown command: {}. Type ? for help.", input).yellow())
            }
            BrowseCommand::Open(n) => match browser.session_at(*n).map(|s| s.id.clone()) {
                Some(id) => {
                    if let Err(e) = show_messages(backend.as_ref(), &id, false).await {
                        eprintln!("{} {}", "Error:".red(), e);
                    }
                }
                None => println!("{}", format!("No session {} in the list.", n).yellow()),
            },
            BrowseCommand::Edit(n) => {
                let Some(session) = browser.session_at(*n) else {
                    println!("{}", format!("No session {} in the list.", n).yellow());
                    continue;
                };
                let id = session.id.clone();
                let current = browser.prompt_for(session).unwrap_or("").to_string();

                let Some(prompt) = edit_interactively(&mut rl, &current)? else {
                    println!("Cancelled.");
                    continue;
                };
                match submit_prompt(backend.as_ref(), &id, &prompt).await {
                    Ok(ack) => {
                        browser.apply_prompt(id, ack.system_prompt);
                        println!("{}", "System prompt updated.".green());
                    }
                    Err(e) => eprintln!("{} {}", "Error:".red(), e),
                }
            }
            BrowseCommand::Chat(n) => {
                let Some(session) = browser.chat_session_for(*n) else {
                    println!("{}", format!("No session {} in the list.", n).yellow());
                    continue;
                };
                let chat = run_chat(backend.as_ref(), &config.chat, session).await?;
                browser.absorb_chat(&chat);
            }
            BrowseCommand::New => {
                let chat = run_chat(backend.as_ref(), &config.chat, ChatSession::new(None)).await?;
                if let Some(id) = chat.session_id() {
                    println!("Chat saved as session {}.", id.to_string().cyan());
                }
            }
            movement => browser.navigate(&mut subscription, movement).await,
        }
    }

    drop(subscription);
    tracing::debug!(attached = observer.is_attached(), "Session browser closed");
    Ok(())
}
