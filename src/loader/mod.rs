//! Paginated session loading
//!
//! The session list is fetched in fixed-size windows. [`LoaderState`] holds
//! everything seen so far and is advanced only by [`update`], a pure
//! function from `(state, event)` to `(state, command)`. The async
//! [`SessionLoader`] driver executes the commands against a
//! [`ChatBackend`](crate::backend::ChatBackend) and feeds the outcome back
//! in; [`ScrollObserver`] turns scroll positions into load triggers.
//!
//! # Cursor semantics
//!
//! The offset cursor advances by the number of items a page *returned*, not
//! the number merged after de-duplication. A backend that serves
//! overlapping windows can therefore cause items to be skipped; overlaps
//! are logged at `warn` so the condition is visible.

pub mod driver;
pub mod scroll;

pub use driver::SessionLoader;
pub use scroll::{ScrollMetrics, ScrollObserver, ScrollSubscription};

use crate::backend::{Session, SessionId, SessionPage};
use crate::error::ChatlineError;
use std::collections::HashSet;
use std::fmt;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Failure category of a page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The request could not complete
    Network,
    /// The backend answered with a non-success status
    Server,
    /// The body was missing fields or had the wrong shape
    MalformedResponse,
}

/// User-visible error recorded when pagination halts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Failure category
    pub kind: LoadErrorKind,
    /// Message shown to the user
    pub message: String,
}

impl LoadError {
    /// Classify an error returned by the backend
    ///
    /// Errors that are not a [`ChatlineError`] are treated as network
    /// failures: the request did not produce a usable answer.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let kind = match err.downcast_ref::<ChatlineError>() {
            Some(ChatlineError::Server { .. }) | Some(ChatlineError::NotFound(_)) => {
                LoadErrorKind::Server
            }
            Some(ChatlineError::MalformedResponse(_)) | Some(ChatlineError::Serialization(_)) => {
                LoadErrorKind::MalformedResponse
            }
            _ => LoadErrorKind::Network,
        };
        Self {
            kind,
            message: format!("Failed to load sessions: {}", err),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Something that happened to the session list
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// The list view became visible; loads the first page once
    ViewStarted,
    /// The scroll observer reported an approach to the bottom
    ScrollTriggered,
    /// A caller asked for the next page directly
    NextPageRequested,
    /// The outstanding request returned a page
    PageFetched(SessionPage),
    /// The outstanding request failed
    FetchFailed(LoadError),
}

/// Request to issue against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPage {
    /// Offset of the first session in the window
    pub skip: usize,
    /// Window size
    pub limit: usize,
}

/// Cumulative state of the paginated session list
///
/// Invariants:
/// - `sessions` never holds two entries with the same id
/// - `cursor` only moves forward, by the length of each returned page
/// - once `has_more` is false it stays false
#[derive(Debug, Clone)]
pub struct LoaderState {
    sessions: Vec<Session>,
    seen: HashSet<SessionId>,
    page_size: usize,
    cursor: usize,
    total: Option<usize>,
    has_more: bool,
    in_flight: bool,
    started: bool,
    requests_issued: usize,
    error: Option<LoadError>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl LoaderState {
    /// Empty state for a freshly started list view
    ///
    /// A page size of zero is bumped to one so the cursor can advance.
    pub fn new(page_size: usize) -> Self {
        Self {
            sessions: Vec::new(),
            seen: HashSet::new(),
            page_size: page_size.max(1),
            cursor: 0,
            total: None,
            has_more: true,
            in_flight: false,
            started: false,
            requests_issued: 0,
            error: None,
        }
    }

    /// Sessions loaded so far, in fetch order
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Next offset to request
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Last total reported by the backend
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Whether more pages are believed available
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a request is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Error that halted pagination, if any
    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    /// Window size
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of page requests issued over the state's lifetime
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// Loading finished without error and nothing was found
    pub fn is_empty_and_complete(&self) -> bool {
        self.sessions.is_empty() && !self.has_more && !self.in_flight && self.error.is_none()
    }

    /// Preconditions of a page fetch: nothing in flight, more pages expected
    pub fn can_fetch(&self) -> bool {
        !self.in_flight && self.has_more
    }

    fn begin_fetch(&mut self) -> Option<FetchPage> {
        if !self.can_fetch() {
            tracing::debug!(
                in_flight = self.in_flight,
                has_more = self.has_more,
                "Page request ignored"
            );
            return None;
        }
        self.in_flight = true;
        self.started = true;
        self.requests_issued += 1;
        let command = FetchPage {
            skip: self.cursor,
            limit: self.page_size,
        };
        tracing::debug!(skip = command.skip, limit = command.limit, "Requesting page");
        Some(command)
    }

    fn merge_page(&mut self, page: SessionPage) {
        if !self.in_flight {
            tracing::warn!("Dropping page that arrived with no request outstanding");
            return;
        }

        let returned = page.data.len();
        let mut merged = 0;
        for session in page.data {
            if self.seen.insert(session.id.clone()) {
                self.sessions.push(session);
                merged += 1;
            }
        }
        if merged < returned {
            tracing::warn!(
                returned,
                merged,
                skip = self.cursor,
                "Page overlapped already loaded sessions"
            );
        }

        self.cursor += returned;
        self.total = Some(page.total);
        if returned == 0 || self.cursor >= page.total {
            self.has_more = false;
        }
        self.in_flight = false;

        tracing::debug!(
            returned,
            merged,
            cursor = self.cursor,
            total = page.total,
            has_more = self.has_more,
            "Merged page"
        );
    }

    fn fail(&mut self, error: LoadError) {
        if !self.in_flight {
            tracing::warn!("Ignoring failure with no request outstanding: {}", error);
            return;
        }
        tracing::error!("Pagination halted: {}", error);
        self.has_more = false;
        self.in_flight = false;
        self.error = Some(error);
    }
}

/// Advance the loader state by one event
///
/// Returns the new state and, when a request should be issued, the window
/// to fetch. The caller must report the outcome with
/// [`LoaderEvent::PageFetched`] or [`LoaderEvent::FetchFailed`].
///
/// # Examples
///
/// ```
/// use chatline::loader::{update, FetchPage, LoaderEvent, LoaderState};
///
/// let (state, cmd) = update(LoaderState::new(10), LoaderEvent::ViewStarted);
/// assert_eq!(cmd, Some(FetchPage { skip: 0, limit: 10 }));
///
/// // A second trigger while the first request is outstanding does nothing
/// let (state, cmd) = update(state, LoaderEvent::ScrollTriggered);
/// assert_eq!(cmd, None);
/// assert!(state.is_loading());
/// ```
pub fn update(mut state: LoaderState, event: LoaderEvent) -> (LoaderState, Option<FetchPage>) {
    let command = match event {
        LoaderEvent::ViewStarted => {
            if state.started {
                None
            } else {
                state.begin_fetch()
            }
        }
        LoaderEvent::ScrollTriggered | LoaderEvent::NextPageRequested => state.begin_fetch(),
        LoaderEvent::PageFetched(page) => {
            state.merge_page(page);
            None
        }
        LoaderEvent::FetchFailed(error) => {
            state.fail(error);
            None
        }
    };
    (state, command)
}
