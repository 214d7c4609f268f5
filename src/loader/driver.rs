//! Async driver that runs loader commands against a backend

use crate::backend::{ChatBackend, Session};
use crate::loader::{
    update, FetchPage, LoadError, LoaderEvent, LoaderState, ScrollMetrics, ScrollObserver,
};
use std::sync::Arc;

/// Owns the loader state for one list view and executes its fetches
///
/// All mutation goes through [`update`]. The in-flight flag is raised by the
/// event that produces a [`FetchPage`] and lowered only after the outcome
/// has been merged.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatline::backend::HttpBackend;
/// use chatline::config::BackendConfig;
/// use chatline::loader::SessionLoader;
///
/// # async fn example() -> chatline::error::Result<()> {
/// let backend = Arc::new(HttpBackend::new(&BackendConfig::default())?);
/// let mut loader = SessionLoader::new(backend, 10);
/// loader.start().await;
/// println!("{} sessions loaded", loader.sessions().len());
/// # Ok(())
/// # }
/// ```
pub struct SessionLoader {
    backend: Arc<dyn ChatBackend>,
    state: LoaderState,
}

impl SessionLoader {
    /// Create a loader with an empty state
    pub fn new(backend: Arc<dyn ChatBackend>, page_size: usize) -> Self {
        Self {
            backend,
            state: LoaderState::new(page_size),
        }
    }

    /// Current state
    pub fn state(&self) -> &LoaderState {
        &self.state
    }

    /// Sessions loaded so far
    pub fn sessions(&self) -> &[Session] {
        self.state.sessions()
    }

    /// View start hook: loads the first page, once
    ///
    /// Returns true if a request was issued.
    pub async fn start(&mut self) -> bool {
        self.dispatch_and_run(LoaderEvent::ViewStarted).await
    }

    /// Load the next page if nothing is in flight and more pages remain
    ///
    /// Returns true if a request was issued.
    pub async fn fetch_next_page(&mut self) -> bool {
        self.dispatch_and_run(LoaderEvent::NextPageRequested).await
    }

    /// Feed a scroll position through the observer, loading a page when it
    /// triggers
    ///
    /// Returns true if a request was issued.
    pub async fn on_scroll(&mut self, observer: &mut ScrollObserver, metrics: ScrollMetrics) -> bool {
        if !observer.observe(metrics, self.state.can_fetch()) {
            return false;
        }
        let issued = self.dispatch_and_run(LoaderEvent::ScrollTriggered).await;
        observer.fetch_completed();
        issued
    }

    /// Keep loading until the backend reports no more pages or a fetch fails
    pub async fn load_all(&mut self) {
        self.start().await;
        while self.fetch_next_page().await {}
    }

    /// Apply an event to the state and return the resulting command
    pub fn dispatch(&mut self, event: LoaderEvent) -> Option<FetchPage> {
        let state = std::mem::take(&mut self.state);
        let (next, command) = update(state, event);
        self.state = next;
        command
    }

    async fn dispatch_and_run(&mut self, event: LoaderEvent) -> bool {
        match self.dispatch(event) {
            Some(command) => {
                self.run(command).await;
                true
            }
            None => false,
        }
    }

    /// Execute one fetch command and merge its outcome
    pub async fn run(&mut self, command: FetchPage) {
        let outcome = match self
            .backend
            .list_sessions(command.skip, command.limit)
            .await
        {
            Ok(page) => LoaderEvent::PageFetched(page),
            Err(e) => LoaderEvent::FetchFailed(LoadError::from_error(&e)),
        };
        self.dispatch(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockChatBackend, SessionPage};
    use crate::error::ChatlineError;
    use crate::loader::tests::page;
    use crate::loader::LoadErrorKind;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn loader_with(mock: MockChatBackend) -> SessionLoader {
        SessionLoader::new(Arc::new(mock), 10)
    }

    #[tokio::test]
    async fn test_two_pages_then_failure() {
        let mut mock = MockChatBackend::new();
        let mut seq = Sequence::new();
        mock.expect_list_sessions()
            .with(eq(0), eq(10))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(35, 1..=10)));
        mock.expect_list_sessions()
            .with(eq(10), eq(10))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(35, 11..=20)));
        mock.expect_list_sessions()
            .with(eq(20), eq(10))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(ChatlineError::Server {
                    status: 500,
                    detail: "Internal server error".to_string(),
                }
                .into())
            });

        let mut loader = loader_with(mock);
        loader.load_all().await;

        assert_eq!(loader.sessions().len(), 20);
        assert!(!loader.state().has_more());
        let error = loader.state().error().expect("error recorded");
        assert_eq!(error.kind, LoadErrorKind::Server);
        assert!(error.message.contains("Internal server error"));

        // Pagination stays halted
        assert!(!loader.fetch_next_page().await);
    }

    #[tokio::test]
    async fn test_empty_backend_issues_single_request() {
        let mut mock = MockChatBackend::new();
        mock.expect_list_sessions().times(1).returning(|_, _| {
            Ok(SessionPage {
                total: 0,
                data: vec![],
            })
        });

        let mut loader = loader_with(mock);
        assert!(loader.start().await);
        assert!(loader.state().is_empty_and_complete());
        assert!(!loader.fetch_next_page().await);
        assert!(!loader.start().await);
    }

    #[tokio::test]
    async fn test_scroll_triggers_only_near_bottom() {
        let mut mock = MockChatBackend::new();
        let mut seq = Sequence::new();
        mock.expect_list_sessions()
            .with(eq(0), eq(10))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(20, 1..=10)));
        mock.expect_list_sessions()
            .with(eq(10), eq(10))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(20, 11..=20)));

        let mut loader = loader_with(mock);
        let mut observer = ScrollObserver::new(200.0);
        let mut sub = observer.attach();
        loader.start().await;

        let far = ScrollMetrics {
            scroll_offset: 0.0,
            viewport_height: 400.0,
            content_height: 1000.0,
        };
        let near = ScrollMetrics {
            scroll_offset: 500.0,
            ..far
        };
        assert!(!loader.on_scroll(&mut sub, far).await);
        assert!(loader.on_scroll(&mut sub, near).await);
        assert_eq!(loader.sessions().len(), 20);

        // Everything loaded: further approaches never reach the backend
        assert!(!loader.on_scroll(&mut sub, far).await);
        assert!(!loader.on_scroll(&mut sub, near).await);
    }

    #[tokio::test]
    async fn test_malformed_page_halts() {
        let mut mock = MockChatBackend::new();
        mock.expect_list_sessions().times(1).returning(|_, _| {
            Err(ChatlineError::MalformedResponse("missing field `total`".to_string()).into())
        });

        let mut loader = loader_with(mock);
        loader.load_all().await;
        assert!(loader.sessions().is_empty());
        assert_eq!(
            loader.state().error().map(|e| e.kind),
            Some(LoadErrorKind::MalformedResponse)
        );
        assert!(!loader.state().is_empty_and_complete());
    }
}
