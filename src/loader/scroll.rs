//! Scroll-position trigger for loading the next page
//!
//! The observer fires at most once per approach to the bottom of the
//! scrollable region. It re-arms when the viewport moves back above the
//! threshold or when the outstanding fetch completes.

use std::ops::{Deref, DerefMut};

/// Default remaining distance below which the next page loads
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 200.0;

/// Geometry of the scrollable region, in consistent units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance from the top of the content to the top of the viewport
    pub scroll_offset: f64,
    /// Visible height
    pub viewport_height: f64,
    /// Total content height
    pub content_height: f64,
}

impl ScrollMetrics {
    /// Remaining distance between the bottom of the viewport and the end
    /// of the content, never negative
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::loader::ScrollMetrics;
    ///
    /// let m = ScrollMetrics { scroll_offset: 100.0, viewport_height: 400.0, content_height: 1000.0 };
    /// assert_eq!(m.distance_to_bottom(), 500.0);
    /// ```
    pub fn distance_to_bottom(&self) -> f64 {
        (self.content_height - (self.scroll_offset + self.viewport_height)).max(0.0)
    }
}

/// Turns scroll positions into at-most-once load triggers
#[derive(Debug, Clone)]
pub struct ScrollObserver {
    threshold: f64,
    armed: bool,
    attached: bool,
}

impl ScrollObserver {
    /// Create a detached observer
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
            armed: true,
            attached: false,
        }
    }

    /// Distance below which a trigger fires
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether scroll events are currently being observed
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Start observing; the returned guard detaches on drop
    pub fn attach(&mut self) -> ScrollSubscription<'_> {
        self.attached = true;
        self.armed = true;
        tracing::debug!(threshold = self.threshold, "Scroll observer attached");
        ScrollSubscription { observer: self }
    }

    /// Report a scroll position
    ///
    /// `loader_ready` is true when no fetch is in flight and more pages
    /// remain. Returns true exactly when the caller should fetch the next
    /// page.
    pub fn observe(&mut self, metrics: ScrollMetrics, loader_ready: bool) -> bool {
        if !self.attached {
            return false;
        }

        if metrics.distance_to_bottom() >= self.threshold {
            self.armed = true;
            return false;
        }

        if self.armed && loader_ready {
            self.armed = false;
            tracing::debug!(
                distance = metrics.distance_to_bottom(),
                "Approached bottom, triggering page load"
            );
            return true;
        }
        false
    }

    /// Allow the next approach to fire once the outstanding fetch is done
    pub fn fetch_completed(&mut self) {
        self.armed = true;
    }

    fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            tracing::debug!("Scroll observer detached");
        }
    }
}

impl Default for ScrollObserver {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THRESHOLD)
    }
}

/// Live attachment of a [`ScrollObserver`]
///
/// Dereferences to the observer. Dropping the guard detaches it, so every
/// exit path of a view (return, `?`, panic) stops observation.
#[derive(Debug)]
pub struct ScrollSubscription<'a> {
    observer: &'a mut ScrollObserver,
}

impl Deref for ScrollSubscription<'_> {
    type Target = ScrollObserver;

    fn deref(&self) -> &Self::Target {
        self.observer
    }
}

impl DerefMut for ScrollSubscription<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.observer
    }
}

impl Drop for ScrollSubscription<'_> {
    fn drop(&mut self) {
        self.observer.detach();
    }
}
