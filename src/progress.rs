//! Progress-callback trait for pagination and translation events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to observe where
//! the paginator cuts, which crops it discards as blank, and which translated
//! leaves fell back to their original text.
//!
//! # Example
//!
//! ```rust
//! use bid_report::{ReportProgressCallback, ReportConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     dropped: AtomicUsize,
//! }
//!
//! impl ReportProgressCallback for CountingCallback {
//!     fn on_page_dropped(&self, top: u32, bottom: u32) {
//!         self.dropped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("blank crop {top}..{bottom} skipped");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { dropped: AtomicUsize::new(0) });
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(counter as Arc<dyn ReportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::paginate::CutKind;
use std::sync::Arc;

/// Called by the report pipeline as it renders, paginates and translates.
///
/// Implementations must be `Send + Sync`: translation leaves complete
/// concurrently. All methods default to no-ops.
pub trait ReportProgressCallback: Send + Sync {
    /// The HTML report was rasterised into a `width` × `height` bitmap.
    fn on_render_complete(&self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// A crop `[top, bottom)` was accepted as page `page_num` (1-indexed).
    fn on_cut(&self, page_num: usize, top: u32, bottom: u32, kind: CutKind) {
        let _ = (page_num, top, bottom, kind);
    }

    /// A blank crop `[top, bottom)` was discarded.
    fn on_page_dropped(&self, top: u32, bottom: u32) {
        let _ = (top, bottom);
    }

    /// Pagination finished with `pages` accepted pages.
    fn on_pagination_complete(&self, pages: usize) {
        let _ = pages;
    }

    /// The leaf at `path` (e.g. `Eligibility.Min_Turnover`, `Required_Documents[2]`)
    /// could not be translated and kept its original value.
    fn on_translation_fallback(&self, path: &str, error: &str) {
        let _ = (path, error);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

/// Return the configured callback, or a shared no-op.
pub(crate) fn or_noop(cb: Option<&ProgressCallback>) -> ProgressCallback {
    cb.cloned()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback) as ProgressCallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        cuts: AtomicUsize,
        dropped: AtomicUsize,
        fallbacks: Mutex<Vec<String>>,
    }

    impl ReportProgressCallback for TrackingCallback {
        fn on_cut(&self, _page_num: usize, _top: u32, _bottom: u32, _kind: CutKind) {
            self.cuts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_dropped(&self, _top: u32, _bottom: u32) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_translation_fallback(&self, path: &str, _error: &str) {
            self.fallbacks.lock().unwrap().push(path.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_render_complete(1240, 7016);
        cb.on_cut(1, 0, 1700, CutKind::Blank);
        cb.on_page_dropped(1700, 3400);
        cb.on_pagination_complete(1);
        cb.on_translation_fallback("a", "boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_cut(1, 0, 1200, CutKind::Border);
        tracker.on_cut(2, 1200, 2400, CutKind::FinalPage);
        tracker.on_page_dropped(2400, 2500);
        tracker.on_translation_fallback("b[1]", "HTTP 500");

        assert_eq!(tracker.cuts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.dropped.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.fallbacks.lock().unwrap(), vec!["b[1]".to_string()]);
    }

    #[test]
    fn or_noop_prefers_configured() {
        let tracker: ProgressCallback = Arc::new(TrackingCallback::default());
        let chosen = or_noop(Some(&tracker));
        assert!(Arc::ptr_eq(&chosen, &tracker));
        or_noop(None).on_pagination_complete(0);
    }
}
