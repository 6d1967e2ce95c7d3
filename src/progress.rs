//! Progress-callback trait for split events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress_callback`] to receive
//! events as pages are classified and batches are written.
//!
//! # Example
//!
//! ```rust
//! use awbsplit::{Courier, SplitConfig, SplitProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl SplitProgressCallback for CountingCallback {
//!     fn on_batch_written(&self, courier: Courier, batch: usize, pages: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{courier} #{batch}: {pages} pages");
//!     }
//! }
//!
//! let config = SplitConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::classify::Courier;
use std::sync::Arc;

/// Called by the splitter as it works through a document.
///
/// All methods default to no-ops. Batch events arrive from concurrent
/// blocking tasks, so shared state needs `Mutex`/atomics.
pub trait SplitProgressCallback: Send + Sync {
    /// Called once after the document is loaded.
    ///
    /// # Arguments
    /// * `total_pages` — pages in the document
    fn on_split_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page is routed, in page order.
    ///
    /// In whole-document mode this fires once per page with the fixed
    /// courier, without any text having been read.
    fn on_page_classified(&self, page_num: usize, total_pages: usize, courier: Courier) {
        let _ = (page_num, total_pages, courier);
    }

    /// Called once the planned batches are known, before any is written.
    fn on_batches_planned(&self, total_batches: usize) {
        let _ = total_batches;
    }

    /// Called when a batch file is in place.
    fn on_batch_written(&self, courier: Courier, batch: usize, pages: usize) {
        let _ = (courier, batch, pages);
    }

    /// Called when a batch could not be assembled or written.
    fn on_batch_error(&self, courier: Courier, batch: usize, error: &str) {
        let _ = (courier, batch, error);
    }

    /// Called once after every batch has been attempted.
    fn on_split_complete(&self, batches_written: usize, batches_failed: usize) {
        let _ = (batches_written, batches_failed);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SplitConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        classified: Mutex<Vec<(usize, Courier)>>,
        written: AtomicUsize,
        errors: AtomicUsize,
        finished: Mutex<Option<(usize, usize)>>,
    }

    impl SplitProgressCallback for TrackingCallback {
        fn on_split_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_classified(&self, page_num: usize, _total: usize, courier: Courier) {
            self.classified.lock().unwrap().push((page_num, courier));
        }

        fn on_batch_written(&self, _courier: Courier, _batch: usize, _pages: usize) {
            self.written.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_error(&self, _courier: Courier, _batch: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_split_complete(&self, written: usize, failed: usize) {
            *self.finished.lock().unwrap() = Some((written, failed));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_split_start(5);
        cb.on_page_classified(1, 5, Courier::Dhl);
        cb.on_batches_planned(2);
        cb.on_batch_written(Courier::Dhl, 1, 5);
        cb.on_batch_error(Courier::Gdex, 1, "disk full");
        cb.on_split_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_split_start(3);
        tracker.on_page_classified(1, 3, Courier::Dhl);
        tracker.on_page_classified(2, 3, Courier::Others);
        tracker.on_page_classified(3, 3, Courier::Dhl);
        tracker.on_batch_written(Courier::Dhl, 1, 2);
        tracker.on_batch_error(Courier::Others, 1, "read-only filesystem");
        tracker.on_split_complete(1, 1);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.classified.lock().unwrap().len(), 3);
        assert_eq!(tracker.written.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.finished.lock().unwrap(), Some((1, 1)));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_split_start(10);
        cb.on_batch_written(Courier::PosLaju, 1, 10);
    }
}
