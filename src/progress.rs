//! Progress-callback trait for submit/poll events.
//!
//! Inject an [`Arc<dyn PollProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to observe a
//! conversion while it runs: the CLI drives its spinner from these events, a
//! GUI could forward them to its event loop.
//!
//! # Example
//!
//! ```rust
//! use edgequake_marker::{ClientConfig, JobStatus, PollProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct CountingCallback {
//!     attempts: AtomicU32,
//! }
//!
//! impl PollProgressCallback for CountingCallback {
//!     fn on_attempt(&self, attempt: u32, max_attempts: u32, status: &JobStatus) {
//!         self.attempts.store(attempt, Ordering::SeqCst);
//!         eprintln!("check {attempt}/{max_attempts}: {:?}", status.status);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { attempts: AtomicU32::new(0) });
//! let config = ClientConfig::builder()
//!     .progress_callback(cb as Arc<dyn PollProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::JobStatus;
use std::sync::Arc;

/// Called by the client as a conversion moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PollProgressCallback: Send + Sync {
    /// The PDF was accepted and a job handle returned.
    fn on_submitted(&self, file_name: &str, check_url: &str) {
        let _ = (file_name, check_url);
    }

    /// A status check returned.
    ///
    /// # Arguments
    /// * `attempt`: 1-indexed attempt number
    /// * `max_attempts`: configured attempt budget
    /// * `status`: the parsed response
    fn on_attempt(&self, attempt: u32, max_attempts: u32, status: &JobStatus) {
        let _ = (attempt, max_attempts, status);
    }

    /// The job reached the terminal status successfully.
    fn on_complete(&self, attempts: u32, markdown_len: usize, image_count: usize) {
        let _ = (attempts, markdown_len, image_count);
    }

    /// Submission or polling ended with an error.
    fn on_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PollProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn PollProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        submitted: Mutex<Option<String>>,
        attempts: AtomicU32,
        completed_len: AtomicUsize,
        failures: AtomicU32,
    }

    impl PollProgressCallback for TrackingCallback {
        fn on_submitted(&self, _file_name: &str, check_url: &str) {
            *self.submitted.lock().unwrap() = Some(check_url.to_string());
        }

        fn on_attempt(&self, attempt: u32, _max_attempts: u32, _status: &JobStatus) {
            self.attempts.store(attempt, Ordering::SeqCst);
        }

        fn on_complete(&self, _attempts: u32, markdown_len: usize, _image_count: usize) {
            self.completed_len.store(markdown_len, Ordering::SeqCst);
        }

        fn on_failed(&self, _error: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_submitted("a.pdf", "https://x/check");
        cb.on_attempt(1, 300, &JobStatus::default());
        cb.on_complete(1, 10, 0);
        cb.on_failed("boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_submitted("report.pdf", "https://x/check/1");
        tracker.on_attempt(1, 3, &JobStatus::default());
        tracker.on_attempt(2, 3, &JobStatus::default());
        tracker.on_complete(2, 7, 1);

        assert_eq!(
            tracker.submitted.lock().unwrap().as_deref(),
            Some("https://x/check/1")
        );
        assert_eq!(tracker.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completed_len.load(Ordering::SeqCst), 7);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_attempt(1, 1, &JobStatus::default());
    }
}
