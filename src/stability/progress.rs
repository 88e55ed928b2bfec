//! Progress reporting and cooperative cancellation for stability runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;

/// Observer notified as trials complete.
///
/// Implementations only observe; they cannot influence results. `advance`
/// may be called concurrently from worker threads.
pub trait ProgressReporter: Send + Sync {
    /// A run of `total` trials is starting.
    fn start(&self, total: usize);

    /// One trial finished.
    fn advance(&self);

    /// The run ended (successfully or not).
    fn finish(&self);
}

/// Reporter that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&self, _total: usize) {}
    fn advance(&self) {}
    fn finish(&self) {}
}

/// Reporter logging through `tracing` at every tenth of the run.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl LogProgress {
    /// Create a reporter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LogProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        info!(total, "starting stability trials");
    }

    fn advance(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        let step = (total / 10).max(1);
        if done % step == 0 || done == total {
            info!(done, total, "stability trials completed");
        }
    }

    fn finish(&self) {}
}

/// Terminal progress bar.
#[cfg(feature = "progress")]
pub struct BarProgress {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "progress")]
impl BarProgress {
    /// Create a hidden bar; it is sized and shown on `start`.
    pub fn new() -> Self {
        Self {
            bar: indicatif::ProgressBar::hidden(),
        }
    }
}

#[cfg(feature = "progress")]
impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl ProgressReporter for BarProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        if let Ok(style) = indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} trials ({eta})") {
            self.bar.set_style(style);
        }
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Shared flag for abandoning a run in progress.
///
/// Clones share the same flag. Cancellation is checked before each trial;
/// trials already running complete, then the run returns `Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_log_progress_counts() {
        let progress = LogProgress::new();
        progress.start(3);
        for _ in 0..3 {
            progress.advance();
        }
        progress.finish();
        assert_eq!(progress.done.load(Ordering::Relaxed), 3);
    }
}
