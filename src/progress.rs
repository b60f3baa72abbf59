//! Progress reporting for shard runs.
//!
//! A [`ProgressCallback`] attached to a [`RunConfig`](crate::RunConfig)
//! receives a [`ProgressInfo`] snapshot when a shard worker starts fetching
//! a source and again when the source group is finished.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framegrab::{ProgressCallback, ProgressInfo, RunConfig};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("worker {}: {}/{}", info.worker_id, info.current, info.total);
//!     }
//! }
//!
//! let config = RunConfig::new("videos", "train").with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of work a shard worker is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Fetching the media of a source group.
    Download,
    /// Extracting and downsampling frames of a source group.
    FrameExtraction,
}

/// A snapshot of shard progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Shard being processed.
    pub worker_id: usize,
    /// What the worker is doing right now.
    pub operation: OperationType,
    /// Source groups finished so far (downloaded or failed).
    pub current: u64,
    /// Source groups in the shard.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0); `None` for an empty shard.
    pub percentage: Option<f32>,
    /// Wall-clock time since the shard started.
    pub elapsed: Duration,
    /// Locator of the group in flight, if any.
    pub source: Option<String>,
}

/// Receives progress updates from a shard worker.
///
/// Callbacks observe but cannot influence the run.
pub trait ProgressCallback: Send + Sync {
    /// Called when a group starts downloading and when it finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications; the default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks shard timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    worker_id: usize,
    current: u64,
    total: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, worker_id: usize, total: u64) -> Self {
        Self {
            callback,
            worker_id,
            current: 0,
            total,
            start_time: Instant::now(),
        }
    }

    /// Announce that `source` is being fetched.
    pub(crate) fn begin(&self, source: &str) {
        self.report(OperationType::Download, Some(source));
    }

    /// Mark one group finished.
    pub(crate) fn advance(&mut self, source: &str) {
        self.current += 1;
        self.report(OperationType::FrameExtraction, Some(source));
    }

    fn report(&self, operation: OperationType, source: Option<&str>) {
        let percentage = (self.total > 0).then(|| self.current as f32 / self.total as f32 * 100.0);
        let info = ProgressInfo {
            worker_id: self.worker_id,
            operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            source: source.map(str::to_string),
        };
        self.callback.on_progress(&info);
    }
}
