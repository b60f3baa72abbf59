//! Run configuration.
//!
//! [`RunConfig`] is a builder that threads output locations, pool sizing,
//! and progress reporting through shard workers and extraction jobs without
//! widening every function signature. It also derives the per-worker file
//! names, so temp media and failure logs are keyed by an explicit worker id.
//!
//! # Example
//!
//! ```
//! use framegrab::{RunConfig, TimestampUnit};
//!
//! let config = RunConfig::new("/data/videos", "train")
//!     .with_workers(4)
//!     .with_timestamp_unit(TimestampUnit::Microseconds);
//!
//! assert_eq!(
//!     config.sequence_dir("0a1b2c"),
//!     std::path::Path::new("/data/videos/train/0a1b2c"),
//! );
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::downsample::DEFAULT_MIN_WIDTH;
use crate::progress::{NoOpProgress, ProgressCallback};
use crate::timecode::TimestampUnit;

/// Settings shared by every worker of a run.
#[derive(Clone)]
pub struct RunConfig {
    /// `<videos_dir>/<mode>`.
    pub(crate) output_root: PathBuf,
    /// Dataset split name (`train`, `test`).
    pub(crate) mode: String,
    /// Thread count for multi-sequence groups.
    pub(crate) workers: usize,
    /// Downsampling width floor.
    pub(crate) min_width: u32,
    /// Unit of metadata timestamps.
    pub(crate) timestamp_unit: TimestampUnit,
    /// Directory receiving `failed_videos_*` logs.
    pub(crate) failure_log_dir: PathBuf,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RunConfig")
            .field("output_root", &self.output_root)
            .field("mode", &self.mode)
            .field("workers", &self.workers)
            .field("min_width", &self.min_width)
            .field("timestamp_unit", &self.timestamp_unit)
            .field("failure_log_dir", &self.failure_log_dir)
            .finish_non_exhaustive()
    }
}

impl RunConfig {
    /// Configuration writing frames under `<videos_dir>/<mode>`.
    ///
    /// Defaults: one worker thread, a 500 pixel width floor, millisecond
    /// timestamps, failure logs in the current directory, no progress.
    pub fn new(videos_dir: impl AsRef<Path>, mode: impl Into<String>) -> Self {
        let mode = mode.into();
        Self {
            output_root: videos_dir.as_ref().join(&mode),
            mode,
            workers: 1,
            min_width: DEFAULT_MIN_WIDTH,
            timestamp_unit: TimestampUnit::default(),
            failure_log_dir: PathBuf::from("."),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Thread count for groups with more than one sequence. Clamped to at
    /// least 1.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Images whose halved width would be below `min_width` are not
    /// downsampled.
    #[must_use]
    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width;
        self
    }

    /// Unit of the timestamps in metadata files.
    #[must_use]
    pub fn with_timestamp_unit(mut self, unit: TimestampUnit) -> Self {
        self.timestamp_unit = unit;
        self
    }

    /// Directory for failure logs.
    #[must_use]
    pub fn with_failure_log_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.failure_log_dir = directory.into();
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// `<videos_dir>/<mode>`, the parent of every sequence directory.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Dataset split name.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Thread count for groups with more than one sequence.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Downsampling width floor in pixels.
    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    /// Unit of metadata timestamps.
    pub fn timestamp_unit(&self) -> TimestampUnit {
        self.timestamp_unit
    }

    /// Output directory of one sequence.
    pub fn sequence_dir(&self, sequence_name: &str) -> PathBuf {
        self.output_root.join(sequence_name)
    }

    /// Where worker `worker_id` keeps the media it is working on.
    pub fn temp_media_path(&self, worker_id: usize) -> PathBuf {
        self.output_root
            .join(format!("current_{}_{worker_id}.tmp", self.mode))
    }

    /// Failure log of worker `worker_id`.
    pub fn failure_log_path(&self, worker_id: usize) -> PathBuf {
        self.failure_log_dir
            .join(format!("failed_videos_{}_{worker_id}.txt", self.mode))
    }
}
