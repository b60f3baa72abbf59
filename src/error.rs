//! Error types for the `framegrab` crate.
//!
//! This module defines [`FramegrabError`], the unified error type returned by
//! every fallible operation in the crate. The three failure classes that
//! matter to a run are kept apart on purpose:
//!
//! - [`FramegrabError::Parse`]: malformed metadata; aborts the run.
//! - [`FramegrabError::Download`]: a source could not be fetched; the shard
//!   worker logs the group and moves on.
//! - [`FramegrabError::Extraction`]: a frame could not be produced; fatal to
//!   the shard.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use rayon::ThreadPoolBuildError;
use thiserror::Error;

/// The unified error type for all `framegrab` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramegrabError {
    /// A metadata file is malformed.
    #[error("Failed to parse metadata file {path}{}: {reason}", line_suffix(.line))]
    Parse {
        /// The metadata file being parsed.
        path: PathBuf,
        /// 1-based line number, when the problem is tied to a line.
        line: Option<usize>,
        /// What was wrong with the file.
        reason: String,
    },

    /// The source media could not be fetched.
    #[error("Failed to download {locator}: {reason}")]
    Download {
        /// Source locator taken from the metadata file.
        locator: String,
        /// Underlying reason the fetch failed.
        reason: String,
    },

    /// A frame could not be extracted from downloaded media.
    #[error("Failed to extract frame into {path}: {reason}")]
    Extraction {
        /// The image path that should have been written.
        path: PathBuf,
        /// Underlying reason the extraction failed.
        reason: String,
    },

    /// A required external program is not on `PATH`.
    #[error("Required tool not found on PATH: {0}")]
    ToolNotFound(String),

    /// A shard count of zero was requested.
    #[error("Shard count must be greater than zero")]
    InvalidShardCount,

    /// The requested shard does not exist.
    #[error("Shard {index} is out of range (run has {count} shards)")]
    ShardOutOfRange {
        /// The requested shard index.
        index: usize,
        /// Number of shards in the run.
        count: usize,
    },

    /// The per-worker thread pool could not be started.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),

    /// The downloaded file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The requested timestamp lies beyond the end of the media.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding or encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl FramegrabError {
    /// Returns `true` for failures the shard worker isolates per group.
    pub fn is_download(&self) -> bool {
        matches!(self, FramegrabError::Download { .. })
    }

    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        line: Option<usize>,
        reason: impl Into<String>,
    ) -> Self {
        FramegrabError::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

impl From<FfmpegError> for FramegrabError {
    fn from(error: FfmpegError) -> Self {
        FramegrabError::FfmpegError(error.to_string())
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|number| format!(" (line {number})"))
        .unwrap_or_default()
}
