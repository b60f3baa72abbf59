//! # framegrab
//!
//! Build camera-trajectory image datasets from online videos.
//!
//! Each metadata file names a source video and lists the timestamps of the
//! frames that make up one sequence. `framegrab` groups the sequences by
//! source so every video is downloaded once, splits the groups into shards,
//! and for each group fetches the media, decodes the requested frames to
//! PNG with FFmpeg (via [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)),
//! and halves the new images in place.
//!
//! ## Layout on disk
//!
//! ```text
//! <cameras_dir>/<mode>/<sequence>.txt        input metadata
//! <videos_dir>/<mode>/<sequence>/<ts>.png    extracted frames
//! <videos_dir>/<mode>/current_<mode>_<k>.tmp worker k's media in flight
//! <failure_log_dir>/failed_videos_<mode>_<k>.txt
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use framegrab::{Collaborators, RunConfig, RunPlan, ShardWorker};
//!
//! let plan = RunPlan::load("cameras", "train", 8).unwrap();
//! let config = RunConfig::new("videos", "train").with_workers(8);
//! let collaborators = Collaborators::system().unwrap();
//!
//! for (index, shard) in plan.shards.iter().enumerate() {
//!     let worker = ShardWorker::new(&collaborators, &config, index).unwrap();
//!     let report = worker.run(shard).unwrap();
//!     println!("{} sequences failed", report.failed_sequences.len());
//! }
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build, and `yt-dlp`
//! must be on `PATH` to fetch media.

pub mod config;
pub mod downsample;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ffmpeg;
pub mod grouping;
pub mod job;
pub mod metadata;
pub mod partition;
pub mod plan;
pub mod progress;
pub mod timecode;
mod utilities;
pub mod worker;

pub use config::RunConfig;
pub use downsample::{DEFAULT_MIN_WIDTH, DownsampleOutcome, Downsampler, ImageDownsampler};
pub use error::FramegrabError;
pub use extract::{FfmpegFrameExtractor, FrameExtractor};
pub use fetch::{MediaFetcher, PROGRESSIVE_FORMAT, YtDlpFetcher};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use grouping::{Sequence, SourceGroup, aggregate};
pub use job::{Collaborators, FrameExtractionJob, GroupReport};
pub use metadata::{MetadataRecord, discover_metadata_files, load_records};
pub use partition::partition;
pub use plan::RunPlan;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use timecode::{Timecode, TimestampUnit};
pub use worker::{ShardReport, ShardWorker};
