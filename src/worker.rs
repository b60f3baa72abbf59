//! Shard workers.
//!
//! A [`ShardWorker`] walks the source groups of one shard in order. A group
//! whose media cannot be fetched is written to the worker's failure log
//! (`failed_videos_<mode>_<worker_id>.txt`, one sequence name per line,
//! appended) and skipped. Any other error stops the shard.

use std::{
    fs::{self, OpenOptions},
    io::Write,
};

use crate::{
    config::RunConfig,
    error::FramegrabError,
    grouping::SourceGroup,
    job::{Collaborators, FrameExtractionJob, GroupReport},
    progress::ProgressTracker,
};

/// Outcome of running one shard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardReport {
    /// The worker that produced this report.
    pub worker_id: usize,
    /// Groups that were downloaded and extracted.
    pub completed_groups: usize,
    /// Locators whose download failed.
    pub failed_sources: Vec<String>,
    /// Sequence names written to the failure log.
    pub failed_sequences: Vec<String>,
    /// Totals over completed groups.
    pub frames: GroupReport,
}

/// Processes the groups of one shard.
pub struct ShardWorker<'a> {
    job: FrameExtractionJob<'a>,
    config: &'a RunConfig,
}

impl<'a> ShardWorker<'a> {
    /// Create worker `worker_id`.
    pub fn new(
        collaborators: &'a Collaborators,
        config: &'a RunConfig,
        worker_id: usize,
    ) -> Result<Self, FramegrabError> {
        Ok(Self {
            job: FrameExtractionJob::new(collaborators, config, worker_id)?,
            config,
        })
    }

    /// The worker id, also the shard index and failure log suffix.
    pub fn worker_id(&self) -> usize {
        self.job.worker_id()
    }

    /// Process every group of `shard` in order.
    ///
    /// # Errors
    ///
    /// Download failures are logged and skipped. Extraction failures and
    /// failure-log I/O errors are returned immediately.
    pub fn run(&self, shard: &[SourceGroup]) -> Result<ShardReport, FramegrabError> {
        let worker_id = self.worker_id();
        let mut report = ShardReport {
            worker_id,
            ..ShardReport::default()
        };
        let mut tracker =
            ProgressTracker::new(self.config.progress.clone(), worker_id, shard.len() as u64);

        log::info!(
            "Start downloading {} movies, worker {worker_id}",
            shard.len()
        );

        for (index, group) in shard.iter().enumerate() {
            log::info!(
                "Downloading {}/{}: {}",
                index + 1,
                shard.len(),
                group.source_identifier
            );
            tracker.begin(&group.source_identifier);

            match self.job.process_group(group) {
                Ok(frames) => {
                    report.completed_groups += 1;
                    report.frames += frames;
                }
                Err(error) if error.is_download() => {
                    log::warn!("{error}; skipping {} sequence(s)", group.len());
                    self.record_failure(group)?;
                    report.failed_sources.push(group.source_identifier.clone());
                    report
                        .failed_sequences
                        .extend(group.sequence_names().map(str::to_string));
                }
                Err(error) => return Err(error),
            }

            tracker.advance(&group.source_identifier);
        }

        log::info!(
            "Worker {worker_id} finished: {} groups done, {} failed, {} frames extracted",
            report.completed_groups,
            report.failed_sources.len(),
            report.frames.extracted
        );
        Ok(report)
    }

    fn record_failure(&self, group: &SourceGroup) -> Result<(), FramegrabError> {
        let path = self.config.failure_log_path(self.worker_id());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut log_file = OpenOptions::new().create(true).append(true).open(&path)?;
        for name in group.sequence_names() {
            writeln!(log_file, "{name}")?;
        }
        Ok(())
    }
}
