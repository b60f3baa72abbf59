//! Per-source frame extraction.
//!
//! [`FrameExtractionJob`] drives one [`SourceGroup`] from locator to
//! finished images: fetch the media into the worker's temp file, extract
//! every requested frame of every sequence, downsample the new images, and
//! delete the temp file. The external work goes through the three
//! collaborator traits bundled in [`Collaborators`], so the orchestration
//! can run against test doubles.
//!
//! Groups with a single sequence are extracted on the calling thread;
//! larger groups fan their sequences out over a rayon pool sized by
//! [`RunConfig::with_workers`].

use std::{
    collections::HashSet,
    fs,
    io::ErrorKind,
    ops::AddAssign,
    path::{Path, PathBuf},
};

use rayon::{
    ThreadPool, ThreadPoolBuilder,
    iter::{IntoParallelRefIterator, ParallelIterator},
};

use crate::{
    config::RunConfig,
    downsample::{DownsampleOutcome, Downsampler, ImageDownsampler},
    error::FramegrabError,
    extract::{FfmpegFrameExtractor, FrameExtractor},
    fetch::{MediaFetcher, YtDlpFetcher},
    grouping::{Sequence, SourceGroup},
    timecode::Timecode,
};

/// The external operations a job depends on.
pub struct Collaborators {
    /// Turns a locator into a local media file.
    pub fetcher: Box<dyn MediaFetcher>,
    /// Writes one frame of a media file to an image.
    pub extractor: Box<dyn FrameExtractor>,
    /// Halves an image in place.
    pub downsampler: Box<dyn Downsampler>,
}

impl Collaborators {
    /// `yt-dlp` for fetching, FFmpeg for extraction, `image` for resizing.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::ToolNotFound`] if `yt-dlp` is missing.
    pub fn system() -> Result<Self, FramegrabError> {
        Ok(Self {
            fetcher: Box::new(YtDlpFetcher::locate()?),
            extractor: Box::new(FfmpegFrameExtractor::new()),
            downsampler: Box::new(ImageDownsampler::default()),
        })
    }
}

/// Counts of work done for a group or a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupReport {
    /// Sequences processed.
    pub sequences: usize,
    /// Frames newly extracted.
    pub extracted: usize,
    /// Frames already present from an earlier run.
    pub skipped: usize,
    /// Images halved in place.
    pub downsampled: usize,
}

impl AddAssign for GroupReport {
    fn add_assign(&mut self, other: Self) {
        self.sequences += other.sequences;
        self.extracted += other.extracted;
        self.skipped += other.skipped;
        self.downsampled += other.downsampled;
    }
}

/// Extracts the frames of source groups for one worker.
pub struct FrameExtractionJob<'a> {
    collaborators: &'a Collaborators,
    config: &'a RunConfig,
    worker_id: usize,
    pool: ThreadPool,
}

impl<'a> FrameExtractionJob<'a> {
    /// Create the job for worker `worker_id`, including its thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::ThreadPool`] if the pool cannot be built.
    pub fn new(
        collaborators: &'a Collaborators,
        config: &'a RunConfig,
        worker_id: usize,
    ) -> Result<Self, FramegrabError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |index| format!("framegrab-{worker_id}-{index}"))
            .build()?;

        Ok(Self {
            collaborators,
            config,
            worker_id,
            pool,
        })
    }

    /// The worker this job belongs to; keys its temp media path.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Fetch, extract, downsample, and clean up one source group.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::Download`] if the media could not be fetched;
    ///   nothing has been written for the group in that case.
    /// - Any extraction, downsampling, or I/O error. The temp media is
    ///   removed before the error is returned.
    pub fn process_group(&self, group: &SourceGroup) -> Result<GroupReport, FramegrabError> {
        fs::create_dir_all(&self.config.output_root)?;
        let temp_path = self.config.temp_media_path(self.worker_id);

        let media = match self.fetch(group, &temp_path) {
            Ok(media) => media,
            Err(error) => {
                remove_temp_media(&temp_path);
                return Err(error);
            }
        };

        let result = self.extract_group(group, &media);
        remove_temp_media(&media);
        if media != temp_path {
            remove_temp_media(&temp_path);
        }
        result
    }

    fn fetch(&self, group: &SourceGroup, destination: &Path) -> Result<PathBuf, FramegrabError> {
        self.collaborators
            .fetcher
            .fetch(&group.source_identifier, destination)
            .map_err(|error| match error {
                FramegrabError::Download { .. } => error,
                other => FramegrabError::Download {
                    locator: group.source_identifier.clone(),
                    reason: other.to_string(),
                },
            })
    }

    /// Extract every sequence of `group` from already-fetched `media`.
    pub fn extract_group(
        &self,
        group: &SourceGroup,
        media: &Path,
    ) -> Result<GroupReport, FramegrabError> {
        if let [sequence] = group.sequences.as_slice() {
            return self.process_sequence(sequence, media);
        }

        let reports = self.pool.install(|| {
            group
                .sequences
                .par_iter()
                .map(|sequence| self.process_sequence(sequence, media))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut total = GroupReport::default();
        for report in reports {
            total += report;
        }
        Ok(total)
    }

    /// Extract and downsample the frames of one sequence.
    ///
    /// Frames whose image already exists are not extracted again, and
    /// images present before this call are not downsampled again.
    /// Downsampling walks the directory in name order and stops at the
    /// first image too narrow to halve.
    pub fn process_sequence(
        &self,
        sequence: &Sequence,
        media: &Path,
    ) -> Result<GroupReport, FramegrabError> {
        let directory = self.config.sequence_dir(&sequence.name);
        fs::create_dir_all(&directory)?;

        let existing: HashSet<PathBuf> = list_png_files(&directory)?.into_iter().collect();
        let mut report = GroupReport {
            sequences: 1,
            ..GroupReport::default()
        };

        for &timestamp in &sequence.timestamps {
            let output = directory.join(format!("{timestamp}.png"));
            if output.exists() {
                report.skipped += 1;
                continue;
            }

            let timecode = Timecode::from_raw(timestamp, self.config.timestamp_unit);
            self.collaborators
                .extractor
                .extract(media, timecode, &output)?;
            report.extracted += 1;
        }

        for image_path in list_png_files(&directory)? {
            if existing.contains(&image_path) {
                log::debug!("{} exists", image_path.display());
                continue;
            }

            match self
                .collaborators
                .downsampler
                .downsample(&image_path, self.config.min_width)?
            {
                DownsampleOutcome::Resized { .. } => report.downsampled += 1,
                DownsampleOutcome::TooSmall { width } => {
                    log::debug!(
                        "{} is {width}px wide, leaving the rest of {} at full size",
                        image_path.display(),
                        sequence.name
                    );
                    break;
                }
            }
        }

        log::debug!(
            "Sequence {}: {} extracted, {} skipped, {} downsampled",
            sequence.name,
            report.extracted,
            report.skipped,
            report.downsampled
        );
        Ok(report)
    }
}

/// Every `*.png` file directly inside `directory`, sorted by path.
fn list_png_files(directory: &Path) -> Result<Vec<PathBuf>, FramegrabError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "png") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Remove `path` and the `<path>.part` file an interrupted download leaves.
fn remove_temp_media(path: &Path) {
    remove_file_if_present(path);
    remove_file_if_present(&partial_download_path(path));
}

fn partial_download_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    PathBuf::from(partial)
}

fn remove_file_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!("Could not remove {}: {error}", path.display()),
    }
}
