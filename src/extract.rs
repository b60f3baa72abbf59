//! Frame extraction collaborator.
//!
//! A [`FrameExtractor`] writes the frame found at a [`Timecode`] of a local
//! media file to an image path. [`FfmpegFrameExtractor`] does this
//! in-process: it seeks to the nearest keyframe at or before the timecode,
//! decodes forward to the first frame at or after it, converts that frame to
//! RGB, and encodes it with the `image` crate (format inferred from the
//! output extension).

use std::{path::Path, time::Duration};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{error::FramegrabError, timecode::Timecode, utilities};

/// Writes one frame of a media file to an image file.
pub trait FrameExtractor: Send + Sync {
    /// Extract the frame at `timecode` from `media` into `output`.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`FramegrabError::Extraction`].
    fn extract(&self, media: &Path, timecode: Timecode, output: &Path) -> Result<(), FramegrabError>;
}

/// [`FrameExtractor`] backed by the FFmpeg libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegFrameExtractor;

impl FfmpegFrameExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Decode the frame at `position` without writing it anywhere.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::NoVideoStream`] if the file has no video.
    /// - [`FramegrabError::InvalidTimestamp`] if `position` lies past the end
    ///   of the media.
    /// - [`FramegrabError::FfmpegError`] for demuxing or decoding failures.
    pub fn decode_frame(&self, media: &Path, position: Duration) -> Result<DynamicImage, FramegrabError> {
        ffmpeg_next::init()?;
        let mut input_context = ffmpeg_next::format::input(&media)?;

        let container_duration = input_context.duration();
        if container_duration > 0 && position > Duration::from_micros(container_duration as u64) {
            return Err(FramegrabError::InvalidTimestamp(position));
        }

        let (video_stream_index, time_base, start_time, codec_parameters) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(FramegrabError::NoVideoStream)?;
            (
                stream.index(),
                stream.time_base(),
                stream.start_time().max(0),
                stream.parameters(),
            )
        };

        let decoder_context = CodecContext::from_parameters(codec_parameters)?;
        let mut decoder = decoder_context.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let mut scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_timestamp = utilities::duration_to_seek_timestamp(position);
        input_context.seek(seek_timestamp, ..seek_timestamp)?;

        let target_seconds =
            position.as_secs_f64() + utilities::pts_to_seconds(start_time, time_base);
        let reached = |frame: &VideoFrame| {
            let pts = frame.timestamp().or_else(|| frame.pts()).unwrap_or(0);
            utilities::pts_to_seconds(pts, time_base) >= target_seconds - 1e-6
        };

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reached(&decoded_frame) {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, width, height);
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if reached(&decoded_frame) {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return convert_frame_to_image(&rgb_frame, width, height);
            }
        }

        Err(FramegrabError::InvalidTimestamp(position))
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract(&self, media: &Path, timecode: Timecode, output: &Path) -> Result<(), FramegrabError> {
        log::debug!("Extracting {} at {timecode}", output.display());

        let extraction_error = |error: FramegrabError| FramegrabError::Extraction {
            path: output.to_path_buf(),
            reason: error.to_string(),
        };

        let image = self
            .decode_frame(media, timecode.to_duration())
            .map_err(extraction_error)?;
        image
            .save(output)
            .map_err(|error| extraction_error(error.into()))
    }
}

/// Convert a scaled RGB24 video frame to an [`image::DynamicImage`].
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, FramegrabError> {
    let buffer = utilities::frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FramegrabError::FfmpegError("decoded frame buffer does not match its dimensions".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
