//! In-place image downsampling.
//!
//! Extracted frames are stored at half resolution. A [`Downsampler`] halves
//! both dimensions of an image file and overwrites it, unless the halved
//! width would fall below a floor, in which case the file is left alone and
//! [`DownsampleOutcome::TooSmall`] is returned.

use std::path::Path;

use image::{GenericImageView, imageops::FilterType};

use crate::error::FramegrabError;

/// Default lower bound for the width of a downsampled image.
pub const DEFAULT_MIN_WIDTH: u32 = 500;

/// What a [`Downsampler`] did to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownsampleOutcome {
    /// The image was halved and written back.
    Resized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// Halving would go below the width floor; the file is untouched.
    TooSmall {
        /// Current width in pixels.
        width: u32,
    },
}

/// Halves an image file in place.
pub trait Downsampler: Send + Sync {
    /// Halve `path` if its halved width is at least `min_width`.
    fn downsample(&self, path: &Path, min_width: u32) -> Result<DownsampleOutcome, FramegrabError>;
}

/// [`Downsampler`] that decodes, resizes, and re-encodes with the `image`
/// crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageDownsampler {
    filter: FilterType,
}

impl Default for ImageDownsampler {
    /// Bilinear (`Triangle`) filtering.
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl ImageDownsampler {
    /// Use a specific resampling filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Downsampler for ImageDownsampler {
    fn downsample(&self, path: &Path, min_width: u32) -> Result<DownsampleOutcome, FramegrabError> {
        let image = image::open(path)?;
        let (width, height) = image.dimensions();

        let half_width = width / 2;
        if half_width < min_width {
            return Ok(DownsampleOutcome::TooSmall { width });
        }
        let half_height = (height / 2).max(1);

        log::debug!(
            "Downsampling {} from {width}x{height} to {half_width}x{half_height}",
            path.display()
        );
        image
            .resize_exact(half_width, half_height, self.filter)
            .save(path)?;

        Ok(DownsampleOutcome::Resized {
            width: half_width,
            height: half_height,
        })
    }
}
