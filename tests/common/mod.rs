//! Test doubles shared by the integration tests.
//!
//! The mocks never touch the network or FFmpeg. The fetcher writes a few
//! bytes to the destination, and the extractor writes a solid-colour PNG
//! whose width can be chosen per output file.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use framegrab::{
    Collaborators, FrameExtractor, FramegrabError, ImageDownsampler, MediaFetcher, Timecode,
};
use image::{GenericImageView, Rgb, RgbImage};

pub const WIDE: u32 = 1280;
pub const NARROW: u32 = 640;

#[derive(Default)]
struct FetcherState {
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

/// Writes placeholder media, or fails for chosen locators.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<FetcherState>,
}

impl MockFetcher {
    pub fn failing_for(locators: &[&str]) -> Self {
        Self {
            state: Arc::new(FetcherState {
                failing: locators.iter().map(|locator| locator.to_string()).collect(),
                calls: Mutex::default(),
            }),
        }
    }

    /// Locators fetched so far, in call order.
    pub fn locators(&self) -> Vec<String> {
        self.state
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(locator, _)| locator.clone())
            .collect()
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.state
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, destination)| destination.clone())
            .collect()
    }
}

impl MediaFetcher for MockFetcher {
    fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FramegrabError> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push((locator.to_string(), destination.to_path_buf()));

        if self.state.failing.contains(locator) {
            // yt-dlp leaves a partial file behind when a download dies.
            let mut partial = destination.as_os_str().to_owned();
            partial.push(".part");
            fs::write(PathBuf::from(partial), b"half a video")?;
            return Err(FramegrabError::Download {
                locator: locator.to_string(),
                reason: "video unavailable".to_string(),
            });
        }
        fs::write(destination, b"not really a video")?;
        Ok(destination.to_path_buf())
    }
}

#[derive(Default)]
struct ExtractorState {
    narrow_outputs: HashSet<String>,
    failing_outputs: HashSet<String>,
    calls: Mutex<Vec<(PathBuf, Timecode, PathBuf)>>,
    media_seen: Mutex<HashMap<PathBuf, bool>>,
}

/// Writes a solid PNG for every requested frame.
///
/// Outputs are `WIDE` pixels across unless their file stem was marked
/// narrow. Outputs whose stem was marked failing produce an extraction
/// error instead.
#[derive(Clone, Default)]
pub struct MockExtractor {
    state: Arc<ExtractorState>,
}

impl MockExtractor {
    pub fn new(narrow: &[&str], failing: &[&str]) -> Self {
        Self {
            state: Arc::new(ExtractorState {
                narrow_outputs: narrow.iter().map(|stem| stem.to_string()).collect(),
                failing_outputs: failing.iter().map(|stem| stem.to_string()).collect(),
                ..ExtractorState::default()
            }),
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Timecode, PathBuf)> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn timecodes(&self) -> Vec<String> {
        let mut timecodes: Vec<String> = self
            .calls()
            .into_iter()
            .map(|(_, timecode, _)| timecode.to_string())
            .collect();
        timecodes.sort();
        timecodes
    }

    /// Whether every extraction saw its media file on disk.
    pub fn media_always_present(&self) -> bool {
        self.state.media_seen.lock().unwrap().values().all(|seen| *seen)
    }
}

impl FrameExtractor for MockExtractor {
    fn extract(&self, media: &Path, timecode: Timecode, output: &Path) -> Result<(), FramegrabError> {
        self.state
            .media_seen
            .lock()
            .unwrap()
            .insert(media.to_path_buf(), media.exists());
        self.state
            .calls
            .lock()
            .unwrap()
            .push((media.to_path_buf(), timecode, output.to_path_buf()));

        let stem = output
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        if self.state.failing_outputs.contains(&stem) {
            return Err(FramegrabError::Extraction {
                path: output.to_path_buf(),
                reason: "decoder gave up".to_string(),
            });
        }

        let width = if self.state.narrow_outputs.contains(&stem) {
            NARROW
        } else {
            WIDE
        };
        write_png(output, width, width / 2);
        Ok(())
    }
}

pub fn collaborators(fetcher: &MockFetcher, extractor: &MockExtractor) -> Collaborators {
    Collaborators {
        fetcher: Box::new(fetcher.clone()),
        extractor: Box::new(extractor.clone()),
        downsampler: Box::new(ImageDownsampler::default()),
    }
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([40, 120, 200]))
        .save(path)
        .expect("Failed to write test image");
}

pub fn image_width(path: &Path) -> u32 {
    image::open(path).expect("Failed to open test image").dimensions().0
}

/// Write `<directory>/<name>.txt` in the metadata file format.
pub fn write_metadata(directory: &Path, name: &str, locator: &str, timestamps: &[u64]) -> PathBuf {
    fs::create_dir_all(directory).expect("Failed to create metadata dir");
    let mut contents = format!("{locator}\n");
    for timestamp in timestamps {
        contents.push_str(&format!("{timestamp} 0.5 0.9 0.5 0.5 0.0 0.0 1 0 0 0 0 1 0 0 0 0 1 0\n"));
    }
    let path = directory.join(format!("{name}.txt"));
    fs::write(&path, contents).expect("Failed to write metadata file");
    path
}

/// Sorted `*.png` file names in `directory`.
pub fn png_names(directory: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".png"))
        .collect();
    names.sort();
    names
}
