//! Metadata file discovery and parsing.
//!
//! Each dataset sequence is described by one text file. The first line is
//! the source locator (a video URL); every following line starts with an
//! integer frame timestamp, followed by camera parameters that are ignored
//! here:
//!
//! ```text
//! https://www.youtube.com/watch?v=abc123
//! 45045000 0.48 0.85 0.50 0.50 0.0 0.0 ...
//! 45078367 0.48 0.85 0.50 0.50 0.0 0.0 ...
//! ```
//!
//! Parsing is strict: a malformed timestamp line is an error, never skipped.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::FramegrabError;

/// One parsed metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct MetadataRecord {
    /// Source locator from the first line, trimmed.
    pub source_identifier: String,
    /// File name up to its first `.`.
    pub sequence_name: String,
    /// Frame timestamps in file order.
    pub timestamps: Vec<u64>,
}

impl MetadataRecord {
    /// Read and parse a metadata file.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::IoError`] if the file cannot be read.
    /// - [`FramegrabError::Parse`] if the file name yields an empty sequence
    ///   name (`.hidden.txt`), the file is empty, the locator line is
    ///   unusable, or a timestamp line does not start with an integer.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FramegrabError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::parse(path, &contents)
    }

    /// Parse metadata already read into memory. `path` supplies the
    /// sequence name and error context.
    pub fn parse(path: &Path, contents: &str) -> Result<Self, FramegrabError> {
        let sequence_name = sequence_name_from_path(path)
            .ok_or_else(|| FramegrabError::parse(path, None, "file name is not valid UTF-8"))?;
        if sequence_name.is_empty() {
            return Err(FramegrabError::parse(path, None, "empty sequence name"));
        }

        let mut lines: Vec<&str> = contents.lines().collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }

        let (locator_line, timestamp_lines) = lines
            .split_first()
            .ok_or_else(|| FramegrabError::parse(path, None, "file is empty"))?;

        let source_identifier = locator_line.trim();
        if source_identifier.is_empty() {
            return Err(FramegrabError::parse(path, Some(1), "missing source locator"));
        }
        if source_identifier.contains(char::is_whitespace) {
            return Err(FramegrabError::parse(
                path,
                Some(1),
                format!("source locator contains whitespace: {source_identifier:?}"),
            ));
        }

        let timestamps = timestamp_lines
            .iter()
            .enumerate()
            .map(|(index, line)| parse_timestamp_line(path, index + 2, line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source_identifier: source_identifier.to_string(),
            sequence_name,
            timestamps,
        })
    }
}

fn parse_timestamp_line(path: &Path, line_number: usize, line: &str) -> Result<u64, FramegrabError> {
    let token = line.split(' ').next().unwrap_or_default();
    token.trim().parse::<u64>().map_err(|error| {
        FramegrabError::parse(
            path,
            Some(line_number),
            format!("expected integer timestamp, found {token:?} ({error})"),
        )
    })
}

/// Sequence name for a metadata file: the file name up to its first `.`.
pub fn sequence_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.split('.').next().unwrap_or(file_name);
    Some(name.to_string())
}

/// List every `*.txt` file directly inside `directory`, sorted by path.
/// Symlinks to files are included.
///
/// # Errors
///
/// Returns [`FramegrabError::IoError`] if the directory cannot be read.
pub fn discover_metadata_files<P: AsRef<Path>>(
    directory: P,
) -> Result<Vec<PathBuf>, FramegrabError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        // `Path::is_file` follows symlinks; `DirEntry::file_type` does not.
        if path.extension().is_some_and(|ext| ext == "txt") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Discover and parse every metadata file in `directory`, in path order.
///
/// Stops at the first malformed file.
pub fn load_records<P: AsRef<Path>>(directory: P) -> Result<Vec<MetadataRecord>, FramegrabError> {
    let directory = directory.as_ref();
    let paths = discover_metadata_files(directory)?;
    log::debug!(
        "Found {} metadata files in {}",
        paths.len(),
        directory.display()
    );
    paths.iter().map(MetadataRecord::from_file).collect()
}
