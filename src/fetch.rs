//! Source media acquisition.
//!
//! A [`MediaFetcher`] turns a source locator into a local media file.
//! [`YtDlpFetcher`] shells out to `yt-dlp`, asking for the highest-resolution
//! progressive stream (audio and video muxed in one file) so no merge step
//! is needed.
//!
//! Every failure is reported as [`FramegrabError::Download`]; callers
//! isolate those per source group.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::error::FramegrabError;

/// Default `yt-dlp` format selector: single-file streams carrying both audio
/// and video.
pub const PROGRESSIVE_FORMAT: &str = "best[vcodec!=none][acodec!=none]";

/// Downloads the media a locator points at.
pub trait MediaFetcher: Send + Sync {
    /// Fetch `locator` into `destination` and return the written path.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`FramegrabError::Download`].
    fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FramegrabError>;
}

/// [`MediaFetcher`] that runs the `yt-dlp` program.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
    format: String,
}

impl YtDlpFetcher {
    /// Use `program` as the `yt-dlp` executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            format: PROGRESSIVE_FORMAT.to_string(),
        }
    }

    /// Find `yt-dlp` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::ToolNotFound`] if it is not installed.
    pub fn locate() -> Result<Self, FramegrabError> {
        let program =
            which::which("yt-dlp").map_err(|_| FramegrabError::ToolNotFound("yt-dlp".to_string()))?;
        log::debug!("Using yt-dlp at {}", program.display());
        Ok(Self::new(program))
    }

    /// Override the format selector.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Command-line arguments for one download.
    pub fn arguments(&self, locator: &str, destination: &Path) -> Vec<OsString> {
        vec![
            "--format".into(),
            self.format.as_str().into(),
            "--format-sort".into(),
            "res".into(),
            "--no-playlist".into(),
            "--force-overwrites".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--output".into(),
            destination.as_os_str().to_owned(),
            "--".into(),
            locator.into(),
        ]
    }
}

impl MediaFetcher for YtDlpFetcher {
    fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FramegrabError> {
        let download_error = |reason: String| FramegrabError::Download {
            locator: locator.to_string(),
            reason,
        };

        log::debug!("Running {} for {locator}", self.program.display());
        let output = Command::new(&self.program)
            .args(self.arguments(locator, destination))
            .stdin(Stdio::null())
            .output()
            .map_err(|error| download_error(format!("could not run yt-dlp: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output")
                .trim()
                .to_string();
            return Err(download_error(format!("yt-dlp exited with {}: {reason}", output.status)));
        }

        if !destination.is_file() {
            return Err(download_error(format!(
                "yt-dlp succeeded but {} was not written",
                destination.display()
            )));
        }

        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_end_with_output_and_locator() {
        let fetcher = YtDlpFetcher::new("yt-dlp");
        let arguments = fetcher.arguments("https://youtu.be/abc", Path::new("/tmp/current_train_0.tmp"));
        let tail: Vec<&str> = arguments[arguments.len() - 4..]
            .iter()
            .map(|argument| argument.to_str().unwrap())
            .collect();
        assert_eq!(
            tail,
            ["--output", "/tmp/current_train_0.tmp", "--", "https://youtu.be/abc"]
        );
        assert_eq!(arguments[1], OsString::from(PROGRESSIVE_FORMAT));
    }

    #[test]
    fn custom_format_is_used() {
        let fetcher = YtDlpFetcher::new("yt-dlp").with_format("best[height<=720]");
        let arguments = fetcher.arguments("x", Path::new("out.tmp"));
        assert_eq!(arguments[1], OsString::from("best[height<=720]"));
    }

    #[test]
    fn missing_program_is_a_download_error() {
        let fetcher = YtDlpFetcher::new("/nonexistent/framegrab-test/yt-dlp");
        let directory = tempfile::tempdir().unwrap();
        let error = fetcher
            .fetch("https://youtu.be/abc", &directory.path().join("out.tmp"))
            .unwrap_err();
        assert!(error.is_download(), "{error}");
    }
}
