//! Timestamp-to-timecode conversion.
//!
//! Metadata files carry one integer timestamp per frame. Extraction seeks
//! using a [`Timecode`], the `HH:MM:SS.mmm` rendering of that timestamp.
//!
//! The hour, minute, and second fields are derived from the timestamp
//! truncated to whole seconds, while the millisecond field is taken from the
//! untruncated value.
//!
//! # Example
//!
//! ```
//! use framegrab::Timecode;
//!
//! assert_eq!(Timecode::from_millis(3_723_456).to_string(), "01:02:03.456");
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

/// Unit of the integer timestamps found in metadata files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampUnit {
    /// Timestamps are milliseconds from the start of the video.
    #[default]
    Milliseconds,
    /// Timestamps are microseconds; they are truncated to milliseconds
    /// before formatting.
    Microseconds,
}

impl TimestampUnit {
    /// Truncate a raw timestamp to whole milliseconds.
    pub fn to_millis(self, raw: u64) -> u64 {
        match self {
            TimestampUnit::Milliseconds => raw,
            TimestampUnit::Microseconds => raw / 1000,
        }
    }
}

/// A seek position rendered as `HH:MM:SS.mmm`.
///
/// Hours are not wrapped at 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timecode {
    hours: u64,
    minutes: u64,
    seconds: u64,
    milliseconds: u64,
}

impl Timecode {
    /// Build a timecode from a millisecond timestamp.
    pub fn from_millis(timestamp: u64) -> Self {
        let whole_seconds = timestamp / 1000;
        Self {
            hours: whole_seconds / 3600,
            minutes: (whole_seconds % 3600) / 60,
            seconds: whole_seconds % 60,
            milliseconds: timestamp % 1000,
        }
    }

    /// Build a timecode from a raw metadata timestamp in the given unit.
    pub fn from_raw(raw: u64, unit: TimestampUnit) -> Self {
        Self::from_millis(unit.to_millis(raw))
    }

    /// The seek offset this timecode denotes.
    pub fn to_duration(self) -> Duration {
        let seconds = self.hours * 3600 + self.minutes * 60 + self.seconds;
        Duration::from_secs(seconds) + Duration::from_millis(self.milliseconds)
    }
}

impl Display for Timecode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hours, self.minutes, self.seconds, self.milliseconds
        )
    }
}
