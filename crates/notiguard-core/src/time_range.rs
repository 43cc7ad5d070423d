//! Time-of-day intervals that make up a rule's schedule.
//!
//! A [`TimeRange`] covers `start..end` within a single day (no wraparound
//! across midnight) or, when `all_day` is set, the entire day. Ranges are
//! plain values; [`validate`] and [`validate_list`] enforce the per-range
//! bounds and the cross-range rules (no duplicates, no overlaps).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of ranges a rule must carry.
pub const MIN_RANGES: usize = 1;

/// Maximum number of ranges a rule may carry.
pub const MAX_RANGES: usize = 10;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Errors produced while validating time ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeRangeError {
    /// An all-day range must keep every hour/minute field at zero.
    #[error(
        "all-day range must have zeroed fields, got {start_hour:02}:{start_minute:02}-{end_hour:02}:{end_minute:02}"
    )]
    AllDayWithNonZeroFields {
        start_hour: u8,
        start_minute: u8,
        end_hour: u8,
        end_minute: u8,
    },

    /// Hour outside 0-23.
    #[error("hour {hour} is out of range (0-23)")]
    HourOutOfRange { hour: u8 },

    /// Minute outside 0-59.
    #[error("minute {minute} is out of range (0-59)")]
    MinuteOutOfRange { minute: u8 },

    /// Start is not strictly before end.
    #[error("range start {start} must be before end {end} (minutes since midnight)")]
    InvertedRange { start: u16, end: u16 },

    /// Too few or too many ranges in a rule.
    #[error("a rule needs between {min} and {max} time ranges, got {count}")]
    RangeCountOutOfBounds { count: usize, min: usize, max: usize },

    /// The same interval appears twice.
    #[error("duplicate time range {range}")]
    DuplicateRange { range: TimeRange },

    /// Two ranges share part of the day.
    #[error("time range {first} overlaps {second}")]
    Overlap { first: TimeRange, second: TimeRange },
}

/// Result type for time range validation.
pub type Result<T> = std::result::Result<T, TimeRangeError>;

/// A time-of-day interval, or the whole day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Opaque identifier assigned by the owning store, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Start hour (0-23).
    pub start_hour: u8,
    /// Start minute (0-59).
    pub start_minute: u8,
    /// End hour (0-23).
    pub end_hour: u8,
    /// End minute (0-59).
    pub end_minute: u8,
    /// Covers the entire day; the numeric fields are then all zero.
    #[serde(default)]
    pub all_day: bool,
}

impl TimeRange {
    /// Creates a validated range from hour/minute pairs.
    pub fn new(start_hour: u8, start_minute: u8, end_hour: u8, end_minute: u8) -> Result<Self> {
        validate(Self {
            id: None,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
            all_day: false,
        })
    }

    /// Creates a validated range from whole hours.
    pub fn from_hours(start_hour: u8, end_hour: u8) -> Result<Self> {
        Self::new(start_hour, 0, end_hour, 0)
    }

    /// Creates a range covering the whole day.
    pub fn all_day() -> Self {
        Self {
            id: None,
            start_hour: 0,
            start_minute: 0,
            end_hour: 0,
            end_minute: 0,
            all_day: true,
        }
    }

    /// Attaches a store identifier.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Start expressed as minutes since midnight.
    pub fn start_minutes(&self) -> u16 {
        self.start_hour as u16 * 60 + self.start_minute as u16
    }

    /// End expressed as minutes since midnight.
    pub fn end_minutes(&self) -> u16 {
        self.end_hour as u16 * 60 + self.end_minute as u16
    }

    /// Returns true if `minute` (since midnight) falls in `[start, end)`.
    ///
    /// An all-day range contains every minute.
    pub fn contains_minute(&self, minute: u16) -> bool {
        if self.all_day {
            return minute < MINUTES_PER_DAY;
        }
        minute >= self.start_minutes() && minute < self.end_minutes()
    }

    /// Returns true if `next` starts exactly one minute after this range ends.
    ///
    /// Chained ranges read as one continuous period.
    pub fn is_chained_to(&self, next: &TimeRange) -> bool {
        !self.all_day && !next.all_day && self.end_minutes() + 1 == next.start_minutes()
    }

    /// Returns true if the two ranges share any part of the day.
    ///
    /// Touching ranges (`self.end == other.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        if self.all_day || other.all_day {
            return true;
        }
        self.start_minutes() < other.end_minutes() && other.start_minutes() < self.end_minutes()
    }

    fn bounds(&self) -> (u8, u8, u8, u8) {
        (
            self.start_hour,
            self.start_minute,
            self.end_hour,
            self.end_minute,
        )
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.all_day {
            return write!(f, "all day");
        }
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_hour, self.start_minute, self.end_hour, self.end_minute
        )
    }
}

/// Validates a single range.
pub fn validate(range: TimeRange) -> Result<TimeRange> {
    check(&range)?;
    Ok(range)
}

fn check(range: &TimeRange) -> Result<()> {
    if range.all_day {
        if range.bounds() != (0, 0, 0, 0) {
            return Err(TimeRangeError::AllDayWithNonZeroFields {
                start_hour: range.start_hour,
                start_minute: range.start_minute,
                end_hour: range.end_hour,
                end_minute: range.end_minute,
            });
        }
        return Ok(());
    }

    for hour in [range.start_hour, range.end_hour] {
        if hour > 23 {
            return Err(TimeRangeError::HourOutOfRange { hour });
        }
    }
    for minute in [range.start_minute, range.end_minute] {
        if minute > 59 {
            return Err(TimeRangeError::MinuteOutOfRange { minute });
        }
    }

    let (start, end) = (range.start_minutes(), range.end_minutes());
    if start >= end {
        return Err(TimeRangeError::InvertedRange { start, end });
    }
    Ok(())
}

/// Validates the full set of ranges belonging to one rule.
///
/// Checks, in order: count bounds, duplicates, overlaps, then every range on
/// its own. The list is returned in its original order.
pub fn validate_list(ranges: Vec<TimeRange>) -> Result<Vec<TimeRange>> {
    if !(MIN_RANGES..=MAX_RANGES).contains(&ranges.len()) {
        return Err(TimeRangeError::RangeCountOutOfBounds {
            count: ranges.len(),
            min: MIN_RANGES,
            max: MAX_RANGES,
        });
    }

    for (i, range) in ranges.iter().enumerate() {
        if ranges[i + 1..].iter().any(|other| other.bounds() == range.bounds()) {
            return Err(TimeRangeError::DuplicateRange {
                range: range.clone(),
            });
        }
    }

    check_overlaps(&ranges)?;

    for range in &ranges {
        check(range)?;
    }
    Ok(ranges)
}

fn check_overlaps(ranges: &[TimeRange]) -> Result<()> {
    if ranges.len() > 1 {
        if let Some(all_day) = ranges.iter().find(|r| r.all_day) {
            let other = ranges
                .iter()
                .find(|r| !std::ptr::eq(*r, all_day))
                .unwrap_or(all_day);
            return Err(TimeRangeError::Overlap {
                first: all_day.clone(),
                second: other.clone(),
            });
        }
    }

    let mut sorted: Vec<&TimeRange> = ranges.iter().collect();
    sorted.sort_by(|a, b| b.start_minutes().cmp(&a.start_minutes()));

    // Sorted by start, any overlap shows up between neighbours.
    for pair in sorted.windows(2) {
        let (later, earlier) = (pair[0], pair[1]);
        if later.overlaps(earlier) {
            return Err(TimeRangeError::Overlap {
                first: earlier.clone(),
                second: later.clone(),
            });
        }
    }
    Ok(())
}
