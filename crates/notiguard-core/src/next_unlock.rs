//! Search for the next moment a rule stops blocking an app.
//!
//! The search walks at most [`SEARCH_HORIZON_DAYS`] candidate days: the
//! current day from `now`, then each following day from midnight. A rule
//! active on a single weekday can need the whole week plus the current day
//! before its next occurrence comes around.
//!
//! Chained ranges (one ends a minute before the next starts) are treated as
//! one continuous period, so no unlock is reported at the seam.

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use crate::block_period::truncate_to_minute;
use crate::config::EngineConfig;
use crate::rule::{Rule, RuleType};
use crate::weekday::WeekDay;

/// Epoch-millisecond value meaning "never unlocks".
pub const INFINITE: i64 = -1;

/// Number of candidate days examined, the current one included.
pub const SEARCH_HORIZON_DAYS: u64 = 8;

/// Longest DST gap skipped when mapping a wall-clock instant to epoch time.
const MAX_GAP_MINUTES: i64 = 180;

/// Outcome of an unlock search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockTime {
    /// Wall-clock instant at which the app is unlocked.
    At(NaiveDateTime),
    /// The rule never unlocks within the search horizon (permanent block),
    /// or never blocks at all.
    Never,
}

impl UnlockTime {
    /// Returns the unlock instant, if any.
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            UnlockTime::At(time) => Some(*time),
            UnlockTime::Never => None,
        }
    }

    /// Returns true for the "never" outcome.
    pub fn is_never(&self) -> bool {
        matches!(self, UnlockTime::Never)
    }

    /// Converts to epoch milliseconds in the caller's time zone.
    ///
    /// Returns [`INFINITE`] for [`UnlockTime::Never`]. An ambiguous local
    /// time maps to its earliest instant; a time inside a DST gap maps to
    /// the first valid minute after it.
    pub fn to_epoch_millis<Tz: TimeZone>(&self, tz: &Tz) -> i64 {
        match self {
            UnlockTime::At(time) => local_epoch_millis(*time, tz),
            UnlockTime::Never => INFINITE,
        }
    }
}

impl std::fmt::Display for UnlockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnlockTime::At(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M")),
            UnlockTime::Never => write!(f, "never"),
        }
    }
}

fn local_epoch_millis<Tz: TimeZone>(time: NaiveDateTime, tz: &Tz) -> i64 {
    (0..=MAX_GAP_MINUTES)
        .find_map(|skip| {
            tz.from_local_datetime(&(time + TimeDelta::minutes(skip)))
                .earliest()
        })
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| {
            tracing::warn!(
                %time,
                max_gap_minutes = MAX_GAP_MINUTES,
                "no valid local time near unlock instant, reading it as UTC"
            );
            time.and_utc().timestamp_millis()
        })
}

/// Computes when a rule next unlocks an app.
#[derive(Debug, Clone, Default)]
pub struct NextUnlockCalculator {
    config: EngineConfig,
}

impl NextUnlockCalculator {
    /// Creates a calculator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the next unlock instant for `rule` as seen from `now`.
    pub fn next_unlock(&self, rule: &Rule, now: NaiveDateTime) -> UnlockTime {
        let now = truncate_to_minute(now);
        let unlock = match rule.rule_type {
            RuleType::Restrictive => self.restrictive_unlock(rule, now),
            RuleType::Permissive => permissive_unlock(rule, now),
        };
        tracing::debug!(rule_id = %rule.id, %now, %unlock, "computed next unlock");
        unlock
    }

    /// Ranges are blocked windows: the unlock is the end of the block
    /// (plus the configured offset), or midnight of the first unlisted day
    /// once a blocked day has been seen.
    fn restrictive_unlock(&self, rule: &Rule, now: NaiveDateTime) -> UnlockTime {
        let ranges = rule.sorted_ranges();
        let offset = TimeDelta::minutes(self.config.restrictive_unlock_offset_minutes as i64);
        let mut passed_blocked_day = false;

        for reference in candidate_days(now) {
            let midnight = start_of_day(reference);

            if !rule.days.contains(&WeekDay::from_chrono(reference.weekday())) {
                if passed_blocked_day {
                    return UnlockTime::At(midnight);
                }
                continue;
            }

            passed_blocked_day = true;
            if rule.has_all_day_range() {
                continue;
            }

            for (i, range) in ranges.iter().enumerate() {
                if ranges
                    .get(i + 1)
                    .is_some_and(|next| range.is_chained_to(next))
                {
                    continue;
                }
                let end = midnight + TimeDelta::minutes(range.end_minutes() as i64);
                if end >= reference {
                    return UnlockTime::At(end + offset);
                }
            }
        }
        UnlockTime::Never
    }
}

/// Ranges are allowed windows: the unlock is the start of the next window.
fn permissive_unlock(rule: &Rule, now: NaiveDateTime) -> UnlockTime {
    let ranges = rule.sorted_ranges();
    let mut passed_blocked_day = false;

    for reference in candidate_days(now) {
        let midnight = start_of_day(reference);

        if !rule.days.contains(&WeekDay::from_chrono(reference.weekday())) {
            passed_blocked_day = true;
            continue;
        }

        if rule.has_all_day_range() {
            // Still inside the first run of open days; nothing to unlock yet.
            if !passed_blocked_day {
                continue;
            }
            return UnlockTime::At(midnight);
        }

        for (i, range) in ranges.iter().enumerate() {
            // The later half of a chained pair opens at the seam, not a real gap.
            if i > 0 && ranges[i - 1].is_chained_to(range) {
                continue;
            }
            let start = midnight + TimeDelta::minutes(range.start_minutes() as i64);
            if start >= reference {
                return UnlockTime::At(start);
            }
        }
    }
    UnlockTime::Never
}

/// `now`, then midnight of each following day.
fn candidate_days(now: NaiveDateTime) -> impl Iterator<Item = NaiveDateTime> {
    (0..SEARCH_HORIZON_DAYS).filter_map(move |offset| {
        if offset == 0 {
            return Some(now);
        }
        now.date()
            .checked_add_days(Days::new(offset))
            .map(|date| date.and_time(NaiveTime::MIN))
    })
}

fn start_of_day(time: NaiveDateTime) -> NaiveDateTime {
    time.date().and_time(NaiveTime::MIN)
}

/// Next unlock with the default [`EngineConfig`].
pub fn next_unlock(rule: &Rule, now: NaiveDateTime) -> UnlockTime {
    NextUnlockCalculator::default().next_unlock(rule, now)
}
