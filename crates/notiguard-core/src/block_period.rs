//! Point-in-time block state of a rule.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::rule::{Rule, RuleType};
use crate::weekday::WeekDay;

/// Drops seconds and sub-second precision; rules work at minute granularity.
pub fn truncate_to_minute(time: NaiveDateTime) -> NaiveDateTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Minutes elapsed since midnight of `time`'s day.
pub fn minutes_since_midnight(time: NaiveDateTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

/// Returns true if `rule` blocks the app at `now`.
///
/// On a day the rule does not list, a restrictive rule never blocks and a
/// permissive rule always does. On a listed day, ranges are matched
/// half-open (start inclusive, end exclusive).
pub fn is_blocked(rule: &Rule, now: NaiveDateTime) -> bool {
    let now = truncate_to_minute(now);
    let day = WeekDay::from_chrono(now.weekday());

    if !rule.days.contains(&day) {
        return rule.rule_type == RuleType::Permissive;
    }

    let minute = minutes_since_midnight(now);
    let time_matched = rule.has_all_day_range()
        || rule.time_ranges.iter().any(|r| r.contains_minute(minute));

    match rule.rule_type {
        RuleType::Restrictive => time_matched,
        RuleType::Permissive => !time_matched,
    }
}
