//! Rules: when an app's notifications are held back, and how.
//!
//! A [`Rule`] combines a polarity ([`RuleType`]), the days it is active on,
//! up to ten [`TimeRange`]s, an optional keyword [`Condition`] and the
//! [`RuleAction`] taken on a blocked notification.
//!
//! Rules are built as drafts and checked with [`validate`] (or
//! [`Rule::validated`]). The evaluators assume a validated rule.
//!
//! ```
//! use notiguard_core::rule::{Rule, RuleAction};
//! use notiguard_core::time_range::TimeRange;
//! use notiguard_core::weekday::WeekDay;
//!
//! let rule = Rule::restrictive("work", WeekDay::weekdays(), vec![TimeRange::from_hours(9, 17)?])
//!     .with_name("  deep   WORK ")
//!     .with_action(RuleAction::Snooze)
//!     .validated()?;
//! assert_eq!(rule.name, "Deep Work");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::{Condition, ConditionError};
use crate::time_range::{self, TimeRange, TimeRangeError};
use crate::weekday::WeekDay;

/// Minimum length of a non-empty rule name.
pub const MIN_NAME_LENGTH: usize = 3;

/// Maximum length of a rule name.
pub const MAX_NAME_LENGTH: usize = 50;

/// Errors produced while validating a rule.
///
/// Each variant names the sub-validation that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Normalized name is too short or too long.
    #[error("rule name {name:?} must be between {min} and {max} characters, got {length}")]
    NameLength {
        name: String,
        length: usize,
        min: usize,
        max: usize,
    },

    /// Day set is empty (or impossibly large).
    #[error("a rule must apply to between 1 and 7 days, got {count}")]
    DayCount { count: usize },

    /// Time range set failed validation.
    #[error("invalid time ranges: {0}")]
    TimeRanges(#[from] TimeRangeError),

    /// Rule id is blank.
    #[error("rule id must not be blank")]
    BlankId,

    /// Condition failed validation.
    #[error("invalid condition: {0}")]
    Condition(#[from] ConditionError),

    /// A rule that blocks forever has nothing to snooze until.
    #[error("rule {id:?} blocks permanently and cannot snooze notifications")]
    SnoozeOnPermanentBlock { id: String },
}

/// Result type for rule validation.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Rule polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Time ranges are blocked windows.
    Restrictive,
    /// Time ranges are allowed windows; everything else is blocked.
    Permissive,
}

impl RuleType {
    /// Returns the opposite polarity.
    pub fn flipped(&self) -> Self {
        match self {
            RuleType::Restrictive => RuleType::Permissive,
            RuleType::Permissive => RuleType::Restrictive,
        }
    }
}

/// What happens to a notification that arrives while blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Hold the notification and deliver it when the block ends.
    Snooze,
    /// Drop the notification.
    #[default]
    Cancel,
}

impl RuleAction {
    /// Returns a human-readable name for this action.
    pub fn name(&self) -> &'static str {
        match self {
            RuleAction::Snooze => "Snooze",
            RuleAction::Cancel => "Cancel",
        }
    }
}

/// A time-window rule for one or more managed apps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier, owned by the caller's store.
    pub id: String,
    /// Display name; empty when the caller derives one elsewhere.
    #[serde(default)]
    pub name: String,
    /// Polarity of the time ranges.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Action taken on blocked notifications.
    #[serde(default)]
    pub action: RuleAction,
    /// Days the time ranges apply to.
    pub days: BTreeSet<WeekDay>,
    /// Time ranges, in the order the user entered them.
    pub time_ranges: Vec<TimeRange>,
    /// Optional keyword filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Rule {
    /// Creates an unvalidated rule draft.
    pub fn new(
        id: impl Into<String>,
        rule_type: RuleType,
        days: impl IntoIterator<Item = WeekDay>,
        time_ranges: Vec<TimeRange>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            rule_type,
            action: RuleAction::default(),
            days: days.into_iter().collect(),
            time_ranges,
            condition: None,
        }
    }

    /// Draft of a rule whose ranges are blocked windows.
    pub fn restrictive(
        id: impl Into<String>,
        days: impl IntoIterator<Item = WeekDay>,
        time_ranges: Vec<TimeRange>,
    ) -> Self {
        Self::new(id, RuleType::Restrictive, days, time_ranges)
    }

    /// Draft of a rule whose ranges are allowed windows.
    pub fn permissive(
        id: impl Into<String>,
        days: impl IntoIterator<Item = WeekDay>,
        time_ranges: Vec<TimeRange>,
    ) -> Self {
        Self::new(id, RuleType::Permissive, days, time_ranges)
    }

    /// Sets the display name (normalized on validation).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the action for blocked notifications.
    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.action = action;
        self
    }

    /// Attaches a keyword condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Validates this rule, returning the normalized copy.
    pub fn validated(self) -> Result<Self> {
        validate(self)
    }

    /// Returns true if any range covers the whole day.
    pub fn has_all_day_range(&self) -> bool {
        self.time_ranges.iter().any(|r| r.all_day)
    }

    /// Returns true if the rule blocks around the clock, every day.
    pub fn is_permanent_block(&self) -> bool {
        self.rule_type == RuleType::Restrictive
            && self.days.len() == 7
            && self.has_all_day_range()
    }

    /// Returns the rule's ranges ordered by start time.
    pub fn sorted_ranges(&self) -> Vec<&TimeRange> {
        let mut ranges: Vec<&TimeRange> = self.time_ranges.iter().collect();
        ranges.sort_by_key(|r| r.start_minutes());
        ranges
    }

    /// Same days and ranges with the opposite polarity.
    pub fn flipped(&self) -> Self {
        Self {
            rule_type: self.rule_type.flipped(),
            ..self.clone()
        }
    }
}

/// Trims, collapses inner whitespace and title-cases every word.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Validates a rule name and returns it normalized.
///
/// An empty name is accepted as-is.
pub fn validate_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Ok(String::new());
    }

    let normalized = normalize_name(name);
    let length = normalized.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
        return Err(RuleError::NameLength {
            name: normalized,
            length,
            min: MIN_NAME_LENGTH,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(normalized)
}

/// Validates the active day set.
pub fn validate_days(days: &BTreeSet<WeekDay>) -> Result<()> {
    if !(1..=7).contains(&days.len()) {
        return Err(RuleError::DayCount { count: days.len() });
    }
    Ok(())
}

/// Validates the optional condition.
pub fn validate_condition(condition: Option<Condition>) -> Result<Option<Condition>> {
    condition
        .map(crate::condition::validate)
        .transpose()
        .map_err(RuleError::from)
}

/// Rejects rules whose action contradicts their schedule.
pub fn validate_self_consistency(rule: &Rule) -> Result<()> {
    if rule.action == RuleAction::Snooze && rule.is_permanent_block() {
        return Err(RuleError::SnoozeOnPermanentBlock {
            id: rule.id.clone(),
        });
    }
    Ok(())
}

/// Validates a whole rule, returning a normalized copy.
///
/// Checks run in order (name, days, time ranges, id, condition,
/// self-consistency) and the first failure is returned.
pub fn validate(rule: Rule) -> Result<Rule> {
    let name = validate_name(&rule.name)?;
    validate_days(&rule.days)?;
    let time_ranges = time_range::validate_list(rule.time_ranges)?;
    if rule.id.trim().is_empty() {
        return Err(RuleError::BlankId);
    }
    let condition = validate_condition(rule.condition)?;

    let rule = Rule {
        name,
        time_ranges,
        condition,
        ..rule
    };
    validate_self_consistency(&rule)?;
    Ok(rule)
}
