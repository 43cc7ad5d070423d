//! Days of the week a rule can be active on.
//!
//! Each day carries a stable numeric code following the common calendar
//! numbering (Sunday = 1 … Saturday = 7).

use serde::{Deserialize, Serialize};

/// Days of the week for rule scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl WeekDay {
    /// Returns all days of the week, starting on Sunday.
    pub fn all() -> Vec<WeekDay> {
        vec![
            WeekDay::Sunday,
            WeekDay::Monday,
            WeekDay::Tuesday,
            WeekDay::Wednesday,
            WeekDay::Thursday,
            WeekDay::Friday,
            WeekDay::Saturday,
        ]
    }

    /// Returns the working days (Monday through Friday).
    pub fn weekdays() -> Vec<WeekDay> {
        vec![
            WeekDay::Monday,
            WeekDay::Tuesday,
            WeekDay::Wednesday,
            WeekDay::Thursday,
            WeekDay::Friday,
        ]
    }

    /// Returns weekend days (Saturday and Sunday).
    pub fn weekends() -> Vec<WeekDay> {
        vec![WeekDay::Saturday, WeekDay::Sunday]
    }

    /// Returns the calendar code of this day (Sunday = 1 … Saturday = 7).
    pub fn code(&self) -> u8 {
        match self {
            WeekDay::Sunday => 1,
            WeekDay::Monday => 2,
            WeekDay::Tuesday => 3,
            WeekDay::Wednesday => 4,
            WeekDay::Thursday => 5,
            WeekDay::Friday => 6,
            WeekDay::Saturday => 7,
        }
    }

    /// Looks a day up by its calendar code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(WeekDay::Sunday),
            2 => Some(WeekDay::Monday),
            3 => Some(WeekDay::Tuesday),
            4 => Some(WeekDay::Wednesday),
            5 => Some(WeekDay::Thursday),
            6 => Some(WeekDay::Friday),
            7 => Some(WeekDay::Saturday),
            _ => None,
        }
    }

    /// Converts from chrono's Weekday.
    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Sun => WeekDay::Sunday,
            chrono::Weekday::Mon => WeekDay::Monday,
            chrono::Weekday::Tue => WeekDay::Tuesday,
            chrono::Weekday::Wed => WeekDay::Wednesday,
            chrono::Weekday::Thu => WeekDay::Thursday,
            chrono::Weekday::Fri => WeekDay::Friday,
            chrono::Weekday::Sat => WeekDay::Saturday,
        }
    }

    /// Returns a human-readable name for this day.
    pub fn name(&self) -> &'static str {
        match self {
            WeekDay::Sunday => "Sunday",
            WeekDay::Monday => "Monday",
            WeekDay::Tuesday => "Tuesday",
            WeekDay::Wednesday => "Wednesday",
            WeekDay::Thursday => "Thursday",
            WeekDay::Friday => "Friday",
            WeekDay::Saturday => "Saturday",
        }
    }
}

impl std::fmt::Display for WeekDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
