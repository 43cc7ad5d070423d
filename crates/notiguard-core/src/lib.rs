//! Notiguard Core - rule evaluation for time-window notification blocking.
//!
//! This crate decides whether an app's notifications are blocked at a given
//! moment, when the block lifts, and what to do with a single notification.
//! It is pure: no I/O, no clock reads, no shared state. Callers supply the
//! local wall-clock time and the notification text.
//!
//! ## Modules
//!
//! - [`time_range`] - time-of-day intervals and their validation
//! - [`weekday`] - the seven days and their calendar codes
//! - [`condition`] - keyword conditions and their matcher
//! - [`rule`] - rules and rule validation
//! - [`block_period`] - "is blocked now" predicate
//! - [`next_unlock`] - search for the next unlock instant
//! - [`enforcement`] - allow / cancel / snooze verdicts
//! - [`registry`] - rules and the apps they manage
//! - [`config`] - engine configuration

pub mod block_period;
pub mod condition;
pub mod config;
pub mod enforcement;
pub mod next_unlock;
pub mod registry;
pub mod rule;
pub mod time_range;
pub mod weekday;

pub use block_period::is_blocked;
pub use condition::{is_satisfied_by, Condition, ConditionField, ConditionType, Notification};
pub use config::EngineConfig;
pub use enforcement::{decide, evaluate, Decision};
pub use next_unlock::{next_unlock, NextUnlockCalculator, UnlockTime, INFINITE};
pub use registry::{Enforcement, ManagedApp, RegistryError, RuleRegistry};
pub use rule::{Rule, RuleAction, RuleError, RuleType};
pub use time_range::{TimeRange, TimeRangeError};
pub use weekday::WeekDay;
