//! In-memory registry of rules and the apps they manage.
//!
//! Every managed app references exactly one rule by id. The registry keeps
//! that association consistent: rules are validated on the way in, an app
//! can only be bound to an existing rule, and a rule cannot be removed while
//! an app still uses it.
//!
//! ## Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use notiguard_core::condition::Notification;
//! use notiguard_core::enforcement::Decision;
//! use notiguard_core::registry::RuleRegistry;
//! use notiguard_core::rule::Rule;
//! use notiguard_core::time_range::TimeRange;
//! use notiguard_core::weekday::WeekDay;
//!
//! let mut registry = RuleRegistry::new();
//! registry.add_rule(Rule::restrictive("focus", WeekDay::all(), vec![TimeRange::from_hours(9, 17)?]))?;
//! registry.manage_app("com.example.chat", "focus")?;
//!
//! let now = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! let outcome = registry
//!     .enforce("com.example.chat", &Notification::new("Hi", "lunch?"), now)?
//!     .expect("app is managed");
//! assert_eq!(outcome.decision, Decision::Cancel);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block_period::is_blocked;
use crate::condition::{is_satisfied_by, Notification};
use crate::config::EngineConfig;
use crate::enforcement::{self, Decision};
use crate::next_unlock::{NextUnlockCalculator, UnlockTime};
use crate::rule::{self, Rule, RuleError};

/// Errors produced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The rule failed validation.
    #[error("invalid rule: {0}")]
    InvalidRule(#[from] RuleError),

    /// A rule with the same id is already registered.
    #[error("rule {id:?} already exists")]
    DuplicateRule { id: String },

    /// The same app is bound to more than one rule.
    #[error("app {package:?} is bound to more than one rule")]
    DuplicateApp { package: String },

    /// No rule with this id is registered.
    #[error("rule {id:?} not found")]
    UnknownRule { id: String },

    /// The rule is still referenced by managed apps.
    #[error("rule {id:?} is still used by {apps:?}")]
    RuleInUse { id: String, apps: Vec<String> },

    /// A managed app points at a rule that does not exist. Every managed
    /// app must reference an existing rule, so this is a bug, not a
    /// recoverable condition.
    #[error("impossible state: managed app {package:?} references missing rule {rule_id:?}")]
    ImpossibleState { package: String, rule_id: String },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// An app whose notifications are governed by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedApp {
    /// Platform package identifier of the app.
    pub package_name: String,
    /// Id of the rule governing the app.
    pub rule_id: String,
}

impl ManagedApp {
    /// Creates a new association.
    pub fn new(package_name: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            rule_id: rule_id.into(),
        }
    }
}

/// Outcome of enforcing a rule on one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enforcement {
    /// What to do with the notification.
    pub decision: Decision,
    /// Whether the rule's block period was active.
    pub blocked: bool,
    /// The rule that produced the decision.
    pub rule_id: String,
    /// Display name of that rule.
    pub rule_name: String,
}

impl Enforcement {
    /// Returns true if the notification should be held back.
    pub fn should_block(&self) -> bool {
        !self.decision.is_allowed()
    }
}

/// Rules and managed apps, kept consistent with each other.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    apps: Vec<ManagedApp>,
    calculator: NextUnlockCalculator,
}

impl RuleRegistry {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            calculator: NextUnlockCalculator::new(config),
            ..Self::default()
        }
    }

    /// Rebuilds a registry from records held by an external store.
    ///
    /// Rules are validated and must have unique ids. Each app may appear
    /// once. App associations are otherwise taken as stored; a dangling one
    /// surfaces as [`RegistryError::ImpossibleState`] when it is looked up.
    pub fn from_parts(
        config: EngineConfig,
        rules: Vec<Rule>,
        apps: Vec<ManagedApp>,
    ) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for rule in rules {
            registry.add_rule(rule)?;
        }
        for (i, app) in apps.iter().enumerate() {
            if apps[i + 1..]
                .iter()
                .any(|other| other.package_name == app.package_name)
            {
                return Err(RegistryError::DuplicateApp {
                    package: app.package_name.clone(),
                });
            }
        }
        registry.apps = apps;
        Ok(registry)
    }

    /// All registered rules.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// All managed apps.
    pub fn managed_apps(&self) -> &[ManagedApp] {
        &self.apps
    }

    /// Gets a rule by id.
    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Validates and registers a new rule.
    pub fn add_rule(&mut self, rule: Rule) -> Result<&Rule> {
        let rule = validated(rule)?;
        if self.get_rule(&rule.id).is_some() {
            return Err(RegistryError::DuplicateRule { id: rule.id });
        }

        tracing::debug!(rule_id = %rule.id, "registered rule");
        self.rules.push(rule);
        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Validates an edited rule and swaps it in for the one with the same id.
    pub fn replace_rule(&mut self, rule: Rule) -> Result<&Rule> {
        let rule = validated(rule)?;
        let Some(pos) = self.rules.iter().position(|r| r.id == rule.id) else {
            return Err(RegistryError::UnknownRule { id: rule.id });
        };

        tracing::debug!(rule_id = %rule.id, "replaced rule");
        self.rules[pos] = rule;
        Ok(&self.rules[pos])
    }

    /// Removes a rule that no app uses any more.
    pub fn remove_rule(&mut self, id: &str) -> Result<Rule> {
        let apps: Vec<String> = self
            .apps_using(id)
            .map(|app| app.package_name.clone())
            .collect();
        if !apps.is_empty() {
            return Err(RegistryError::RuleInUse {
                id: id.to_string(),
                apps,
            });
        }

        let Some(pos) = self.rules.iter().position(|r| r.id == id) else {
            return Err(RegistryError::UnknownRule { id: id.to_string() });
        };
        Ok(self.rules.remove(pos))
    }

    /// Apps governed by the given rule.
    pub fn apps_using<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a ManagedApp> {
        self.apps.iter().filter(move |app| app.rule_id == rule_id)
    }

    /// Binds an app to an existing rule, replacing any previous binding.
    pub fn manage_app(&mut self, package_name: &str, rule_id: &str) -> Result<()> {
        if self.get_rule(rule_id).is_none() {
            return Err(RegistryError::UnknownRule {
                id: rule_id.to_string(),
            });
        }

        match self.apps.iter_mut().find(|a| a.package_name == package_name) {
            Some(app) => app.rule_id = rule_id.to_string(),
            None => self.apps.push(ManagedApp::new(package_name, rule_id)),
        }
        tracing::debug!(package = package_name, rule_id, "managing app");
        Ok(())
    }

    /// Stops managing an app, returning its former association.
    pub fn unmanage_app(&mut self, package_name: &str) -> Option<ManagedApp> {
        let pos = self
            .apps
            .iter()
            .position(|a| a.package_name == package_name)?;
        Some(self.apps.remove(pos))
    }

    /// The rule governing an app, or `None` if the app is not managed.
    pub fn rule_for_app(&self, package_name: &str) -> Result<Option<&Rule>> {
        let Some(app) = self.apps.iter().find(|a| a.package_name == package_name) else {
            return Ok(None);
        };

        match self.get_rule(&app.rule_id) {
            Some(rule) => Ok(Some(rule)),
            None => {
                tracing::error!(
                    package = package_name,
                    rule_id = %app.rule_id,
                    "managed app references a missing rule"
                );
                Err(RegistryError::ImpossibleState {
                    package: app.package_name.clone(),
                    rule_id: app.rule_id.clone(),
                })
            }
        }
    }

    /// Decides what to do with a notification posted by `package_name`.
    ///
    /// Returns `None` for apps the registry does not manage.
    pub fn enforce(
        &self,
        package_name: &str,
        notification: &Notification,
        now: NaiveDateTime,
    ) -> Result<Option<Enforcement>> {
        let Some(rule) = self.rule_for_app(package_name)? else {
            return Ok(None);
        };

        let blocked = is_blocked(rule, now);
        let condition = rule.condition.as_ref();
        let satisfied = condition.is_some_and(|c| is_satisfied_by(c, notification));

        Ok(Some(Enforcement {
            decision: enforcement::decide(rule, condition, blocked, satisfied),
            blocked,
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
        }))
    }

    /// Next unlock for a managed app, or `None` if the app is not managed.
    pub fn next_unlock_for_app(
        &self,
        package_name: &str,
        now: NaiveDateTime,
    ) -> Result<Option<UnlockTime>> {
        Ok(self
            .rule_for_app(package_name)?
            .map(|rule| self.calculator.next_unlock(rule, now)))
    }
}

fn validated(rule: Rule) -> Result<Rule> {
    rule::validate(rule).map_err(|err| {
        tracing::warn!(error = %err, "rejected invalid rule");
        RegistryError::from(err)
    })
}
