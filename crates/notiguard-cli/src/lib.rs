//! Notiguard command-line front end.
//!
//! Loads a rule and engine configuration from JSON files, then asks the
//! core engine about block state, decisions and unlock times. The CLI plays
//! the clock source and notification source for the engine; everything it
//! computes comes from `notiguard-core`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use clap::Subcommand;
use directories::ProjectDirs;
use notiguard_core::{
    enforcement, is_blocked, Decision, EngineConfig, NextUnlockCalculator, Notification, Rule,
    UnlockTime,
};

/// Accepted formats for `--at`.
const AT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Location of the engine config used when `--config` is not given.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "notiguard", "Notiguard").map(|dirs| dirs.config_dir().join("engine.json"))
}

/// Loads the engine configuration.
///
/// An explicit path must exist. Without one, the default location is read
/// when present and built-in defaults are used otherwise.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => {
                tracing::debug!("no engine config found, using defaults");
                return Ok(EngineConfig::default());
            }
        },
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = EngineConfig::from_json(&json)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded engine config");
    Ok(config)
}

/// Reads and validates a rule from a JSON file.
pub fn load_rule(path: &Path) -> Result<Rule> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule {}", path.display()))?;
    let rule: Rule = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse rule {}", path.display()))?;
    rule.validated()
        .with_context(|| format!("rule {} is invalid", path.display()))
}

/// Parses a local wall-clock time such as `2025-05-20T12:20`.
pub fn parse_at(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .with_context(|| format!("invalid time {raw:?}, expected YYYY-MM-DDTHH:MM"))
}

/// Resolves `--at`, falling back to the local clock.
pub fn resolve_at(raw: Option<&str>) -> Result<NaiveDateTime> {
    match raw {
        Some(raw) => parse_at(raw),
        None => Ok(Local::now().naive_local()),
    }
}

/// Outcome of the `check` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub rule_id: String,
    pub at: NaiveDateTime,
    pub blocked: bool,
    pub decision: Decision,
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rule:     {}", self.rule_id)?;
        writeln!(f, "at:       {}", self.at.format("%Y-%m-%d %H:%M (%A)"))?;
        writeln!(f, "blocked:  {}", if self.blocked { "yes" } else { "no" })?;
        write!(f, "decision: {}", self.decision)
    }
}

/// Evaluates a notification against a rule.
pub fn check(rule: &Rule, notification: &Notification, at: NaiveDateTime) -> CheckReport {
    CheckReport {
        rule_id: rule.id.clone(),
        at,
        blocked: is_blocked(rule, at),
        decision: enforcement::evaluate(rule, notification, at),
    }
}

/// Outcome of the `next-unlock` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockReport {
    pub unlock: UnlockTime,
    pub epoch_millis: i64,
}

impl std::fmt::Display for UnlockReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.unlock {
            UnlockTime::At(_) => write!(f, "next unlock: {} ({} ms)", self.unlock, self.epoch_millis),
            UnlockTime::Never => write!(f, "next unlock: never ({})", self.epoch_millis),
        }
    }
}

/// Computes the next unlock and its epoch value in `tz`.
pub fn next_unlock<Tz: TimeZone>(
    config: &EngineConfig,
    rule: &Rule,
    at: NaiveDateTime,
    tz: &Tz,
) -> UnlockReport {
    let unlock = NextUnlockCalculator::new(config.clone()).next_unlock(rule, at);
    UnlockReport {
        unlock,
        epoch_millis: unlock.to_epoch_millis(tz),
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate a rule file and print its normalized form
    Validate {
        /// Rule file (JSON)
        rule: PathBuf,
    },
    /// Report block state and the decision for a notification
    Check {
        /// Rule file (JSON)
        rule: PathBuf,
        /// Local time to evaluate at (YYYY-MM-DDTHH:MM), defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Notification title
        #[arg(long, default_value = "")]
        title: String,
        /// Notification content
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Print the next instant the rule lets notifications through
    NextUnlock {
        /// Rule file (JSON)
        rule: PathBuf,
        /// Local time to search from (YYYY-MM-DDTHH:MM), defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

/// Runs a subcommand and returns what it prints.
///
/// Only `next-unlock` reads the engine config.
pub fn run(command: &Command, config_path: Option<&Path>) -> Result<String> {
    match command {
        Command::Validate { rule } => {
            let rule = load_rule(rule)?;
            tracing::info!(rule_id = %rule.id, "rule is valid");
            Ok(serde_json::to_string_pretty(&rule)?)
        }
        Command::Check {
            rule,
            at,
            title,
            content,
        } => {
            let rule = load_rule(rule)?;
            let at = resolve_at(at.as_deref())?;
            let notification = Notification::new(title.as_str(), content.as_str());
            Ok(check(&rule, &notification, at).to_string())
        }
        Command::NextUnlock { rule, at } => {
            let config = load_config(config_path)?;
            let rule = load_rule(rule)?;
            let at = resolve_at(at.as_deref())?;
            Ok(next_unlock(&config, &rule, at, &Local).to_string())
        }
    }
}
