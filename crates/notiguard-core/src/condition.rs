//! Keyword conditions that narrow when a rule's verdict applies.
//!
//! A [`Condition`] looks for keywords in a notification's title, content, or
//! both. `OnlyIf` conditions apply the rule only to matching notifications;
//! `Except` conditions exempt them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of keywords in one condition.
pub const MAX_KEYWORDS: usize = 50;

/// Maximum length of a single keyword, in characters, after trimming.
pub const MAX_KEYWORD_LENGTH: usize = 30;

/// Errors produced while validating a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// A keyword is empty once trimmed.
    #[error("keyword must not be blank")]
    BlankKeyword,

    /// A keyword exceeds the length limit.
    #[error("keyword {keyword:?} is {length} characters long (max {max})")]
    KeywordLength {
        keyword: String,
        length: usize,
        max: usize,
    },

    /// No keywords at all.
    #[error("a condition needs at least one keyword")]
    EmptyKeywords,

    /// Too many keywords.
    #[error("a condition allows at most {max} keywords, got {count}")]
    TooManyKeywords { count: usize, max: usize },
}

/// Result type for condition validation.
pub type Result<T> = std::result::Result<T, ConditionError>;

/// Polarity of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// The rule applies only when a keyword matches.
    OnlyIf,
    /// The rule applies unless a keyword matches.
    Except,
}

/// Which part of the notification is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    Title,
    Content,
    #[default]
    Both,
}

/// A keyword filter attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Whether a match applies or exempts the rule.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Field searched for keywords.
    #[serde(default)]
    pub field: ConditionField,
    /// Keywords, any of which counts as a match.
    pub keywords: Vec<String>,
    /// Match keywords with exact casing.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Condition {
    /// Creates a validated condition. Keywords are stored trimmed.
    pub fn new(
        condition_type: ConditionType,
        field: ConditionField,
        keywords: Vec<String>,
        case_sensitive: bool,
    ) -> Result<Self> {
        validate(Self {
            condition_type,
            field,
            keywords,
            case_sensitive,
        })
    }

    /// Creates a case-insensitive `OnlyIf` condition.
    pub fn only_if<I, S>(field: ConditionField, keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            ConditionType::OnlyIf,
            field,
            keywords.into_iter().map(Into::into).collect(),
            false,
        )
    }

    /// Creates a case-insensitive `Except` condition.
    pub fn except<I, S>(field: ConditionField, keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            ConditionType::Except,
            field,
            keywords.into_iter().map(Into::into).collect(),
            false,
        )
    }

    /// Sets case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// The text of a notification, as supplied by the notification source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Notification {
    /// Creates a notification from its title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    fn text_for(&self, field: ConditionField) -> String {
        match field {
            ConditionField::Title => self.title.clone(),
            ConditionField::Content => self.content.clone(),
            ConditionField::Both => format!("{} {}", self.title, self.content),
        }
    }
}

/// Validates a single keyword and returns it trimmed.
pub fn validate_keyword(keyword: &str) -> Result<String> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(ConditionError::BlankKeyword);
    }

    let length = trimmed.chars().count();
    if length > MAX_KEYWORD_LENGTH {
        return Err(ConditionError::KeywordLength {
            keyword: trimmed.to_string(),
            length,
            max: MAX_KEYWORD_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a keyword list and returns every keyword trimmed.
pub fn validate_keyword_list(keywords: &[String]) -> Result<Vec<String>> {
    if keywords.is_empty() {
        return Err(ConditionError::EmptyKeywords);
    }
    if keywords.len() > MAX_KEYWORDS {
        return Err(ConditionError::TooManyKeywords {
            count: keywords.len(),
            max: MAX_KEYWORDS,
        });
    }
    keywords.iter().map(|k| validate_keyword(k)).collect()
}

/// Validates a condition, normalizing its keywords.
pub fn validate(condition: Condition) -> Result<Condition> {
    let keywords = validate_keyword_list(&condition.keywords)?;
    Ok(Condition {
        keywords,
        ..condition
    })
}

/// Returns true if any keyword occurs in the selected notification text.
pub fn is_satisfied_by(condition: &Condition, notification: &Notification) -> bool {
    let text = notification.text_for(condition.field);

    if condition.case_sensitive {
        condition.keywords.iter().any(|k| text.contains(k.as_str()))
    } else {
        let text = text.to_lowercase();
        condition
            .keywords
            .iter()
            .any(|k| text.contains(k.to_lowercase().as_str()))
    }
}
