//! Final verdict for a single notification.
//!
//! Combines the rule's block state, its optional keyword condition and its
//! action into one [`Decision`].
//!
//! ## Decision table (with a condition)
//!
//! | rule        | blocked | condition | satisfied | verdict |
//! |-------------|---------|-----------|-----------|---------|
//! | restrictive | yes     | only if   | yes       | block   |
//! | restrictive | yes     | only if   | no        | allow   |
//! | restrictive | yes     | except    | yes       | allow   |
//! | restrictive | yes     | except    | no        | block   |
//! | permissive  | no      | only if   | yes       | allow   |
//! | permissive  | no      | only if   | no        | block   |
//! | permissive  | no      | except    | yes       | block   |
//! | permissive  | no      | except    | no        | allow   |
//!
//! Any other combination allows. "Block" means the rule's action
//! (cancel or snooze).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::block_period::is_blocked;
use crate::condition::{is_satisfied_by, Condition, ConditionType, Notification};
use crate::rule::{Rule, RuleAction, RuleType};

/// What to do with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Deliver the notification.
    #[default]
    Allow,
    /// Drop the notification.
    Cancel,
    /// Hold the notification until the block ends.
    Snooze,
}

impl Decision {
    /// The blocking decision matching a rule action.
    pub fn from_action(action: RuleAction) -> Self {
        match action {
            RuleAction::Cancel => Decision::Cancel,
            RuleAction::Snooze => Decision::Snooze,
        }
    }

    /// Returns a human-readable name for this decision.
    pub fn name(&self) -> &'static str {
        match self {
            Decision::Allow => "Allow",
            Decision::Cancel => "Cancel",
            Decision::Snooze => "Snooze",
        }
    }

    /// Returns true if the notification passes through.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decides a notification's fate from precomputed block and condition state.
pub fn decide(
    rule: &Rule,
    condition: Option<&Condition>,
    is_blocked_now: bool,
    condition_satisfied: bool,
) -> Decision {
    let block = Decision::from_action(rule.action);

    let Some(condition) = condition else {
        return if is_blocked_now { block } else { Decision::Allow };
    };

    use ConditionType::{Except, OnlyIf};
    use RuleType::{Permissive, Restrictive};

    match (
        rule.rule_type,
        is_blocked_now,
        condition.condition_type,
        condition_satisfied,
    ) {
        (Restrictive, true, OnlyIf, true) => block,
        (Restrictive, true, OnlyIf, false) => Decision::Allow,
        (Restrictive, true, Except, true) => Decision::Allow,
        (Restrictive, true, Except, false) => block,
        (Permissive, false, OnlyIf, true) => Decision::Allow,
        (Permissive, false, OnlyIf, false) => block,
        (Permissive, false, Except, true) => block,
        (Permissive, false, Except, false) => Decision::Allow,
        (rule_type, blocked, condition_type, satisfied) => {
            tracing::debug!(
                rule_id = %rule.id,
                ?rule_type,
                blocked,
                ?condition_type,
                satisfied,
                "no decision row matched, falling back to allow"
            );
            Decision::Allow
        }
    }
}

/// Evaluates `rule` against a notification arriving at `now`.
pub fn evaluate(rule: &Rule, notification: &Notification, now: NaiveDateTime) -> Decision {
    let blocked = is_blocked(rule, now);
    let condition = rule.condition.as_ref();
    let satisfied = condition.is_some_and(|c| is_satisfied_by(c, notification));

    let decision = decide(rule, condition, blocked, satisfied);
    tracing::debug!(rule_id = %rule.id, blocked, satisfied, %decision, "evaluated notification");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionField;
    use crate::time_range::TimeRange;
    use crate::weekday::WeekDay;
    use chrono::NaiveDate;

    fn rule(rule_type: RuleType, action: RuleAction) -> Rule {
        Rule::new(
            "r",
            rule_type,
            [WeekDay::Tuesday],
            vec![TimeRange::from_hours(8, 18).unwrap()],
        )
        .with_action(action)
    }

    fn condition(condition_type: ConditionType) -> Condition {
        Condition::new(
            condition_type,
            ConditionField::Both,
            vec!["bank".to_string()],
            false,
        )
        .unwrap()
    }

    fn tuesday(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    // ==================== Decision Tests ====================

    #[test]
    fn decision_from_action() {
        assert_eq!(Decision::from_action(RuleAction::Cancel), Decision::Cancel);
        assert_eq!(Decision::from_action(RuleAction::Snooze), Decision::Snooze);
        assert_eq!(Decision::default(), Decision::Allow);
        assert!(Decision::Allow.is_allowed());
        assert!(!Decision::Snooze.is_allowed());
    }

    // ==================== No Condition Tests ====================

    #[test]
    fn without_condition_block_state_decides() {
        let r = rule(RuleType::Restrictive, RuleAction::Snooze);
        assert_eq!(decide(&r, None, true, false), Decision::Snooze);
        assert_eq!(decide(&r, None, false, false), Decision::Allow);

        let r = rule(RuleType::Permissive, RuleAction::Cancel);
        assert_eq!(decide(&r, None, true, true), Decision::Cancel);
        assert_eq!(decide(&r, None, false, true), Decision::Allow);
    }

    // ==================== Truth Table Tests ====================

    #[test]
    fn restrictive_blocked_rows() {
        let r = rule(RuleType::Restrictive, RuleAction::Cancel);
        let only_if = condition(ConditionType::OnlyIf);
        let except = condition(ConditionType::Except);

        assert_eq!(decide(&r, Some(&only_if), true, true), Decision::Cancel);
        assert_eq!(decide(&r, Some(&only_if), true, false), Decision::Allow);
        assert_eq!(decide(&r, Some(&except), true, true), Decision::Allow);
        assert_eq!(decide(&r, Some(&except), true, false), Decision::Cancel);
    }

    #[test]
    fn permissive_unblocked_rows() {
        let r = rule(RuleType::Permissive, RuleAction::Snooze);
        let only_if = condition(ConditionType::OnlyIf);
        let except = condition(ConditionType::Except);

        assert_eq!(decide(&r, Some(&only_if), false, true), Decision::Allow);
        assert_eq!(decide(&r, Some(&only_if), false, false), Decision::Snooze);
        assert_eq!(decide(&r, Some(&except), false, true), Decision::Snooze);
        assert_eq!(decide(&r, Some(&except), false, false), Decision::Allow);
    }

    #[test]
    fn other_combinations_fall_back_to_allow() {
        let only_if = condition(ConditionType::OnlyIf);
        let except = condition(ConditionType::Except);
        let restrictive = rule(RuleType::Restrictive, RuleAction::Cancel);
        let permissive = rule(RuleType::Permissive, RuleAction::Cancel);

        for satisfied in [true, false] {
            for c in [&only_if, &except] {
                assert_eq!(decide(&restrictive, Some(c), false, satisfied), Decision::Allow);
                assert_eq!(decide(&permissive, Some(c), true, satisfied), Decision::Allow);
            }
        }
    }

    // ==================== Evaluate Tests ====================

    #[test]
    fn evaluate_blocks_matching_notification_during_block() {
        let r = rule(RuleType::Restrictive, RuleAction::Snooze)
            .with_condition(condition(ConditionType::OnlyIf));
        let notification = Notification::new("Bank alert", "Transfer received");
        assert_eq!(evaluate(&r, &notification, tuesday(12, 20)), Decision::Snooze);
    }

    #[test]
    fn evaluate_lets_non_matching_notification_through() {
        let r = rule(RuleType::Restrictive, RuleAction::Snooze)
            .with_condition(condition(ConditionType::OnlyIf));
        let notification = Notification::new("Chat", "hello");
        assert_eq!(evaluate(&r, &notification, tuesday(12, 20)), Decision::Allow);
    }

    #[test]
    fn evaluate_without_condition_outside_block() {
        let r = rule(RuleType::Restrictive, RuleAction::Cancel);
        let notification = Notification::new("Chat", "hello");
        assert_eq!(evaluate(&r, &notification, tuesday(19, 0)), Decision::Allow);
        assert_eq!(evaluate(&r, &notification, tuesday(9, 0)), Decision::Cancel);
    }

    #[test]
    fn evaluate_permissive_except_inside_window() {
        let r = rule(RuleType::Permissive, RuleAction::Cancel)
            .with_condition(condition(ConditionType::Except));
        let matching = Notification::new("", "bank statement");
        let other = Notification::new("", "lunch?");
        assert_eq!(evaluate(&r, &matching, tuesday(12, 20)), Decision::Cancel);
        assert_eq!(evaluate(&r, &other, tuesday(12, 20)), Decision::Allow);
    }

    #[test]
    fn decision_serialization() {
        assert_eq!(serde_json::to_string(&Decision::Snooze).unwrap(), "\"snooze\"");
        assert_eq!(serde_json::to_string(&Decision::Allow).unwrap(), "\"allow\"");
    }
}
