//! Property tests for the rule evaluation engine.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;

use notiguard_core::block_period::{is_blocked, truncate_to_minute};
use notiguard_core::next_unlock::{next_unlock, UnlockTime};
use notiguard_core::rule::{Rule, RuleType};
use notiguard_core::time_range::{validate_list, TimeRange};
use notiguard_core::weekday::WeekDay;

fn arb_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (0i64..3650, 0i64..86_400, 0u32..1_000_000_000).prop_map(|(days, secs, nanos)| {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        base + TimeDelta::days(days) + TimeDelta::seconds(secs) + TimeDelta::nanoseconds(nanos as i64)
    })
}

fn arb_days() -> impl Strategy<Value = Vec<WeekDay>> {
    prop::collection::btree_set(1u8..=7, 1..=7).prop_map(|codes| {
        codes
            .into_iter()
            .filter_map(WeekDay::from_code)
            .collect()
    })
}

fn range_from_minutes(start: u16, end: u16) -> TimeRange {
    TimeRange::new(
        (start / 60) as u8,
        (start % 60) as u8,
        (end / 60) as u8,
        (end % 60) as u8,
    )
    .unwrap()
}

/// Up to four non-overlapping ranges, or a single all-day range.
fn arb_ranges() -> impl Strategy<Value = Vec<TimeRange>> {
    let numeric = prop::collection::btree_set(0u16..1440, 2..=8).prop_map(|points| {
        let points: Vec<u16> = points.into_iter().collect();
        points
            .chunks_exact(2)
            .map(|pair| range_from_minutes(pair[0], pair[1]))
            .collect::<Vec<_>>()
    });
    prop_oneof![
        4 => numeric,
        1 => Just(vec![TimeRange::all_day()]),
    ]
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    (any::<bool>(), arb_days(), arb_ranges()).prop_map(|(restrictive, days, ranges)| {
        let rule_type = if restrictive {
            RuleType::Restrictive
        } else {
            RuleType::Permissive
        };
        Rule::new("generated", rule_type, days, ranges)
            .validated()
            .unwrap()
    })
}

fn arb_raw_range() -> impl Strategy<Value = TimeRange> {
    prop_oneof![
        4 => (0u8..24, 0u8..60, 0u8..24, 0u8..60).prop_map(|(sh, sm, eh, em)| TimeRange {
            id: None,
            start_hour: sh,
            start_minute: sm,
            end_hour: eh,
            end_minute: em,
            all_day: false,
        }),
        1 => Just(TimeRange::all_day()),
    ]
}

proptest! {
    /// Truncating to the minute twice changes nothing more.
    #[test]
    fn truncation_is_idempotent(time in arb_datetime()) {
        let once = truncate_to_minute(time);
        prop_assert_eq!(truncate_to_minute(once), once);
    }

    /// Flipping polarity flips the block state at every instant.
    #[test]
    fn flipped_rule_is_complementary(rule in arb_rule(), time in arb_datetime()) {
        prop_assert_eq!(is_blocked(&rule, time), !is_blocked(&rule.flipped(), time));
    }

    /// A restrictive, every-day, all-day rule blocks forever.
    #[test]
    fn permanent_block_always_blocks(time in arb_datetime()) {
        let rule = Rule::restrictive("forever", WeekDay::all(), vec![TimeRange::all_day()])
            .validated()
            .unwrap();
        prop_assert!(is_blocked(&rule, time));
        prop_assert_eq!(next_unlock(&rule, time), UnlockTime::Never);
    }

    /// Back-to-back ranges unlock exactly like the single merged range.
    #[test]
    fn chained_ranges_collapse(
        restrictive in any::<bool>(),
        days in arb_days(),
        time in arb_datetime(),
    ) {
        let rule_type = if restrictive { RuleType::Restrictive } else { RuleType::Permissive };
        let chained = Rule::new(
            "chained",
            rule_type,
            days.clone(),
            vec![
                TimeRange::new(8, 0, 11, 45).unwrap(),
                TimeRange::new(11, 46, 18, 0).unwrap(),
            ],
        );
        let merged = Rule::new(
            "merged",
            rule_type,
            days,
            vec![TimeRange::from_hours(8, 18).unwrap()],
        );
        prop_assert_eq!(next_unlock(&chained, time), next_unlock(&merged, time));
    }

    /// Validation of a pair does not depend on its order.
    #[test]
    fn overlap_detection_is_symmetric(a in arb_raw_range(), b in arb_raw_range()) {
        let forward = validate_list(vec![a.clone(), b.clone()]).is_err();
        let backward = validate_list(vec![b, a]).is_err();
        prop_assert_eq!(forward, backward);
    }

    /// The unlock instant never lies before the (truncated) reference time.
    #[test]
    fn unlock_is_never_in_the_past(rule in arb_rule(), time in arb_datetime()) {
        if let UnlockTime::At(unlock) = next_unlock(&rule, time) {
            prop_assert!(unlock >= truncate_to_minute(time));
        }
    }
}
