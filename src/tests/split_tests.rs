use crate::core::errors::LedgerError;
use crate::core::money::Money;
use crate::core::split::{SplitSpec, calculate_split, validate_split};
use std::collections::HashMap;

fn money(major: f64) -> Money {
    Money::from_major(major).unwrap()
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn equal_split_rounds_each_share_independently() {
    let splits = calculate_split(money(100.0), &ids(&["a", "b", "c"]), &SplitSpec::Equal).unwrap();

    assert_eq!(splits.len(), 3);
    for split in &splits {
        assert_eq!(split.amount.cents(), 3333);
    }
    // The residual cent from independent rounding stays unassigned.
    let total: Money = splits.iter().map(|s| s.amount).sum();
    assert_eq!(total.cents(), 9999);
}

#[test]
fn equal_split_preserves_participant_order() {
    let splits = calculate_split(money(90.0), &ids(&["c", "a", "b"]), &SplitSpec::Equal).unwrap();
    let order: Vec<&str> = splits.iter().map(|s| s.user_id.as_str()).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
}

#[test]
fn exact_split_must_sum_to_total() {
    let short = SplitSpec::Exact(HashMap::from([
        ("a".to_string(), money(60.0)),
        ("b".to_string(), money(39.0)),
    ]));
    let err = validate_split(money(100.0), &short).unwrap_err();
    match err {
        LedgerError::SplitSumMismatch { expected, actual } => {
            assert_eq!(expected, money(100.0));
            assert_eq!(actual, money(99.0));
        }
        other => panic!("expected SplitSumMismatch, got {:?}", other),
    }

    let ok = SplitSpec::Exact(HashMap::from([
        ("a".to_string(), money(60.0)),
        ("b".to_string(), money(40.0)),
    ]));
    assert!(validate_split(money(100.0), &ok).is_ok());
}

#[test]
fn exact_split_tolerates_one_cent() {
    let spec = SplitSpec::Exact(HashMap::from([
        ("a".to_string(), money(60.0)),
        ("b".to_string(), money(39.99)),
    ]));
    assert!(validate_split(money(100.0), &spec).is_ok());
}

#[test]
fn percentage_split_must_sum_to_hundred() {
    let short = SplitSpec::Percentage(HashMap::from([
        ("a".to_string(), 50.0),
        ("b".to_string(), 49.5),
    ]));
    assert!(matches!(
        validate_split(money(80.0), &short),
        Err(LedgerError::PercentSumMismatch { .. })
    ));

    let ok = SplitSpec::Percentage(HashMap::from([
        ("a".to_string(), 33.33),
        ("b".to_string(), 33.33),
        ("c".to_string(), 33.34),
    ]));
    assert!(validate_split(money(80.0), &ok).is_ok());
}

#[test]
fn percentage_split_rounds_to_cents() {
    let spec = SplitSpec::Percentage(HashMap::from([
        ("a".to_string(), 33.33),
        ("b".to_string(), 66.67),
    ]));
    let splits = calculate_split(money(100.0), &ids(&["a", "b"]), &spec).unwrap();
    assert_eq!(splits[0].amount.cents(), 3333);
    assert_eq!(splits[0].percentage, Some(33.33));
    assert_eq!(splits[1].amount.cents(), 6667);
}

#[test]
fn rejects_empty_and_duplicate_participants() {
    assert!(matches!(
        calculate_split(money(10.0), &[], &SplitSpec::Equal),
        Err(LedgerError::InvalidInput(..))
    ));
    assert!(matches!(
        calculate_split(money(10.0), &ids(&["a", "a"]), &SplitSpec::Equal),
        Err(LedgerError::InvalidInput(..))
    ));
}

#[test]
fn custom_map_must_cover_participant_set() {
    let spec = SplitSpec::Exact(HashMap::from([("a".to_string(), money(10.0))]));
    assert!(matches!(
        calculate_split(money(10.0), &ids(&["a", "b"]), &spec),
        Err(LedgerError::InvalidInput(..))
    ));

    let extra = SplitSpec::Exact(HashMap::from([
        ("a".to_string(), money(5.0)),
        ("b".to_string(), money(5.0)),
    ]));
    assert!(matches!(
        calculate_split(money(10.0), &ids(&["a"]), &extra),
        Err(LedgerError::InvalidInput(..))
    ));
}

#[test]
fn rejects_negative_custom_amounts_and_percentages() {
    let negative_amount = SplitSpec::Exact(HashMap::from([
        ("a".to_string(), money(-5.0)),
        ("b".to_string(), money(15.0)),
    ]));
    assert!(matches!(
        validate_split(money(10.0), &negative_amount),
        Err(LedgerError::InvalidInput(..))
    ));

    let negative_pct = SplitSpec::Percentage(HashMap::from([
        ("a".to_string(), -10.0),
        ("b".to_string(), 110.0),
    ]));
    assert!(matches!(
        validate_split(money(10.0), &negative_pct),
        Err(LedgerError::InvalidInput(..))
    ));
}
