//! Split calculation: turns an expense total into per-participant owed
//! amounts under an equal, exact or percentage policy.

use crate::constants::{PERCENT_SUM_TOLERANCE, SPLIT_TOLERANCE_CENTS};
use crate::core::errors::LedgerError;
use crate::core::models::ExpenseSplit;
use crate::core::money::Money;
use std::collections::{HashMap, HashSet};

/// Split policy together with the caller-supplied custom data it needs.
#[derive(Clone, Debug)]
pub enum SplitSpec {
    Equal,
    /// Participant id -> exact owed amount.
    Exact(HashMap<String, Money>),
    /// Participant id -> percentage of the total (0..=100).
    Percentage(HashMap<String, f64>),
}

/// Checks that a custom split is internally consistent, without touching any
/// state. Equal splits always validate.
pub fn validate_split(total: Money, spec: &SplitSpec) -> Result<(), LedgerError> {
    match spec {
        SplitSpec::Equal => Ok(()),
        SplitSpec::Exact(amounts) => {
            for (user_id, amount) in amounts {
                if amount.cents() < 0 {
                    return Err(LedgerError::InvalidInput(
                        "custom_amounts".to_string(),
                        format!("negative amount for user {}", user_id),
                    ));
                }
            }
            let sum: Money = amounts.values().copied().sum();
            if (sum - total).abs().cents() > SPLIT_TOLERANCE_CENTS {
                return Err(LedgerError::SplitSumMismatch {
                    expected: total,
                    actual: sum,
                });
            }
            Ok(())
        }
        SplitSpec::Percentage(percentages) => {
            for (user_id, pct) in percentages {
                if !pct.is_finite() || *pct < 0.0 {
                    return Err(LedgerError::InvalidInput(
                        "custom_percentages".to_string(),
                        format!("invalid percentage for user {}", user_id),
                    ));
                }
            }
            let sum: f64 = percentages.values().sum();
            if (sum - 100.0).abs() > PERCENT_SUM_TOLERANCE {
                return Err(LedgerError::PercentSumMismatch { actual: sum });
            }
            Ok(())
        }
    }
}

/// Computes each participant's owed amount, in participant order.
///
/// Equal shares are rounded half-up independently per participant, so the
/// rounded shares can undershoot the total by a few residual cents. That
/// leftover is intentionally not redistributed.
pub fn calculate_split(
    total: Money,
    participants: &[String],
    spec: &SplitSpec,
) -> Result<Vec<ExpenseSplit>, LedgerError> {
    if participants.is_empty() {
        return Err(LedgerError::InvalidInput(
            "participants".to_string(),
            "participant list is empty".to_string(),
        ));
    }
    let distinct: HashSet<&String> = participants.iter().collect();
    if distinct.len() != participants.len() {
        return Err(LedgerError::InvalidInput(
            "participants".to_string(),
            "participant list contains duplicates".to_string(),
        ));
    }
    match spec {
        SplitSpec::Exact(map) => check_covers_participants(map.keys(), &distinct, "custom_amounts")?,
        SplitSpec::Percentage(map) => {
            check_covers_participants(map.keys(), &distinct, "custom_percentages")?
        }
        SplitSpec::Equal => {}
    }

    validate_split(total, spec)?;

    let splits = match spec {
        SplitSpec::Equal => {
            let share = div_round_half_up(total.cents(), participants.len() as i64);
            participants
                .iter()
                .map(|user_id| ExpenseSplit {
                    user_id: user_id.clone(),
                    amount: Money::from_cents(share),
                    percentage: None,
                })
                .collect()
        }
        SplitSpec::Exact(amounts) => participants
            .iter()
            .map(|user_id| ExpenseSplit {
                user_id: user_id.clone(),
                amount: amounts[user_id],
                percentage: None,
            })
            .collect(),
        SplitSpec::Percentage(percentages) => participants
            .iter()
            .map(|user_id| {
                let pct = percentages[user_id];
                let cents = (total.cents() as f64 * pct / 100.0).round() as i64;
                ExpenseSplit {
                    user_id: user_id.clone(),
                    amount: Money::from_cents(cents),
                    percentage: Some(pct),
                }
            })
            .collect(),
    };

    Ok(splits)
}

fn check_covers_participants<'a>(
    keys: impl Iterator<Item = &'a String>,
    participants: &HashSet<&String>,
    field: &str,
) -> Result<(), LedgerError> {
    let keys: HashSet<&String> = keys.collect();
    if keys.len() != participants.len() || !participants.iter().all(|p| keys.contains(*p)) {
        return Err(LedgerError::InvalidInput(
            field.to_string(),
            "custom split must cover exactly the participant set".to_string(),
        ));
    }
    Ok(())
}

// Round-half-up integer division for non-negative numerators.
fn div_round_half_up(cents: i64, n: i64) -> i64 {
    (2 * cents + n) / (2 * n)
}
