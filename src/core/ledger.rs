//! Pure ledger computations over balance rows: pairwise netting, per-member
//! net balances, and greedy debt simplification.
//!
//! These run on snapshots handed in by the service layer; persistence of the
//! resulting updates stays with the caller so the stages remain independently
//! testable.

use crate::constants::SPLIT_TOLERANCE_CENTS;
use crate::core::models::{Balance, NetBalance, Transfer};
use crate::core::money::Money;
use std::collections::{HashMap, HashSet};

/// Computes the canonical-form updates for reciprocal debts.
///
/// For every pair with positive rows in both directions, both are reduced by
/// the smaller amount: the larger direction survives, the other becomes zero.
/// Returns `(balance_id, new_amount)` pairs; rows not listed are unchanged.
/// Running the result through this function again yields no further updates.
pub fn netting_adjustments(balances: &[Balance]) -> Vec<(String, Money)> {
    let mut updates = Vec::new();
    let mut processed: HashSet<(String, String)> = HashSet::new();

    for balance in balances {
        let mut pair = [balance.debtor_id.clone(), balance.creditor_id.clone()];
        pair.sort();
        let [a, b] = pair;
        if !processed.insert((a, b)) {
            continue;
        }

        let reverse = balances.iter().find(|other| {
            other.debtor_id == balance.creditor_id && other.creditor_id == balance.debtor_id
        });

        if let Some(reverse) = reverse {
            if balance.amount.is_positive() && reverse.amount.is_positive() {
                let smaller = balance.amount.min(reverse.amount);
                updates.push((balance.id.clone(), balance.amount - smaller));
                updates.push((reverse.id.clone(), reverse.amount - smaller));
            }
        }
    }

    updates
}

/// Per-member net position: credits minus debts, one entry per supplied
/// member in the supplied order. Members with no rows net to zero.
pub fn net_balances(balances: &[Balance], member_ids: &[String]) -> Vec<NetBalance> {
    let mut nets: HashMap<&str, Money> = HashMap::new();

    for balance in balances {
        *nets.entry(balance.creditor_id.as_str()).or_insert(Money::ZERO) += balance.amount;
        *nets.entry(balance.debtor_id.as_str()).or_insert(Money::ZERO) -= balance.amount;
    }

    member_ids
        .iter()
        .map(|user_id| NetBalance {
            user_id: user_id.clone(),
            net: nets.get(user_id.as_str()).copied().unwrap_or(Money::ZERO),
        })
        .collect()
}

/// Collapses net balances into a transfer plan by greedily matching the
/// largest creditor with the largest debtor.
///
/// Members within a cent of zero are already settled and excluded. The result
/// is deterministic for a given input order (stable descending sort) and
/// conserves money: emitted transfers sum to the positive net balances. The
/// plan is a derived view, recomputed from current balances on every request.
pub fn simplify(nets: &[NetBalance]) -> Vec<Transfer> {
    let mut creditors: Vec<(&str, Money)> = nets
        .iter()
        .filter(|n| n.net.cents() > SPLIT_TOLERANCE_CENTS)
        .map(|n| (n.user_id.as_str(), n.net))
        .collect();
    let mut debtors: Vec<(&str, Money)> = nets
        .iter()
        .filter(|n| n.net.cents() < -SPLIT_TOLERANCE_CENTS)
        .map(|n| (n.user_id.as_str(), -n.net))
        .collect();

    creditors.sort_by(|a, b| b.1.cmp(&a.1));
    debtors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut transfers = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].1.min(creditors[j].1);

        if amount.cents() > SPLIT_TOLERANCE_CENTS {
            transfers.push(Transfer {
                from: debtors[i].0.to_string(),
                to: creditors[j].0.to_string(),
                amount,
            });
        }

        debtors[i].1 -= amount;
        creditors[j].1 -= amount;

        if debtors[i].1.cents() <= SPLIT_TOLERANCE_CENTS {
            i += 1;
        }
        if creditors[j].1.cents() <= SPLIT_TOLERANCE_CENTS {
            j += 1;
        }
    }

    transfers
}
