use crate::core::money::Money;
use serde::{Deserialize, Serialize};

/// A directed debt edge: `debtor_id` owes `creditor_id` `amount`.
///
/// At most one row exists per ordered (group, debtor, creditor) triple, and
/// the amount never goes negative. A zero row is equivalent to an absent one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Balance {
    pub id: String,
    pub group_id: String,
    pub debtor_id: String,
    pub creditor_id: String,
    pub amount: Money,
}

/// Signed per-member summary: positive means the member is owed money.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetBalance {
    pub user_id: String,
    pub net: Money,
}

/// One payment in a simplified-debt plan. Derived on read, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Money,
}

/// Cross-group totals for a single user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub total_owed: Money,
    pub total_owing: Money,
    pub net_balance: Money,
}
