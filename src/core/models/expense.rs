use crate::core::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Exact,
    Percentage,
}

/// One participant's share of an expense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub user_id: String,
    pub amount: Money,
    pub percentage: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount: Money,
    pub paid_by: String,
    pub split_type: SplitType,
    pub splits: Vec<ExpenseSplit>,
    pub created_at: DateTime<Utc>,
}
