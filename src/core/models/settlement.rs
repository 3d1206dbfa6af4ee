use crate::core::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded real-world payment from `payer_id` to `payee_id`.
///
/// Settlements are the audit trail: append-only, never mutated or deleted.
/// Only the derived Balance row is adjusted when one is recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settlement {
    pub id: String,
    pub group_id: String,
    pub payer_id: String,
    pub payee_id: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}
