//! Shared tolerances and audit action names.

/// Residual (in cents) below which a debt is considered settled. Mirrors the
/// one-cent tolerance applied when validating custom split sums.
pub const SPLIT_TOLERANCE_CENTS: i64 = 1;

/// Allowed deviation when percentage splits are summed against 100.
pub const PERCENT_SUM_TOLERANCE: f64 = 0.01;

/// Upper bound on a single expense or settlement, in cents (1,000,000.00).
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

// Audit action names, stored verbatim in AppLog / GroupAudit rows.
pub const PROFILE_CREATED: &str = "PROFILE_CREATED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_DELETED: &str = "GROUP_DELETED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const SETTLEMENT_RECORDED: &str = "SETTLEMENT_RECORDED";
