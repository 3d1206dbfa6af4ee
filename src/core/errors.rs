use crate::core::money::Money;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    /// Malformed or empty argument, with the offending field named
    #[error("Invalid input for `{0}`: {1}")]
    InvalidInput(String, String),

    /// Custom split amounts don't sum to the expense total
    #[error("Split amounts must sum to {expected}, current sum: {actual}")]
    SplitSumMismatch { expected: Money, actual: Money },

    /// Percentage splits don't sum to 100
    #[error("Percentages must sum to 100, current sum: {actual:.2}")]
    PercentSumMismatch { actual: f64 },

    /// Expense or settlement amount is not a valid positive currency value
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Profile with given ID or email not found
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Email is already registered to another profile
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(String),

    /// User is already a member of the group
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),

    /// Actor or participant is not a member of the group
    #[error("User {0} is not a group member")]
    NotGroupMember(String),

    /// Operation reserved for the group creator
    #[error("User {0} is not the group creator")]
    NotGroupCreator(String),

    /// The group creator is always a member and cannot be removed
    #[error("Group creator cannot be removed")]
    CreatorCannotBeRemoved,

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Only the payer may delete an expense
    #[error("User {0} is not the expense payer")]
    NotExpensePayer(String),

    /// Cannot settle a debt with oneself
    #[error("Cannot settle a debt with yourself")]
    SelfSettlement,

    /// Settlement against a pair with no outstanding balance
    #[error("No outstanding balance from {payer} to {payee}")]
    NoOutstandingDebt { payer: String, payee: String },

    /// Settlement amount exceeds the outstanding balance
    #[error("Settlement amount cannot exceed the outstanding balance of {outstanding}")]
    ExcessSettlementAmount { outstanding: Money },

    /// Opaque failure from the storage collaborator
    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Logging error: {0}")]
    Logging(String),
}
