pub mod in_memory;

use crate::core::errors::LedgerError;
use crate::core::models::{Balance, Expense, Group, GroupAudit, Profile, Settlement};
use crate::core::money::Money;
use async_trait::async_trait;

/// Persistence collaborator for the ledger engine.
///
/// Implementations must provide per-row atomicity: a single
/// `update_balance_amount` call is all-or-nothing. Serialization of
/// concurrent mutations to the same group is handled above this trait by the
/// service's per-group lock.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_profile(&self, profile: Profile) -> Result<Profile, LedgerError>;
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, LedgerError>;
    async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>, LedgerError>;

    async fn save_group(&self, group: Group) -> Result<(), LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    /// Deletes the group and cascades to its expenses, balances, settlements
    /// and audit entries.
    async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError>;
    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, LedgerError>;

    async fn save_expense(&self, expense: Expense) -> Result<(), LedgerError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError>;
    async fn delete_expense(&self, expense_id: &str) -> Result<(), LedgerError>;
    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError>;

    /// Returns the unique balance row for the ordered (group, debtor,
    /// creditor) triple, creating it with amount zero if absent.
    async fn get_or_create_balance(
        &self,
        group_id: &str,
        debtor_id: &str,
        creditor_id: &str,
    ) -> Result<Balance, LedgerError>;
    async fn update_balance_amount(
        &self,
        balance_id: &str,
        amount: Money,
    ) -> Result<(), LedgerError>;
    async fn get_group_balances(&self, group_id: &str) -> Result<Vec<Balance>, LedgerError>;
    /// All rows where the user is the debtor, across groups.
    async fn get_debts(&self, user_id: &str) -> Result<Vec<Balance>, LedgerError>;
    /// All rows where the user is the creditor, across groups.
    async fn get_credits(&self, user_id: &str) -> Result<Vec<Balance>, LedgerError>;

    async fn save_settlement(&self, settlement: Settlement) -> Result<(), LedgerError>;
    async fn get_group_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError>;
    async fn get_user_settlements(&self, user_id: &str) -> Result<Vec<Settlement>, LedgerError>;

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), LedgerError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError>;
}
