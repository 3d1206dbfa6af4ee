use crate::constants::{
    EXPENSE_ADDED, EXPENSE_DELETED, GROUP_CREATED, GROUP_DELETED, MAX_AMOUNT_CENTS, MEMBER_ADDED,
    MEMBER_REMOVED, PROFILE_CREATED, SETTLEMENT_RECORDED, SPLIT_TOLERANCE_CENTS,
};
use crate::core::errors::LedgerError;
use crate::core::ledger;
use crate::core::models::{
    AppLog, Balance, BalanceSummary, Expense, ExpenseSplit, Group, GroupAudit, NetBalance, Profile,
    Settlement, SplitType, Transfer,
};
use crate::core::money::Money;
use crate::core::split::{self, SplitSpec};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize)]
pub struct AddExpenseInput {
    pub group_id: String,
    pub description: String,
    pub amount: f64,
    pub paid_by: String,
    pub split_type: SplitType,
    pub participant_ids: Vec<String>,
    pub custom_amounts: Option<HashMap<String, f64>>,
    pub custom_percentages: Option<HashMap<String, f64>>,
}

/// Result of adding an expense. `balances_updated == false` means the expense
/// row was written but the subsequent ledger update failed; the expense is
/// kept either way so financial history is never silently discarded, and
/// reconciliation is left to the caller.
#[derive(Clone, Debug, Serialize)]
pub struct ExpenseOutcome {
    pub expense: Expense,
    pub balances_updated: bool,
}

/// The debt-ledger engine plus the group/expense management around it.
///
/// Ledger-mutating operations (expense add/delete, settlement) for one group
/// are serialized behind a per-group mutex so the balance update and the
/// netting pass that follows it are observed as a single unit and no delta is
/// lost under concurrent requests. Group-scoped balance reads take the same
/// lock while snapshotting the rows, so a reader sees the state before or
/// after a mutation, never between its row writes.
pub struct LedgerService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    group_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<L: LoggingService, S: Storage> LedgerService<L, S> {
    pub fn new(storage: S, logging: L) -> Self {
        LedgerService {
            storage,
            logging,
            group_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn group_lock(&self, group_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.group_locks.lock().await;
        locks
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.logging
            .log_action(action, details.clone(), user_id)
            .await?;
        if let Some(gid) = group_id {
            self.storage
                .save_group_audit(GroupAudit {
                    id: Uuid::new_v4().to_string(),
                    group_id: gid.to_string(),
                    action: action.to_string(),
                    user_id: user_id.map(String::from),
                    details,
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }

    fn validate_string_input(
        &self,
        field: &str,
        value: &str,
        max_length: usize,
    ) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                field.to_string(),
                format!("{} cannot be empty", field),
            ));
        }
        if value.len() > max_length {
            return Err(LedgerError::InvalidInput(
                field.to_string(),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        Ok(())
    }

    /// Converts a major-unit amount from the request layer into cents,
    /// rejecting non-positive, oversized, or sub-cent precision values.
    fn validate_amount_input(&self, field: &str, amount: f64) -> Result<Money, LedgerError> {
        let money = Money::from_major(amount)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} must be a finite number", field)))?;
        if (amount * 100.0 - money.cents() as f64).abs() > 1e-6 {
            return Err(LedgerError::InvalidAmount(format!(
                "{} cannot have more than 2 decimal places",
                field
            )));
        }
        if !money.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} must be greater than 0",
                field
            )));
        }
        if money.cents() > MAX_AMOUNT_CENTS {
            return Err(LedgerError::InvalidAmount(format!(
                "{} cannot exceed 1,000,000",
                field
            )));
        }
        Ok(money)
    }

    async fn require_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    async fn require_member(&self, group_id: &str, user_id: &str) -> Result<Group, LedgerError> {
        let group = self.require_group(group_id).await?;
        if !group.is_member(user_id) {
            return Err(LedgerError::NotGroupMember(user_id.to_string()));
        }
        Ok(group)
    }

    async fn require_creator(&self, group_id: &str, user_id: &str) -> Result<Group, LedgerError> {
        let group = self.require_group(group_id).await?;
        if !group.is_creator(user_id) {
            return Err(LedgerError::NotGroupCreator(user_id.to_string()));
        }
        Ok(group)
    }

    // PROFILES

    pub async fn create_profile(&self, name: String, email: String) -> Result<Profile, LedgerError> {
        self.validate_string_input("name", &name, 100)?;
        let email = email.trim().to_lowercase();
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(LedgerError::InvalidInput(
                "email".to_string(),
                format!("{} is not a valid email address", email),
            ));
        }

        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            created_at: Utc::now(),
        };
        let created = self.storage.create_profile(profile).await?;

        self.log_and_audit(
            None,
            PROFILE_CREATED,
            json!({ "user_id": created.id, "email": created.email }),
            Some(&created.id),
        )
        .await?;

        Ok(created)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, LedgerError> {
        self.storage.get_profile(user_id).await
    }

    // GROUPS & MEMBERSHIP

    pub async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        created_by: &str,
    ) -> Result<Group, LedgerError> {
        self.validate_string_input("name", &name, 100)?;
        self.storage
            .get_profile(created_by)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(created_by.to_string()))?;

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_by: created_by.to_string(),
            member_ids: vec![created_by.to_string()],
            created_at: Utc::now(),
        };
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({ "group_id": group.id, "name": group.name }),
            Some(created_by),
        )
        .await?;

        Ok(group)
    }

    pub async fn get_group_details(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<(Group, Vec<Profile>), LedgerError> {
        let group = self.require_member(group_id, user_id).await?;
        let mut members = Vec::with_capacity(group.member_ids.len());
        for member_id in &group.member_ids {
            if let Some(profile) = self.storage.get_profile(member_id).await? {
                members.push(profile);
            }
        }
        Ok((group, members))
    }

    pub async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, LedgerError> {
        self.storage.get_user_groups(user_id).await
    }

    pub async fn add_member_by_email(
        &self,
        group_id: &str,
        email: &str,
        requested_by: &str,
    ) -> Result<Profile, LedgerError> {
        let mut group = self.require_creator(group_id, requested_by).await?;
        let profile = self
            .storage
            .get_profile_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(email.to_string()))?;

        if group.is_member(&profile.id) {
            return Err(LedgerError::AlreadyGroupMember(profile.id));
        }

        group.member_ids.push(profile.id.clone());
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            MEMBER_ADDED,
            json!({ "group_id": group_id, "user_id": profile.id, "email": profile.email }),
            Some(requested_by),
        )
        .await?;

        Ok(profile)
    }

    /// Removes a member. Allowed for the creator, or for a member removing
    /// themselves; the creator can never be removed.
    pub async fn remove_member(
        &self,
        group_id: &str,
        member_id: &str,
        requested_by: &str,
    ) -> Result<(), LedgerError> {
        let mut group = self.require_group(group_id).await?;
        if !group.is_creator(requested_by) && member_id != requested_by {
            return Err(LedgerError::NotGroupCreator(requested_by.to_string()));
        }
        if group.is_creator(member_id) {
            return Err(LedgerError::CreatorCannotBeRemoved);
        }
        if !group.is_member(member_id) {
            return Err(LedgerError::NotGroupMember(member_id.to_string()));
        }

        group.member_ids.retain(|id| id != member_id);
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            MEMBER_REMOVED,
            json!({ "group_id": group_id, "user_id": member_id }),
            Some(requested_by),
        )
        .await?;

        Ok(())
    }

    /// Deletes a group and everything it owns: memberships, expenses,
    /// balances and settlements.
    pub async fn delete_group(&self, group_id: &str, user_id: &str) -> Result<(), LedgerError> {
        let group = self.require_creator(group_id, user_id).await?;
        self.storage.delete_group(group_id).await?;

        self.log_and_audit(
            None,
            GROUP_DELETED,
            json!({ "group_id": group_id, "name": group.name }),
            Some(user_id),
        )
        .await?;

        Ok(())
    }

    // EXPENSES

    pub async fn add_expense(&self, input: AddExpenseInput) -> Result<ExpenseOutcome, LedgerError> {
        let group = self.require_group(&input.group_id).await?;
        if !group.is_member(&input.paid_by) {
            return Err(LedgerError::NotGroupMember(input.paid_by.clone()));
        }
        for participant_id in &input.participant_ids {
            if !group.is_member(participant_id) {
                return Err(LedgerError::NotGroupMember(participant_id.clone()));
            }
        }

        self.validate_string_input("description", &input.description, 255)?;
        let amount = self.validate_amount_input("amount", input.amount)?;
        let spec = self.build_split_spec(&input)?;
        let splits = split::calculate_split(amount, &input.participant_ids, &spec)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: input.group_id.clone(),
            description: input.description.clone(),
            amount,
            paid_by: input.paid_by.clone(),
            split_type: input.split_type,
            splits: splits.clone(),
            created_at: Utc::now(),
        };
        self.storage.save_expense(expense.clone()).await?;

        // The expense row is committed at this point. A failed ledger update
        // degrades the result instead of rolling the expense back.
        let lock = self.group_lock(&input.group_id).await;
        let _guard = lock.lock().await;
        let balances_updated = match self
            .apply_expense_splits(&input.group_id, &input.paid_by, &splits)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "expense {} recorded but balance update failed: {}",
                    expense.id, e
                );
                false
            }
        };

        self.log_and_audit(
            Some(&input.group_id),
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "group_id": input.group_id,
                "amount": amount,
                "paid_by": input.paid_by,
                "balances_updated": balances_updated,
            }),
            Some(&input.paid_by),
        )
        .await?;

        Ok(ExpenseOutcome {
            expense,
            balances_updated,
        })
    }

    fn build_split_spec(&self, input: &AddExpenseInput) -> Result<SplitSpec, LedgerError> {
        match input.split_type {
            SplitType::Equal => Ok(SplitSpec::Equal),
            SplitType::Exact => {
                let raw = input.custom_amounts.as_ref().ok_or_else(|| {
                    LedgerError::InvalidInput(
                        "custom_amounts".to_string(),
                        "exact split requires custom_amounts".to_string(),
                    )
                })?;
                let mut amounts = HashMap::with_capacity(raw.len());
                for (user_id, value) in raw {
                    let money = Money::from_major(*value).ok_or_else(|| {
                        LedgerError::InvalidAmount(format!("invalid amount for user {}", user_id))
                    })?;
                    amounts.insert(user_id.clone(), money);
                }
                Ok(SplitSpec::Exact(amounts))
            }
            SplitType::Percentage => {
                let raw = input.custom_percentages.as_ref().ok_or_else(|| {
                    LedgerError::InvalidInput(
                        "custom_percentages".to_string(),
                        "percentage split requires custom_percentages".to_string(),
                    )
                })?;
                Ok(SplitSpec::Percentage(raw.clone()))
            }
        }
    }

    /// Deletes an expense and reverses its effect on the ledger. Payer only.
    pub async fn delete_expense(&self, expense_id: &str, user_id: &str) -> Result<(), LedgerError> {
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?;
        if expense.paid_by != user_id {
            return Err(LedgerError::NotExpensePayer(user_id.to_string()));
        }

        self.storage.delete_expense(expense_id).await?;

        let lock = self.group_lock(&expense.group_id).await;
        let _guard = lock.lock().await;
        self.reverse_expense_splits(&expense.group_id, &expense.paid_by, &expense.splits)
            .await?;

        self.log_and_audit(
            Some(&expense.group_id),
            EXPENSE_DELETED,
            json!({ "expense_id": expense_id, "group_id": expense.group_id }),
            Some(user_id),
        )
        .await?;

        Ok(())
    }

    pub async fn get_group_expenses(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<Expense>, LedgerError> {
        self.require_member(group_id, user_id).await?;
        self.storage.get_group_expenses(group_id).await
    }

    // BALANCE LEDGER

    /// Increases balance(owner -> payer) for every split owner except the
    /// payer, then nets the group's reciprocal debts. Callers must hold the
    /// group lock.
    async fn apply_expense_splits(
        &self,
        group_id: &str,
        payer_id: &str,
        splits: &[ExpenseSplit],
    ) -> Result<(), LedgerError> {
        for split in splits {
            if split.user_id == payer_id {
                continue; // a payer never owes themselves
            }
            let balance = self
                .storage
                .get_or_create_balance(group_id, &split.user_id, payer_id)
                .await?;
            self.storage
                .update_balance_amount(&balance.id, balance.amount + split.amount)
                .await?;
        }

        self.net_group_balances(group_id).await
    }

    /// Inverse of `apply_expense_splits`, used on expense deletion. Each
    /// affected balance is decreased and floored at zero: netting or
    /// settlements may already have reduced the row below the split amount.
    async fn reverse_expense_splits(
        &self,
        group_id: &str,
        payer_id: &str,
        splits: &[ExpenseSplit],
    ) -> Result<(), LedgerError> {
        for split in splits {
            if split.user_id == payer_id {
                continue;
            }
            let balance = self
                .storage
                .get_or_create_balance(group_id, &split.user_id, payer_id)
                .await?;
            let new_amount = (balance.amount - split.amount).max(Money::ZERO);
            self.storage
                .update_balance_amount(&balance.id, new_amount)
                .await?;
        }
        Ok(())
    }

    /// Nets reciprocal debts within the group into canonical form.
    async fn net_group_balances(&self, group_id: &str) -> Result<(), LedgerError> {
        let rows = self.storage.get_group_balances(group_id).await?;
        for (balance_id, amount) in ledger::netting_adjustments(&rows) {
            self.storage
                .update_balance_amount(&balance_id, amount)
                .await?;
        }
        Ok(())
    }

    /// Snapshots the group's balance rows under the group lock.
    async fn snapshot_group_balances(&self, group_id: &str) -> Result<Vec<Balance>, LedgerError> {
        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;
        self.storage.get_group_balances(group_id).await
    }

    pub async fn get_group_balances(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<Balance>, LedgerError> {
        self.require_member(group_id, user_id).await?;
        let rows = self.snapshot_group_balances(group_id).await?;
        Ok(rows.into_iter().filter(|b| b.amount.is_positive()).collect())
    }

    pub async fn get_net_balances(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<NetBalance>, LedgerError> {
        let group = self.require_member(group_id, user_id).await?;
        let rows = self.snapshot_group_balances(group_id).await?;
        debug!("computing net balances for group {}", group_id);
        Ok(ledger::net_balances(&rows, &group.member_ids))
    }

    /// Derives the minimal-ish transfer plan for a group. Recomputed from the
    /// current balance rows on every call, never persisted.
    pub async fn get_simplified_debts(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<Transfer>, LedgerError> {
        let group = self.require_member(group_id, user_id).await?;
        let rows = self.snapshot_group_balances(group_id).await?;
        let nets = ledger::net_balances(&rows, &group.member_ids);
        Ok(ledger::simplify(&nets))
    }

    pub async fn get_user_balance_summary(
        &self,
        user_id: &str,
    ) -> Result<BalanceSummary, LedgerError> {
        let total_owing: Money = self
            .storage
            .get_debts(user_id)
            .await?
            .iter()
            .map(|b| b.amount)
            .sum();
        let total_owed: Money = self
            .storage
            .get_credits(user_id)
            .await?
            .iter()
            .map(|b| b.amount)
            .sum();
        Ok(BalanceSummary {
            total_owed,
            total_owing,
            net_balance: total_owed - total_owing,
        })
    }

    // SETTLEMENTS

    /// Records a real-world payment from `payer_id` to `payee_id` and reduces
    /// the matching debt. The settlement row is appended before the balance
    /// decrement; if the decrement then fails, the row is never retracted and
    /// the failure surfaces as a persistence error for manual reconciliation.
    pub async fn settle(
        &self,
        group_id: &str,
        payer_id: &str,
        payee_id: &str,
        amount: f64,
    ) -> Result<Settlement, LedgerError> {
        let group = self.require_group(group_id).await?;
        if payer_id == payee_id {
            return Err(LedgerError::SelfSettlement);
        }
        for user_id in [payer_id, payee_id] {
            if !group.is_member(user_id) {
                return Err(LedgerError::NotGroupMember(user_id.to_string()));
            }
        }
        let amount = self.validate_amount_input("amount", amount)?;

        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;

        let rows = self.storage.get_group_balances(group_id).await?;
        let balance = rows
            .into_iter()
            .find(|b| b.debtor_id == payer_id && b.creditor_id == payee_id && b.amount.is_positive())
            .ok_or_else(|| LedgerError::NoOutstandingDebt {
                payer: payer_id.to_string(),
                payee: payee_id.to_string(),
            })?;

        if amount > balance.amount {
            return Err(LedgerError::ExcessSettlementAmount {
                outstanding: balance.amount,
            });
        }

        let settlement = Settlement {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            payer_id: payer_id.to_string(),
            payee_id: payee_id.to_string(),
            amount,
            created_at: Utc::now(),
        };
        self.storage.save_settlement(settlement.clone()).await?;

        let mut remaining = balance.amount - amount;
        if remaining.cents() <= SPLIT_TOLERANCE_CENTS {
            remaining = Money::ZERO;
        }
        self.storage
            .update_balance_amount(&balance.id, remaining)
            .await
            .map_err(|e| {
                LedgerError::Persistence(format!(
                    "settlement {} recorded but balance update failed: {}",
                    settlement.id, e
                ))
            })?;

        self.log_and_audit(
            Some(group_id),
            SETTLEMENT_RECORDED,
            json!({
                "settlement_id": settlement.id,
                "group_id": group_id,
                "payer_id": payer_id,
                "payee_id": payee_id,
                "amount": amount,
            }),
            Some(payer_id),
        )
        .await?;

        Ok(settlement)
    }

    pub async fn get_group_settlements(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<Settlement>, LedgerError> {
        self.require_member(group_id, user_id).await?;
        self.storage.get_group_settlements(group_id).await
    }

    pub async fn get_user_settlements(&self, user_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        self.storage.get_user_settlements(user_id).await
    }

    // OBSERVABILITY

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        self.require_group(group_id).await?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }
}
