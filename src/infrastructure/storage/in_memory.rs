use crate::core::errors::LedgerError;
use crate::core::models::{Balance, Expense, Group, GroupAudit, Profile, Settlement};
use crate::core::money::Money;
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct InMemoryStorage {
    profiles: Mutex<HashMap<String, Profile>>,
    emails: Mutex<HashMap<String, String>>, // email -> user_id
    groups: Mutex<HashMap<String, Group>>,
    expenses: Mutex<HashMap<String, Expense>>,
    balances: Mutex<HashMap<String, Balance>>, // balance_id -> row
    settlements: Mutex<Vec<Settlement>>,
    group_audits: Mutex<HashMap<String, Vec<GroupAudit>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            profiles: Mutex::new(HashMap::new()),
            emails: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            expenses: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            settlements: Mutex::new(Vec::new()),
            group_audits: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_profile(&self, profile: Profile) -> Result<Profile, LedgerError> {
        let mut emails = self.emails.lock().await;
        if emails.contains_key(&profile.email) {
            return Err(LedgerError::EmailAlreadyRegistered(profile.email));
        }
        emails.insert(profile.email.clone(), profile.id.clone());
        let mut profiles = self.profiles.lock().await;
        profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, LedgerError> {
        Ok(self.profiles.lock().await.get(user_id).cloned())
    }

    async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>, LedgerError> {
        // For production: use a database index on email
        let user_id = self.emails.lock().await.get(email).cloned();
        Ok(match user_id {
            Some(id) => self.profiles.lock().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn save_group(&self, group: Group) -> Result<(), LedgerError> {
        self.groups.lock().await.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        Ok(self.groups.lock().await.get(group_id).cloned())
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError> {
        self.groups.lock().await.remove(group_id);
        self.expenses
            .lock()
            .await
            .retain(|_, e| e.group_id != group_id);
        self.balances
            .lock()
            .await
            .retain(|_, b| b.group_id != group_id);
        self.settlements
            .lock()
            .await
            .retain(|s| s.group_id != group_id);
        self.group_audits.lock().await.remove(group_id);
        Ok(())
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, LedgerError> {
        let mut groups: Vec<Group> = self
            .groups
            .lock()
            .await
            .values()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(groups)
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        self.expenses
            .lock()
            .await
            .insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        Ok(self.expenses.lock().await.get(expense_id).cloned())
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<(), LedgerError> {
        self.expenses.lock().await.remove(expense_id);
        Ok(())
    }

    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .lock()
            .await
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(expenses)
    }

    async fn get_or_create_balance(
        &self,
        group_id: &str,
        debtor_id: &str,
        creditor_id: &str,
    ) -> Result<Balance, LedgerError> {
        let mut balances = self.balances.lock().await;
        if let Some(existing) = balances.values().find(|b| {
            b.group_id == group_id && b.debtor_id == debtor_id && b.creditor_id == creditor_id
        }) {
            return Ok(existing.clone());
        }
        let balance = Balance {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            debtor_id: debtor_id.to_string(),
            creditor_id: creditor_id.to_string(),
            amount: Money::ZERO,
        };
        balances.insert(balance.id.clone(), balance.clone());
        Ok(balance)
    }

    async fn update_balance_amount(
        &self,
        balance_id: &str,
        amount: Money,
    ) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock().await;
        let balance = balances
            .get_mut(balance_id)
            .ok_or_else(|| LedgerError::Persistence(format!("balance {} not found", balance_id)))?;
        balance.amount = amount;
        Ok(())
    }

    async fn get_group_balances(&self, group_id: &str) -> Result<Vec<Balance>, LedgerError> {
        let mut rows: Vec<Balance> = self
            .balances
            .lock()
            .await
            .values()
            .filter(|b| b.group_id == group_id)
            .cloned()
            .collect();
        // Deterministic order for netting and simplification
        rows.sort_by(|a, b| (&a.debtor_id, &a.creditor_id).cmp(&(&b.debtor_id, &b.creditor_id)));
        Ok(rows)
    }

    async fn get_debts(&self, user_id: &str) -> Result<Vec<Balance>, LedgerError> {
        Ok(self
            .balances
            .lock()
            .await
            .values()
            .filter(|b| b.debtor_id == user_id && b.amount.is_positive())
            .cloned()
            .collect())
    }

    async fn get_credits(&self, user_id: &str) -> Result<Vec<Balance>, LedgerError> {
        Ok(self
            .balances
            .lock()
            .await
            .values()
            .filter(|b| b.creditor_id == user_id && b.amount.is_positive())
            .cloned()
            .collect())
    }

    async fn save_settlement(&self, settlement: Settlement) -> Result<(), LedgerError> {
        self.settlements.lock().await.push(settlement);
        Ok(())
    }

    async fn get_group_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        Ok(self
            .settlements
            .lock()
            .await
            .iter()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn get_user_settlements(&self, user_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        Ok(self
            .settlements
            .lock()
            .await
            .iter()
            .filter(|s| s.payer_id == user_id || s.payee_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), LedgerError> {
        let mut audits = self.group_audits.lock().await;
        audits
            .entry(audit.group_id.clone())
            .or_insert_with(Vec::new)
            .push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        Ok(self
            .group_audits
            .lock()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }
}
