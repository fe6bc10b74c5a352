use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    account::Account,
    category::{Category, CategoryGroup},
    common::CurrencyFormat,
    month::Month,
    payee::{Payee, PayeeLocation},
    scheduled::{ScheduledSubtransaction, ScheduledTransaction},
    transaction::{Subtransaction, Transaction},
};

/// Top-level budget metadata as reported by the remote, independent of its replica.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub currency_format: CurrencyFormat,
}

/// Indexes derived from a [`LocalBudget`]'s entity arrays. Rebuilt wholesale after
/// every merge (§3, §4.2) — never mutated incrementally alongside the arrays.
#[derive(Debug, Clone, Default)]
pub struct Indexes {
    pub account_by_id: HashMap<Uuid, usize>,
    pub account_by_lower_name: HashMap<String, Uuid>,
    pub category_by_id: HashMap<Uuid, usize>,
    pub category_by_lower_name: HashMap<String, Uuid>,
    pub category_group_name_by_category_id: HashMap<Uuid, String>,
    pub payee_by_id: HashMap<Uuid, usize>,
    pub payee_by_lower_name: HashMap<String, Uuid>,
    pub subtransactions_by_parent: HashMap<Uuid, Vec<usize>>,
    pub scheduled_subtransactions_by_parent: HashMap<Uuid, Vec<usize>>,
}

/// The in-memory replica of one budget: entity arrays, derived indexes, and sync
/// metadata. Mutated only through `crate::merge::merge_delta` / the orchestrator's
/// full-sync installation path; writes never touch this struct directly (§3, §4.8).
#[derive(Debug, Clone)]
pub struct LocalBudget {
    pub id: Uuid,
    pub name: String,
    pub currency_format: CurrencyFormat,

    pub accounts: Vec<Account>,
    pub category_groups: Vec<CategoryGroup>,
    pub categories: Vec<Category>,
    pub payees: Vec<Payee>,
    pub payee_locations: Vec<PayeeLocation>,
    pub transactions: Vec<Transaction>,
    pub subtransactions: Vec<Subtransaction>,
    pub scheduled_transactions: Vec<ScheduledTransaction>,
    pub scheduled_subtransactions: Vec<ScheduledSubtransaction>,
    pub months: Vec<Month>,

    pub server_knowledge: i64,
    pub last_synced_at: DateTime<Utc>,
    pub needs_sync: bool,

    pub indexes: Indexes,
}

impl LocalBudget {
    /// Builds an empty replica for `budget_id`/`name` with no server knowledge yet.
    /// Used only as scaffolding before the first full sync installs real data.
    pub fn empty(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            currency_format: CurrencyFormat::default(),
            accounts: Vec::new(),
            category_groups: Vec::new(),
            categories: Vec::new(),
            payees: Vec::new(),
            payee_locations: Vec::new(),
            transactions: Vec::new(),
            subtransactions: Vec::new(),
            scheduled_transactions: Vec::new(),
            scheduled_subtransactions: Vec::new(),
            months: Vec::new(),
            server_knowledge: 0,
            last_synced_at: Utc::now(),
            needs_sync: false,
            indexes: Indexes::default(),
        }
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.indexes.account_by_id.get(&id).map(|&idx| &self.accounts[idx])
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.indexes.category_by_id.get(&id).map(|&idx| &self.categories[idx])
    }

    pub fn payee(&self, id: Uuid) -> Option<&Payee> {
        self.indexes.payee_by_id.get(&id).map(|&idx| &self.payees[idx])
    }

    pub fn category_group_name(&self, category_id: Uuid) -> Option<&str> {
        self.indexes
            .category_group_name_by_category_id
            .get(&category_id)
            .map(|s| s.as_str())
    }

    pub fn subtransactions_of(&self, transaction_id: Uuid) -> Vec<&Subtransaction> {
        self.indexes
            .subtransactions_by_parent
            .get(&transaction_id)
            .map(|indices| indices.iter().map(|&idx| &self.subtransactions[idx]).collect())
            .unwrap_or_default()
    }

    pub fn scheduled_subtransactions_of(&self, scheduled_transaction_id: Uuid) -> Vec<&ScheduledSubtransaction> {
        self.indexes
            .scheduled_subtransactions_by_parent
            .get(&scheduled_transaction_id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&idx| &self.scheduled_subtransactions[idx])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn month(&self, key: chrono::NaiveDate) -> Option<&Month> {
        self.months.iter().find(|m| m.key() == key)
    }

    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        self.indexes
            .account_by_lower_name
            .get(&name.to_lowercase())
            .and_then(|id| self.account(*id))
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.indexes
            .category_by_lower_name
            .get(&name.to_lowercase())
            .and_then(|id| self.category(*id))
    }

    pub fn payee_by_name(&self, name: &str) -> Option<&Payee> {
        self.indexes
            .payee_by_lower_name
            .get(&name.to_lowercase())
            .and_then(|id| self.payee(*id))
    }
}
