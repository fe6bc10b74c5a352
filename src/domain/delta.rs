//! Wire-contract types as consumed from the remote budget API. These mirror the
//! per-entity response envelopes used across this ecosystem's YNAB clients: a `data`
//! wrapper carrying the entity arrays plus a `server_knowledge` cursor.

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

/// A full or delta budget payload as returned by `SyncProvider::full_sync` /
/// `delta_sync`. For a delta, every array contains only the entities that changed
/// since the supplied cursor; removals are present with `deleted: true`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BudgetPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency_format: Option<CurrencyFormat>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub category_groups: Vec<CategoryGroup>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub payees: Vec<Payee>,
    #[serde(default)]
    pub payee_locations: Vec<PayeeLocation>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub subtransactions: Vec<Subtransaction>,
    #[serde(default)]
    pub scheduled_transactions: Vec<ScheduledTransaction>,
    #[serde(default)]
    pub scheduled_subtransactions: Vec<ScheduledSubtransaction>,
    #[serde(default)]
    pub months: Vec<Month>,
}

/// Envelope returned by `SyncProvider` operations: the payload plus the cursor the
/// remote reports as current after this fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub budget: BudgetPayload,
    pub server_knowledge: i64,
}

/// Identifies which kind of sync produced a [`SyncResponse`], used by the sync
/// history store and the orchestrator's decision trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Full,
    Delta,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Full => "full",
            SyncKind::Delta => "delta",
        }
    }
}

/// Minimal listing entry used by the budget selector resolver (§4.6) to enumerate
/// the budgets a token can see without pulling a full payload for each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetListEntry {
    pub id: Uuid,
    pub name: String,
}
