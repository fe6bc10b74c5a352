use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;
use uuid::Uuid;
use ynab_sync_core::domain::{
    Account, BudgetListEntry, BudgetPayload, Milliunits, MonthCategory, Subtransaction, SyncResponse,
    Transaction,
};
use ynab_sync_core::errors::SyncError;
use ynab_sync_core::provider::{ImportResult, SyncProvider, TransactionWrite};

/// A stateful, writable provider double: `full_sync` always returns the full frozen
/// payload under `full`, `delta_sync` returns whatever has been queued in `pending`
/// (and drains it). Writes update `full` and also fold themselves into the pending
/// delta, the way a real provider's next delta sync would report a write it just
/// accepted.
pub struct MockProvider {
    budget_id: Uuid,
    state: Mutex<MockState>,
}

struct MockState {
    full: BudgetPayload,
    pending_delta: Option<BudgetPayload>,
    server_knowledge: i64,
}

impl MockProvider {
    pub fn new(budget_id: Uuid, full: BudgetPayload, server_knowledge: i64) -> Self {
        Self {
            budget_id,
            state: Mutex::new(MockState {
                full,
                pending_delta: None,
                server_knowledge,
            }),
        }
    }

    /// Queues a delta payload and bumps the cursor, simulating a remote change that
    /// the next `delta_sync` call will report.
    pub fn queue_delta(&self, delta: BudgetPayload) {
        let mut state = self.state.lock().unwrap();
        state.server_knowledge += 1;
        state.pending_delta = Some(delta);
    }

    /// Directly mutates the frozen full-sync snapshot without bumping the cursor,
    /// simulating an out-of-band remote edit a delta sync won't report (drift).
    pub fn mutate_full_silently(&self, f: impl FnOnce(&mut BudgetPayload)) {
        let mut state = self.state.lock().unwrap();
        f(&mut state.full);
    }

    /// Folds a write into the pending delta and bumps the cursor, so the next
    /// `delta_sync` call reports it the way a real provider would report a write it
    /// just accepted.
    fn queue_write_delta(state: &mut MockState, f: impl FnOnce(&mut BudgetPayload)) {
        state.server_knowledge += 1;
        let mut delta = state.pending_delta.take().unwrap_or_default();
        f(&mut delta);
        state.pending_delta = Some(delta);
    }
}

#[async_trait]
impl SyncProvider for MockProvider {
    async fn list_budgets(&self) -> Result<Vec<BudgetListEntry>, SyncError> {
        Ok(vec![BudgetListEntry {
            id: self.budget_id,
            name: "Household".into(),
        }])
    }

    async fn full_sync(&self, budget_id: Uuid) -> Result<SyncResponse, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let state = self.state.lock().unwrap();
        Ok(SyncResponse {
            budget: state.full.clone(),
            server_knowledge: state.server_knowledge,
        })
    }

    async fn delta_sync(
        &self,
        budget_id: Uuid,
        _server_knowledge: i64,
    ) -> Result<SyncResponse, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let delta = state.pending_delta.take().unwrap_or_default();
        Ok(SyncResponse {
            budget: delta,
            server_knowledge: state.server_knowledge,
        })
    }

    async fn create_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.full.transactions.push(transaction.clone());
        state.full.subtransactions.extend(subtransactions.clone());
        Self::queue_write_delta(&mut state, |delta| {
            delta.transactions.push(transaction.clone());
            delta.subtransactions.extend(subtransactions.clone());
        });
        Ok(TransactionWrite {
            transaction,
            subtransactions,
        })
    }

    async fn update_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .full
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction.id)
        {
            *existing = transaction.clone();
        } else {
            state.full.transactions.push(transaction.clone());
        }
        Self::queue_write_delta(&mut state, |delta| {
            delta.transactions.push(transaction.clone());
            delta.subtransactions.extend(subtransactions.clone());
        });
        Ok(TransactionWrite {
            transaction,
            subtransactions,
        })
    }

    async fn import_transactions(
        &self,
        budget_id: Uuid,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.full.transactions.extend(transactions.clone());
        Self::queue_write_delta(&mut state, |delta| {
            delta.transactions.extend(transactions.clone());
        });
        Ok(ImportResult {
            created: transactions,
            duplicate_import_ids: Vec::new(),
        })
    }

    async fn create_account(&self, budget_id: Uuid, account: Account) -> Result<Account, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.full.accounts.push(account.clone());
        Self::queue_write_delta(&mut state, |delta| {
            delta.accounts.push(account.clone());
        });
        Ok(account)
    }

    async fn update_category_budgeted(
        &self,
        budget_id: Uuid,
        month: NaiveDate,
        category_id: Uuid,
        budgeted: Milliunits,
    ) -> Result<MonthCategory, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let month_entry = state
            .full
            .months
            .iter_mut()
            .find(|m| m.month == month)
            .ok_or_else(|| SyncError::ProviderNotFound(format!("no month {month}")))?;
        let category = month_entry
            .categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| SyncError::ProviderNotFound(format!("no category {category_id}")))?;
        category.budgeted = budgeted;
        let updated_category = category.clone();
        let updated_month = month_entry.clone();

        Self::queue_write_delta(&mut state, |delta| {
            delta.months.push(updated_month);
        });
        Ok(updated_category)
    }
}

pub fn temp_config_root() -> TempDir {
    TempDir::new().expect("create temp config root")
}
