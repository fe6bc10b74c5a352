//! A fixed, in-memory `SyncProvider` used for read-only/demo configurations and
//! tests (§4.3, §4.8 `StaticModeWrite`). Never performs I/O; `full_sync` and
//! `delta_sync` both return the same frozen payload regardless of cursor.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Account, BudgetListEntry, BudgetPayload, Milliunits, MonthCategory, Subtransaction, SyncResponse, Transaction};
use crate::errors::SyncError;

use super::{ImportResult, SyncProvider, TransactionWrite};

/// Serves one fixed budget snapshot forever. Writes always fail with
/// [`SyncError::StaticModeWrite`].
pub struct StaticSnapshotProvider {
    listing: Vec<BudgetListEntry>,
    budget_id: Uuid,
    payload: BudgetPayload,
    server_knowledge: i64,
}

impl StaticSnapshotProvider {
    pub fn new(budget_id: Uuid, name: impl Into<String>, payload: BudgetPayload, server_knowledge: i64) -> Self {
        let name = name.into();
        Self {
            listing: vec![BudgetListEntry {
                id: budget_id,
                name,
            }],
            budget_id,
            payload,
            server_knowledge,
        }
    }
}

#[async_trait]
impl SyncProvider for StaticSnapshotProvider {
    async fn list_budgets(&self) -> Result<Vec<BudgetListEntry>, SyncError> {
        Ok(self.listing.clone())
    }

    async fn full_sync(&self, budget_id: Uuid) -> Result<SyncResponse, SyncError> {
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        Ok(SyncResponse {
            budget: self.payload.clone(),
            server_knowledge: self.server_knowledge,
        })
    }

    async fn delta_sync(
        &self,
        budget_id: Uuid,
        _server_knowledge: i64,
    ) -> Result<SyncResponse, SyncError> {
        // A static snapshot has nothing "new" to report; an empty delta at the
        // frozen cursor satisfies the no-op branch of the orchestrator's decision
        // table without violating cursor monotonicity.
        if budget_id != self.budget_id {
            return Err(SyncError::ProviderNotFound(budget_id.to_string()));
        }
        Ok(SyncResponse {
            budget: BudgetPayload::default(),
            server_knowledge: self.server_knowledge,
        })
    }

    async fn create_transaction(
        &self,
        _budget_id: Uuid,
        _transaction: Transaction,
        _subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError> {
        Err(SyncError::StaticModeWrite)
    }

    async fn update_transaction(
        &self,
        _budget_id: Uuid,
        _transaction: Transaction,
        _subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError> {
        Err(SyncError::StaticModeWrite)
    }

    async fn import_transactions(
        &self,
        _budget_id: Uuid,
        _transactions: Vec<Transaction>,
    ) -> Result<ImportResult, SyncError> {
        Err(SyncError::StaticModeWrite)
    }

    async fn create_account(&self, _budget_id: Uuid, _account: Account) -> Result<Account, SyncError> {
        Err(SyncError::StaticModeWrite)
    }

    async fn update_category_budgeted(
        &self,
        _budget_id: Uuid,
        _month: NaiveDate,
        _category_id: Uuid,
        _budgeted: Milliunits,
    ) -> Result<MonthCategory, SyncError> {
        Err(SyncError::StaticModeWrite)
    }

    fn supports_writes(&self) -> bool {
        false
    }
}
