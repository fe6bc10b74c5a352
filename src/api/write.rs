//! Mutating operations against the remote (§4.8). Never mutates replica arrays
//! directly — a successful write only flips `needs_sync`, leaving the next read to
//! pull the authoritative state via a delta sync.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Account, Milliunits, MonthCategory, Subtransaction, Transaction};
use crate::errors::SyncError;
use crate::orchestrator::SyncOrchestrator;

pub struct WriteApi<'a> {
    orchestrator: &'a SyncOrchestrator,
    read_only: bool,
}

impl<'a> WriteApi<'a> {
    pub fn new(orchestrator: &'a SyncOrchestrator, read_only: bool) -> Self {
        Self {
            orchestrator,
            read_only,
        }
    }

    fn guard(&self, operation: &str) -> Result<(), SyncError> {
        if self.read_only {
            tracing::warn!(operation, "write blocked: replica is read-only");
            return Err(SyncError::ReadOnlyBlocked {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    /// Creates a transaction, optionally as a split with sub-transactions.
    pub async fn create_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<(Transaction, Vec<Subtransaction>), SyncError> {
        self.guard("create_transaction")?;
        let requested_account_id = transaction.account_id;
        let result = self
            .orchestrator
            .provider()
            .create_transaction(budget_id, transaction, subtransactions)
            .await?;

        if result.transaction.account_id != requested_account_id {
            return Err(SyncError::MutationValidation(
                "created transaction's account_id does not match the request".into(),
            ));
        }

        self.orchestrator.mark_needs_sync(budget_id).await;
        Ok((result.transaction, result.subtransactions))
    }

    /// Updates a transaction, replacing its sub-transactions with the supplied set.
    pub async fn update_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<(Transaction, Vec<Subtransaction>), SyncError> {
        self.guard("update_transaction")?;
        let requested_id = transaction.id;
        let result = self
            .orchestrator
            .provider()
            .update_transaction(budget_id, transaction, subtransactions)
            .await?;

        if result.transaction.id != requested_id {
            return Err(SyncError::MutationValidation(format!(
                "provider returned transaction {} for a request against {}",
                result.transaction.id, requested_id
            )));
        }

        self.orchestrator.mark_needs_sync(budget_id).await;
        Ok((result.transaction, result.subtransactions))
    }

    /// Deletes a transaction by updating it with `deleted=true` and validating the
    /// provider echoes back the same id (§7 `MutationValidation`, §8 test 10).
    pub async fn delete_transaction(
        &self,
        budget_id: Uuid,
        mut transaction: Transaction,
    ) -> Result<(), SyncError> {
        self.guard("delete_transaction")?;
        let requested_id = transaction.id;
        transaction.deleted = true;
        let result = self
            .orchestrator
            .provider()
            .update_transaction(budget_id, transaction, Vec::new())
            .await?;

        if result.transaction.id != requested_id {
            return Err(SyncError::MutationValidation(format!(
                "provider returned id {} for a delete requested against {}",
                result.transaction.id, requested_id
            )));
        }

        self.orchestrator.mark_needs_sync(budget_id).await;
        Ok(())
    }

    /// Bulk-imports transactions, deduplicating by `import_id`. Validates that every
    /// requested transaction is accounted for as either created or a reported
    /// duplicate (§4.8: "returned count + duplicate-import count must equal
    /// requested count").
    pub async fn import_transactions(
        &self,
        budget_id: Uuid,
        transactions: Vec<Transaction>,
    ) -> Result<crate::provider::ImportResult, SyncError> {
        self.guard("import_transactions")?;
        let requested_count = transactions.len();
        let result = self
            .orchestrator
            .provider()
            .import_transactions(budget_id, transactions)
            .await?;

        let accounted_for = result.created.len() + result.duplicate_import_ids.len();
        if accounted_for != requested_count {
            return Err(SyncError::MutationValidation(format!(
                "import accounted for {accounted_for} of {requested_count} requested transactions"
            )));
        }

        self.orchestrator.mark_needs_sync(budget_id).await;
        Ok(result)
    }

    /// Creates a new account, validating the provider echoes the requested name and
    /// type back (§4.8 "returned name and type must equal requested").
    pub async fn create_account(&self, budget_id: Uuid, account: Account) -> Result<Account, SyncError> {
        self.guard("create_account")?;
        let requested_name = account.name.clone();
        let requested_type = account.account_type;
        let created = self.orchestrator.provider().create_account(budget_id, account).await?;

        if created.name != requested_name || created.account_type != requested_type {
            return Err(SyncError::MutationValidation(
                "created account's name or type does not match the request".into(),
            ));
        }

        self.orchestrator.mark_needs_sync(budget_id).await;
        Ok(created)
    }

    /// Updates a category's budgeted amount for one month.
    pub async fn update_category_budgeted(
        &self,
        budget_id: Uuid,
        month: NaiveDate,
        category_id: Uuid,
        budgeted: Milliunits,
    ) -> Result<MonthCategory, SyncError> {
        self.guard("update_category_budgeted")?;
        let updated = self
            .orchestrator
            .provider()
            .update_category_budgeted(budget_id, month, category_id, budgeted)
            .await?;

        if updated.id != category_id {
            return Err(SyncError::MutationValidation(format!(
                "provider returned category {} for a request against {}",
                updated.id, category_id
            )));
        }

        self.orchestrator.mark_needs_sync(budget_id).await;
        Ok(updated)
    }
}
