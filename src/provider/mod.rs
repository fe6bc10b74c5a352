//! Abstraction over how budget data is fetched and mutated remotely (§4.3, §6).
//!
//! `SyncOrchestrator` never talks to `reqwest` directly; it only ever sees a
//! `dyn SyncProvider`, which keeps the merge/drift/orchestrator layers testable against
//! [`static_snapshot::StaticSnapshotProvider`] without a network.

pub mod remote;
pub mod static_snapshot;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Account, BudgetListEntry, Milliunits, MonthCategory, Subtransaction, SyncResponse, Transaction};
use crate::errors::SyncError;

/// Result of a provider write that may carry split sub-transactions alongside the
/// parent (§4.8 "including split sub-transactions").
#[derive(Debug, Clone)]
pub struct TransactionWrite {
    pub transaction: Transaction,
    pub subtransactions: Vec<Subtransaction>,
}

/// Result of a bulk import. `import_id` matches against transactions the provider
/// already held are reported as duplicates rather than created again (§4.8: "returned
/// count + duplicate-import count must equal requested count").
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub created: Vec<Transaction>,
    pub duplicate_import_ids: Vec<String>,
}

/// What a write call should request of the remote in response to local drift or a
/// caller override (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceSync {
    /// Use whatever the orchestrator's decision table would normally pick.
    Auto,
    /// Force a full resync regardless of elapsed time or cursor state.
    Full,
    /// Force a delta sync regardless of elapsed time or the `needs_sync` flag.
    Delta,
}

/// Source of truth this crate's replica is kept in sync with. Implementations may be
/// a live HTTP budget API ([`remote::RemoteProvider`]) or a fixed in-memory fixture
/// ([`static_snapshot::StaticSnapshotProvider`]) for tests and read-only demo modes.
#[async_trait]
pub trait SyncProvider: Send + Sync {
    /// Lists every budget the provider's credentials can see (§4.6 selector support).
    async fn list_budgets(&self) -> Result<Vec<BudgetListEntry>, SyncError>;

    /// Fetches the entire budget from scratch, ignoring any prior cursor.
    async fn full_sync(&self, budget_id: Uuid) -> Result<SyncResponse, SyncError>;

    /// Fetches only what changed since `server_knowledge`. Implementations that can't
    /// distinguish "nothing changed" from "empty delta" should still return an empty
    /// payload with the same cursor rather than erroring.
    async fn delta_sync(
        &self,
        budget_id: Uuid,
        server_knowledge: i64,
    ) -> Result<SyncResponse, SyncError>;

    /// Submits a new transaction, optionally as a split with sub-transactions.
    /// Returns the provider's canonical representation of what it created so the
    /// caller can validate it against what was requested (§4.8 `MutationValidation`).
    async fn create_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError>;

    /// Updates an existing transaction, returning the provider's canonical result.
    async fn update_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError>;

    /// Bulk-imports transactions, deduplicating against `import_id` the provider has
    /// already seen. Returns the transactions actually created plus the import ids
    /// that were recognized as duplicates and skipped (§4.8 import-count invariant).
    async fn import_transactions(
        &self,
        budget_id: Uuid,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, SyncError>;

    /// Creates a new account. Returns the provider's canonical representation so the
    /// caller can validate name/type against the request.
    async fn create_account(&self, budget_id: Uuid, account: Account) -> Result<Account, SyncError>;

    /// Updates a category's budgeted amount for one month, returning the provider's
    /// canonical month-category snapshot.
    async fn update_category_budgeted(
        &self,
        budget_id: Uuid,
        month: NaiveDate,
        category_id: Uuid,
        budgeted: Milliunits,
    ) -> Result<MonthCategory, SyncError>;

    /// Whether this provider accepts writes at all. `false` for fixed snapshots used
    /// in read-only or demo contexts (§4.8 `StaticModeWrite`).
    fn supports_writes(&self) -> bool {
        true
    }
}
