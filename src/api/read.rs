//! Read accessors: resolve → ensure-synced → project-via-indexes → enrich (§4.7).

use uuid::Uuid;

use crate::domain::{LocalBudget, Month};
use crate::errors::SyncError;
use crate::orchestrator::SyncOrchestrator;
use crate::provider::ForceSync;

/// A transaction joined with the human-readable names its ids point at, plus a
/// currency-scaled amount (§3 invariant 6, §4.7).
#[derive(Debug, Clone)]
pub struct EnrichedTransaction {
    pub id: Uuid,
    pub date: chrono::NaiveDate,
    pub amount_milliunits: i64,
    pub amount_scaled: f64,
    pub memo: Option<String>,
    pub account_name: Option<String>,
    pub payee_name: Option<String>,
    pub category_name: Option<String>,
    pub category_group_name: Option<String>,
    pub subtransactions: Vec<EnrichedSubtransaction>,
}

#[derive(Debug, Clone)]
pub struct EnrichedSubtransaction {
    pub id: Uuid,
    pub amount_milliunits: i64,
    pub amount_scaled: f64,
    pub category_name: Option<String>,
    pub payee_name: Option<String>,
}

/// A scheduled transaction joined with its account/payee/category names, analogous
/// to [`EnrichedTransaction`] (§2 Read API).
#[derive(Debug, Clone)]
pub struct EnrichedScheduledTransaction {
    pub id: Uuid,
    pub date_next: chrono::NaiveDate,
    pub frequency: crate::domain::Frequency,
    pub amount_milliunits: i64,
    pub amount_scaled: f64,
    pub memo: Option<String>,
    pub account_name: Option<String>,
    pub payee_name: Option<String>,
    pub category_name: Option<String>,
    pub subtransactions: Vec<EnrichedSubtransaction>,
}

/// Typed read accessors over a synced replica (§4.7).
pub struct ReadApi<'a> {
    orchestrator: &'a SyncOrchestrator,
}

impl<'a> ReadApi<'a> {
    pub fn new(orchestrator: &'a SyncOrchestrator) -> Self {
        Self { orchestrator }
    }

    async fn synced(&self, budget_id: Uuid) -> Result<LocalBudget, SyncError> {
        self.orchestrator
            .get_local_budget_with_sync(budget_id, ForceSync::Auto)
            .await
    }

    pub async fn accounts(
        &self,
        budget_id: Uuid,
    ) -> Result<Vec<crate::domain::Account>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local.accounts.clone())
    }

    pub async fn categories(
        &self,
        budget_id: Uuid,
    ) -> Result<Vec<crate::domain::Category>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local.categories.clone())
    }

    pub async fn payees(&self, budget_id: Uuid) -> Result<Vec<crate::domain::Payee>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local.payees.clone())
    }

    pub async fn month(
        &self,
        budget_id: Uuid,
        key: chrono::NaiveDate,
    ) -> Result<Option<Month>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local.month(key).cloned())
    }

    pub async fn transactions(
        &self,
        budget_id: Uuid,
    ) -> Result<Vec<EnrichedTransaction>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local
            .transactions
            .iter()
            .map(|t| enrich_transaction(&local, t))
            .collect())
    }

    pub async fn transaction(
        &self,
        budget_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<EnrichedTransaction>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .map(|t| enrich_transaction(&local, t)))
    }

    pub async fn scheduled_transactions(
        &self,
        budget_id: Uuid,
    ) -> Result<Vec<EnrichedScheduledTransaction>, SyncError> {
        let local = self.synced(budget_id).await?;
        Ok(local
            .scheduled_transactions
            .iter()
            .map(|s| enrich_scheduled_transaction(&local, s))
            .collect())
    }
}

fn enrich_transaction(
    local: &LocalBudget,
    transaction: &crate::domain::Transaction,
) -> EnrichedTransaction {
    let account_name = local.account(transaction.account_id).map(|a| a.name.clone());
    let payee_name = transaction
        .payee_id
        .and_then(|id| local.payee(id))
        .map(|p| p.name.clone());
    let category_name = transaction
        .category_id
        .and_then(|id| local.category(id))
        .map(|c| c.name.clone());
    let category_group_name = transaction
        .category_id
        .and_then(|id| local.category_group_name(id))
        .map(|s| s.to_string());

    let subtransactions = local
        .subtransactions_of(transaction.id)
        .into_iter()
        .map(|sub| enrich_subtransaction(local, sub))
        .collect();

    EnrichedTransaction {
        id: transaction.id,
        date: transaction.date,
        amount_milliunits: transaction.amount,
        amount_scaled: local.currency_format.to_scaled(transaction.amount),
        memo: transaction.memo.clone(),
        account_name,
        payee_name,
        category_name,
        category_group_name,
        subtransactions,
    }
}

fn enrich_scheduled_transaction(
    local: &LocalBudget,
    scheduled: &crate::domain::ScheduledTransaction,
) -> EnrichedScheduledTransaction {
    let account_name = local.account(scheduled.account_id).map(|a| a.name.clone());
    let payee_name = scheduled
        .payee_id
        .and_then(|id| local.payee(id))
        .map(|p| p.name.clone());
    let category_name = scheduled
        .category_id
        .and_then(|id| local.category(id))
        .map(|c| c.name.clone());

    let subtransactions = local
        .scheduled_subtransactions_of(scheduled.id)
        .into_iter()
        .map(|sub| EnrichedSubtransaction {
            id: sub.id,
            amount_milliunits: sub.amount,
            amount_scaled: local.currency_format.to_scaled(sub.amount),
            category_name: sub.category_id.and_then(|id| local.category(id)).map(|c| c.name.clone()),
            payee_name: sub.payee_id.and_then(|id| local.payee(id)).map(|p| p.name.clone()),
        })
        .collect();

    EnrichedScheduledTransaction {
        id: scheduled.id,
        date_next: scheduled.date_next,
        frequency: scheduled.frequency,
        amount_milliunits: scheduled.amount,
        amount_scaled: local.currency_format.to_scaled(scheduled.amount),
        memo: scheduled.memo.clone(),
        account_name,
        payee_name,
        category_name,
        subtransactions,
    }
}

fn enrich_subtransaction(
    local: &LocalBudget,
    sub: &crate::domain::Subtransaction,
) -> EnrichedSubtransaction {
    EnrichedSubtransaction {
        id: sub.id,
        amount_milliunits: sub.amount,
        amount_scaled: local.currency_format.to_scaled(sub.amount),
        category_name: sub.category_id.and_then(|id| local.category(id)).map(|c| c.name.clone()),
        payee_name: sub.payee_id.and_then(|id| local.payee(id)).map(|p| p.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountType, ClearedStatus, Payee, Subtransaction, Transaction};

    fn fixture() -> (LocalBudget, Uuid, Uuid) {
        let mut local = LocalBudget::empty(Uuid::new_v4(), "Test");
        let account_id = Uuid::new_v4();
        let payee_id = Uuid::new_v4();
        local.accounts.push(Account {
            id: account_id,
            name: "Checking".into(),
            account_type: AccountType::Checking,
            on_budget: true,
            closed: false,
            balance: 0,
            cleared_balance: 0,
            uncleared_balance: 0,
            direct_import_linked: false,
            direct_import_in_error: false,
            last_reconciled_at: None,
            deleted: false,
        });
        local.payees.push(Payee {
            id: payee_id,
            name: "Costco".into(),
            transfer_account_id: None,
            deleted: false,
        });
        crate::merge::rebuild_indexes(&mut local);
        (local, account_id, payee_id)
    }

    #[test]
    fn enrich_transaction_joins_account_and_payee_names() {
        let (mut local, account_id, payee_id) = fixture();
        let transaction_id = Uuid::new_v4();
        local.transactions.push(Transaction {
            id: transaction_id,
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            amount: -7500,
            memo: None,
            cleared: ClearedStatus::Cleared,
            approved: true,
            flag_color: None,
            account_id,
            payee_id: Some(payee_id),
            category_id: None,
            transfer_account_id: None,
            transfer_transaction_id: None,
            matched_transaction_id: None,
            import_id: None,
            import_payee_name: None,
            import_payee_name_original: None,
            debt_transaction_type: None,
            deleted: false,
        });
        crate::merge::rebuild_indexes(&mut local);

        let enriched = enrich_transaction(&local, &local.transactions[0]);
        assert_eq!(enriched.account_name.as_deref(), Some("Checking"));
        assert_eq!(enriched.payee_name.as_deref(), Some("Costco"));
        assert_eq!(enriched.amount_scaled, -7.5);
    }

    #[test]
    fn enrich_transaction_joins_subtransactions() {
        let (mut local, account_id, _payee_id) = fixture();
        let transaction_id = Uuid::new_v4();
        local.transactions.push(Transaction {
            id: transaction_id,
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            amount: -10000,
            memo: None,
            cleared: ClearedStatus::Cleared,
            approved: true,
            flag_color: None,
            account_id,
            payee_id: None,
            category_id: None,
            transfer_account_id: None,
            transfer_transaction_id: None,
            matched_transaction_id: None,
            import_id: None,
            import_payee_name: None,
            import_payee_name_original: None,
            debt_transaction_type: None,
            deleted: false,
        });
        local.subtransactions.push(Subtransaction {
            id: Uuid::new_v4(),
            transaction_id,
            amount: -6000,
            memo: None,
            category_id: None,
            payee_id: None,
            transfer_account_id: None,
            deleted: false,
        });
        local.subtransactions.push(Subtransaction {
            id: Uuid::new_v4(),
            transaction_id,
            amount: -4000,
            memo: None,
            category_id: None,
            payee_id: None,
            transfer_account_id: None,
            deleted: false,
        });
        crate::merge::rebuild_indexes(&mut local);

        let enriched = enrich_transaction(&local, &local.transactions[0]);
        assert_eq!(enriched.subtransactions.len(), 2);
    }
}
