//! HTTP `SyncProvider` backed by the budget API (§4.3, §6). Wire shapes mirror the
//! `{ "data": { ... } }` envelope used throughout this ecosystem's YNAB clients.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client, Method, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{
    Account, BudgetListEntry, BudgetPayload, Milliunits, MonthCategory, Subtransaction, SyncResponse,
    Transaction,
};
use crate::errors::SyncError;

use super::{ImportResult, SyncProvider, TransactionWrite};

#[derive(Debug, Deserialize)]
struct BudgetsEnvelope {
    data: BudgetsData,
}

#[derive(Debug, Deserialize)]
struct BudgetsData {
    budgets: Vec<BudgetListEntry>,
}

#[derive(Debug, Deserialize)]
struct BudgetEnvelope {
    data: BudgetData,
}

#[derive(Debug, Deserialize)]
struct BudgetData {
    #[serde(flatten)]
    budget: BudgetPayload,
    server_knowledge: i64,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    data: TransactionData,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    transaction: Transaction,
    #[serde(default)]
    subtransactions: Vec<Subtransaction>,
}

#[derive(Debug, Deserialize)]
struct TransactionsEnvelope {
    data: TransactionsData,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    #[serde(default)]
    transactions: Vec<Transaction>,
    #[serde(default)]
    duplicate_import_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    data: AccountData,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    account: Account,
}

#[derive(Debug, Deserialize)]
struct MonthCategoryEnvelope {
    data: MonthCategoryData,
}

#[derive(Debug, Deserialize)]
struct MonthCategoryData {
    category: MonthCategory,
}

/// Talks to a live budget API over HTTP. One `RemoteProvider` is shared across every
/// budget the orchestrator manages; per-budget serialization is the orchestrator's
/// job, not this provider's (§5).
pub struct RemoteProvider {
    client: Client,
    base_url: String,
    token: String,
}

impl RemoteProvider {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn classify_error(status: StatusCode, body: String) -> SyncError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::ProviderAuth(body),
            StatusCode::NOT_FOUND => SyncError::ProviderNotFound(body),
            StatusCode::TOO_MANY_REQUESTS => SyncError::ProviderRateLimited {
                retry_after_secs: None,
            },
            status if status.is_server_error() => SyncError::ProviderTransient(body),
            _ => SyncError::ProviderTransient(body),
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, SyncError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self
            .client
            .request(method, &url)
            .header(header::AUTHORIZATION, self.authorization())
            .header(header::ACCEPT, "application/json");
        if let Some(payload) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .json(&payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::ProviderTransient(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::ProviderTransient(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, text).await);
        }

        serde_json::from_str(&text).map_err(|e| SyncError::ProviderTransient(e.to_string()))
    }
}

#[async_trait]
impl SyncProvider for RemoteProvider {
    async fn list_budgets(&self) -> Result<Vec<BudgetListEntry>, SyncError> {
        let envelope: BudgetsEnvelope = self.send_json(Method::GET, "/budgets", None).await?;
        Ok(envelope.data.budgets)
    }

    async fn full_sync(&self, budget_id: Uuid) -> Result<SyncResponse, SyncError> {
        let path = format!("/budgets/{budget_id}");
        let envelope: BudgetEnvelope = self.send_json(Method::GET, &path, None).await?;
        Ok(SyncResponse {
            budget: envelope.data.budget,
            server_knowledge: envelope.data.server_knowledge,
        })
    }

    async fn delta_sync(
        &self,
        budget_id: Uuid,
        server_knowledge: i64,
    ) -> Result<SyncResponse, SyncError> {
        let path = format!("/budgets/{budget_id}?last_knowledge_of_server={server_knowledge}");
        let envelope: BudgetEnvelope = self.send_json(Method::GET, &path, None).await?;
        Ok(SyncResponse {
            budget: envelope.data.budget,
            server_knowledge: envelope.data.server_knowledge,
        })
    }

    async fn create_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError> {
        let path = format!("/budgets/{budget_id}/transactions");
        let body = serde_json::json!({ "transaction": transaction, "subtransactions": subtransactions });
        let envelope: TransactionEnvelope =
            self.send_json(Method::POST, &path, Some(body)).await?;
        Ok(TransactionWrite {
            transaction: envelope.data.transaction,
            subtransactions: envelope.data.subtransactions,
        })
    }

    async fn update_transaction(
        &self,
        budget_id: Uuid,
        transaction: Transaction,
        subtransactions: Vec<Subtransaction>,
    ) -> Result<TransactionWrite, SyncError> {
        let path = format!("/budgets/{budget_id}/transactions/{}", transaction.id);
        let body = serde_json::json!({ "transaction": transaction, "subtransactions": subtransactions });
        let envelope: TransactionEnvelope =
            self.send_json(Method::PATCH, &path, Some(body)).await?;
        Ok(TransactionWrite {
            transaction: envelope.data.transaction,
            subtransactions: envelope.data.subtransactions,
        })
    }

    async fn import_transactions(
        &self,
        budget_id: Uuid,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, SyncError> {
        let path = format!("/budgets/{budget_id}/transactions/bulk");
        let body = serde_json::json!({ "transactions": transactions });
        let envelope: TransactionsEnvelope =
            self.send_json(Method::POST, &path, Some(body)).await?;
        Ok(ImportResult {
            created: envelope.data.transactions,
            duplicate_import_ids: envelope.data.duplicate_import_ids,
        })
    }

    async fn create_account(&self, budget_id: Uuid, account: Account) -> Result<Account, SyncError> {
        let path = format!("/budgets/{budget_id}/accounts");
        let body = serde_json::json!({ "account": account });
        let envelope: AccountEnvelope = self.send_json(Method::POST, &path, Some(body)).await?;
        Ok(envelope.data.account)
    }

    async fn update_category_budgeted(
        &self,
        budget_id: Uuid,
        month: NaiveDate,
        category_id: Uuid,
        budgeted: Milliunits,
    ) -> Result<MonthCategory, SyncError> {
        let path = format!("/budgets/{budget_id}/months/{month}/categories/{category_id}");
        let body = serde_json::json!({ "category": { "budgeted": budgeted } });
        let envelope: MonthCategoryEnvelope =
            self.send_json(Method::PATCH, &path, Some(body)).await?;
        Ok(envelope.data.category)
    }
}
