use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{HasId, IsDeleted, Milliunits};

/// Closed set of account classifications mirrored from the remote budget API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    Checking,
    Savings,
    Cash,
    CreditCard,
    LineOfCredit,
    OtherAsset,
    OtherLiability,
    Mortgage,
    AutoLoan,
    StudentLoan,
    PersonalLoan,
    MedicalDebt,
    OtherDebt,
}

/// A financial account within a budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub on_budget: bool,
    pub closed: bool,
    pub balance: Milliunits,
    pub cleared_balance: Milliunits,
    pub uncleared_balance: Milliunits,
    #[serde(default)]
    pub direct_import_linked: bool,
    #[serde(default)]
    pub direct_import_in_error: bool,
    #[serde(default)]
    pub last_reconciled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for Account {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for Account {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
