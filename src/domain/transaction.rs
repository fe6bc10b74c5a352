use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{
    ClearedStatus, DebtTransactionType, FlagColor, HasId, IsDeleted, Milliunits,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: Milliunits,
    #[serde(default)]
    pub memo: Option<String>,
    pub cleared: ClearedStatus,
    pub approved: bool,
    #[serde(default)]
    pub flag_color: Option<FlagColor>,
    pub account_id: Uuid,
    #[serde(default)]
    pub payee_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub transfer_account_id: Option<Uuid>,
    #[serde(default)]
    pub transfer_transaction_id: Option<Uuid>,
    #[serde(default)]
    pub matched_transaction_id: Option<Uuid>,
    #[serde(default)]
    pub import_id: Option<String>,
    #[serde(default)]
    pub import_payee_name: Option<String>,
    #[serde(default)]
    pub import_payee_name_original: Option<String>,
    #[serde(default)]
    pub debt_transaction_type: Option<DebtTransactionType>,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for Transaction {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for Transaction {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtransaction {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub amount: Milliunits,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub payee_id: Option<Uuid>,
    #[serde(default)]
    pub transfer_account_id: Option<Uuid>,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for Subtransaction {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for Subtransaction {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Subtransaction {
    /// A subtransaction with a nil parent id is retained in the flat array but
    /// excluded from parent-keyed indexes (§4.2 edge case).
    pub fn has_resolvable_parent(&self) -> bool {
        !self.transaction_id.is_nil()
    }
}
