use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{HasId, IsDeleted};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payee {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub transfer_account_id: Option<Uuid>,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for Payee {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for Payee {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayeeLocation {
    pub id: Uuid,
    pub payee_id: Uuid,
    pub latitude: String,
    pub longitude: String,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for PayeeLocation {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for PayeeLocation {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
