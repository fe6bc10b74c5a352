use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{HasId, IsDeleted, Milliunits};

/// A per-month snapshot of a category's balances, nested inside [`Month`]. This is
/// the array that the merge core must id-merge rather than replace wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthCategory {
    pub id: Uuid,
    pub category_group_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub budgeted: Milliunits,
    #[serde(default)]
    pub activity: Milliunits,
    #[serde(default)]
    pub balance: Milliunits,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for MonthCategory {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for MonthCategory {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// A budget month, keyed by the first-of-month date. Scalar fields are replaced
/// wholesale on merge; `categories` is id-merged against the existing snapshot
/// (§3 invariant 5, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Month {
    pub month: NaiveDate,
    #[serde(default)]
    pub income: Milliunits,
    #[serde(default)]
    pub budgeted: Milliunits,
    #[serde(default)]
    pub activity: Milliunits,
    #[serde(default)]
    pub to_be_budgeted: Milliunits,
    #[serde(default)]
    pub age_of_money: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub categories: Vec<MonthCategory>,
    #[serde(default)]
    pub deleted: bool,
}

impl Month {
    pub fn key(&self) -> NaiveDate {
        self.month
    }
}

impl IsDeleted for Month {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
