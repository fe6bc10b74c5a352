//! Domain types representing category groups, categories, and per-month snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{HasId, IsDeleted, Milliunits};

/// A named grouping of categories (e.g. "Bills", "Everyday Expenses").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryGroup {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for CategoryGroup {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for CategoryGroup {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Goal configuration attached to a category, surfaced read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalInfo {
    pub goal_type: String,
    #[serde(default)]
    pub goal_target: Option<Milliunits>,
    #[serde(default)]
    pub goal_target_month: Option<NaiveDate>,
    #[serde(default)]
    pub goal_percentage_complete: Option<u8>,
}

/// A budget category, carrying the current-month balance/activity/budgeted as of the
/// latest sync. Per-historical-month snapshots live on [`crate::domain::month::Month`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub category_group_id: Uuid,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub budgeted: Milliunits,
    #[serde(default)]
    pub activity: Milliunits,
    #[serde(default)]
    pub balance: Milliunits,
    #[serde(default)]
    pub goal: Option<GoalInfo>,
    #[serde(default)]
    pub deleted: bool,
}

impl HasId for Category {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl IsDeleted for Category {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
