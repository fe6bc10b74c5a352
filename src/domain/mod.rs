//! Entity definitions for the budget replica: accounts, categories, payees,
//! transactions, scheduled transactions, months, and the `LocalBudget` replica
//! itself. Pure data — merge logic lives in [`crate::merge`].

pub mod account;
pub mod budget;
pub mod category;
pub mod common;
pub mod delta;
pub mod month;
pub mod payee;
pub mod scheduled;
pub mod transaction;

pub use account::{Account, AccountType};
pub use budget::{BudgetSummary, Indexes, LocalBudget};
pub use category::{Category, CategoryGroup, GoalInfo};
pub use common::{ClearedStatus, CurrencyFormat, DebtTransactionType, FlagColor, HasId, IsDeleted, Milliunits};
pub use delta::{BudgetListEntry, BudgetPayload, SyncKind, SyncResponse};
pub use month::{Month, MonthCategory};
pub use payee::{Payee, PayeeLocation};
pub use scheduled::{Frequency, ScheduledSubtransaction, ScheduledTransaction};
pub use transaction::{Subtransaction, Transaction};
