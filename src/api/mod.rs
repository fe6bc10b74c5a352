//! Typed read/write surface an MCP tool layer calls into (§4.7, §4.8). Neither
//! module talks to the provider directly — reads go through
//! [`crate::orchestrator::SyncOrchestrator::get_local_budget_with_sync`], writes go
//! through the provider and then flip `needs_sync`.

pub mod read;
pub mod write;

pub use read::{EnrichedScheduledTransaction, EnrichedSubtransaction, EnrichedTransaction, ReadApi};
pub use write::WriteApi;
