#![doc(test(attr(deny(warnings))))]

//! Local-replica sync engine that keeps a budget's entities mirrored from a remote
//! budgeting provider, merges incremental deltas, detects drift against the remote,
//! and exposes a typed read/write surface for an MCP tool layer to call into.

pub mod api;
pub mod backup;
pub mod config;
pub mod domain;
pub mod drift;
pub mod errors;
pub mod history;
pub mod merge;
pub mod orchestrator;
pub mod provider;
pub mod selector;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing against the resolved config root and emits a startup
/// log line. Safe to call more than once; only the first call takes effect.
pub fn init(config: &config::SyncConfig) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(&config.config_root);
        tracing::info!(config_root = %config.config_root.display(), "sync engine tracing initialized");
    });
}
