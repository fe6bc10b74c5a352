//! Append-only record of every sync performed, one JSON file per sync (§4.5).
//!
//! Records live at `<config-root>/sync-history/<budgetId>/<ISO8601Z>-<budgetId>-<full|delta>.json`.
//! Every caller-influenced path segment is validated before touching the filesystem.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{SyncKind, SyncResponse};
use crate::errors::SyncError;
use crate::utils::{ensure_dir, validate_path_segment, write_atomic};

/// One append-only sync-history record. Carries the raw provider response payload
/// so the history is a replayable audit trail, not just a summary of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncHistoryRecord {
    pub budget_id: Uuid,
    pub kind: SyncKind,
    pub performed_at: DateTime<Utc>,
    pub server_knowledge_before: i64,
    pub server_knowledge_after: i64,
    pub response: SyncResponse,
}

/// Manages the on-disk sync-history tree rooted at `<config-root>/sync-history`.
pub struct SyncHistoryStore {
    root: PathBuf,
}

impl SyncHistoryStore {
    pub fn new(config_root: PathBuf) -> Self {
        Self {
            root: config_root.join("sync-history"),
        }
    }

    fn budget_dir(&self, budget_id: Uuid) -> Result<PathBuf, SyncError> {
        let segment = budget_id.to_string();
        validate_path_segment(&segment)?;
        Ok(self.root.join(segment))
    }

    /// Appends a new history record, returning the path it was written to.
    pub fn append(
        &self,
        budget_id: Uuid,
        kind: SyncKind,
        server_knowledge_before: i64,
        response: &SyncResponse,
        performed_at: DateTime<Utc>,
    ) -> Result<PathBuf, SyncError> {
        let dir = self.budget_dir(budget_id)?;
        ensure_dir(&dir)?;

        let record = SyncHistoryRecord {
            budget_id,
            kind,
            performed_at,
            server_knowledge_before,
            server_knowledge_after: response.server_knowledge,
            response: response.clone(),
        };

        let timestamp = performed_at.format("%Y-%m-%dT%H-%M-%SZ");
        let file_name = format!("{timestamp}-{budget_id}-{}.json", kind.as_str());
        validate_path_segment(&file_name)?;
        let path = dir.join(file_name);

        let json = serde_json::to_string_pretty(&record)?;
        write_atomic(&path, &json)?;
        Ok(path)
    }

    /// Lists every history record for a budget, oldest first.
    pub fn list(&self, budget_id: Uuid) -> Result<Vec<SyncHistoryRecord>, SyncError> {
        let dir = self.budget_dir(budget_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = std::fs::read_to_string(&path)?;
            let record: SyncHistoryRecord = serde_json::from_str(&data)?;
            records.push(record);
        }
        records.sort_by_key(|r| r.performed_at);
        Ok(records)
    }
}
