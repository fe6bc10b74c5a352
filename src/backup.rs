//! First-use and periodic full-budget backups (§1, §6).
//!
//! A backup is a full [`BudgetPayload`] snapshot written to
//! `<config-root>/backups/<budgetId>/<ISO8601Z>-<budgetId>.json`, taken the first
//! time a budget is synced and at most once every 24 hours after that. Backups are
//! separate from [`crate::history::SyncHistoryStore`]: history records every sync's
//! response for audit purposes, backups keep a restorable full snapshot.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::BudgetPayload;
use crate::errors::SyncError;
use crate::utils::{ensure_dir, validate_path_segment, write_atomic};

const BACKUP_THROTTLE: Duration = Duration::from_secs(24 * 60 * 60);

/// Manages the on-disk backup tree rooted at `<config-root>/backups`.
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(config_root: PathBuf) -> Self {
        Self {
            root: config_root.join("backups"),
        }
    }

    fn budget_dir(&self, budget_id: Uuid) -> Result<PathBuf, SyncError> {
        let segment = budget_id.to_string();
        validate_path_segment(&segment)?;
        Ok(self.root.join(segment))
    }

    /// Writes a full backup of `payload` if this budget has never been backed up, or
    /// its most recent backup is at least 24 hours old. Returns whether a backup was
    /// actually written.
    pub fn maybe_backup(
        &self,
        budget_id: Uuid,
        payload: &BudgetPayload,
        now: DateTime<Utc>,
    ) -> Result<bool, SyncError> {
        let dir = self.budget_dir(budget_id)?;
        if let Some(last) = self.most_recent_backup_at(&dir)? {
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < BACKUP_THROTTLE {
                return Ok(false);
            }
        }

        ensure_dir(&dir)?;
        let timestamp = now.format("%Y-%m-%dT%H-%M-%SZ");
        let file_name = format!("{timestamp}-{budget_id}.json");
        validate_path_segment(&file_name)?;

        let json = serde_json::to_string_pretty(payload)?;
        write_atomic(&dir.join(file_name), &json)?;
        Ok(true)
    }

    fn most_recent_backup_at(&self, dir: &std::path::Path) -> Result<Option<DateTime<Utc>>, SyncError> {
        if !dir.exists() {
            return Ok(None);
        }
        let mut latest: Option<DateTime<Utc>> = None;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
            if latest.map_or(true, |l| modified > l) {
                latest = Some(modified);
            }
        }
        Ok(latest)
    }

    /// Lists every backup file recorded for a budget, oldest first.
    pub fn list(&self, budget_id: Uuid) -> Result<Vec<PathBuf>, SyncError> {
        let dir = self.budget_dir(budget_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_use_backs_up_immediately() {
        let temp = TempDir::new().unwrap();
        let store = BackupStore::new(temp.path().to_path_buf());
        let budget_id = Uuid::new_v4();

        let wrote = store
            .maybe_backup(budget_id, &BudgetPayload::default(), Utc::now())
            .unwrap();
        assert!(wrote);
        assert_eq!(store.list(budget_id).unwrap().len(), 1);
    }

    #[test]
    fn a_second_backup_within_24h_is_skipped() {
        let temp = TempDir::new().unwrap();
        let store = BackupStore::new(temp.path().to_path_buf());
        let budget_id = Uuid::new_v4();
        let now = Utc::now();

        store.maybe_backup(budget_id, &BudgetPayload::default(), now).unwrap();
        let wrote_again = store
            .maybe_backup(budget_id, &BudgetPayload::default(), now + chrono::Duration::hours(1))
            .unwrap();

        assert!(!wrote_again);
        assert_eq!(store.list(budget_id).unwrap().len(), 1);
    }

    #[test]
    fn a_backup_past_24h_is_taken_again() {
        let temp = TempDir::new().unwrap();
        let store = BackupStore::new(temp.path().to_path_buf());
        let budget_id = Uuid::new_v4();
        let now = Utc::now();

        store.maybe_backup(budget_id, &BudgetPayload::default(), now).unwrap();
        let wrote_later = store
            .maybe_backup(budget_id, &BudgetPayload::default(), now + chrono::Duration::hours(25))
            .unwrap();

        assert!(wrote_later);
        assert_eq!(store.list(budget_id).unwrap().len(), 2);
    }

    #[test]
    fn list_on_unknown_budget_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = BackupStore::new(temp.path().to_path_buf());
        assert!(store.list(Uuid::new_v4()).unwrap().is_empty());
    }
}
