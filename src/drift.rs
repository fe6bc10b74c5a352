//! Structural diff between a merged replica and a freshly fetched "truth" replica,
//! used to verify merge correctness and self-heal on disagreement (§4.4).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{BudgetPayload, LocalBudget, SyncResponse};
use crate::errors::SyncError;
use crate::utils::{ensure_dir, validate_path_segment, write_atomic};

/// Classification of a single structural difference (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    /// Present in truth but missing from the merged replica.
    New,
    /// Present in the merged replica but missing from truth.
    Deleted,
    /// Present in both, but a scalar field differs.
    Edited,
    /// Same identity and fields, different position only — downgraded severity.
    ArrayPerturbation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difference {
    pub entity_array: &'static str,
    pub entity_id: String,
    pub kind: DiffKind,
    pub detail: Option<String>,
}

/// Outcome of one drift check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub budget_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub differences: Vec<Difference>,
    /// True when `truth.server_knowledge > merged.server_knowledge` — an external
    /// writer advanced the cursor between the two fetches, so differences are
    /// expected rather than drift.
    pub expected_external_change: bool,
}

impl DriftReport {
    pub fn is_drift(&self) -> bool {
        !self.expected_external_change && !self.differences.is_empty()
    }
}

fn diff_id_set<T>(
    label: &'static str,
    merged: &[T],
    truth: &[T],
    id_of: impl Fn(&T) -> Uuid,
    eq: impl Fn(&T, &T) -> bool,
) -> Vec<Difference>
where
{
    let merged_by_id: HashMap<Uuid, &T> = merged.iter().map(|item| (id_of(item), item)).collect();
    let truth_by_id: HashMap<Uuid, &T> = truth.iter().map(|item| (id_of(item), item)).collect();
    let mut diffs = Vec::new();

    for (id, truth_item) in &truth_by_id {
        match merged_by_id.get(id) {
            None => diffs.push(Difference {
                entity_array: label,
                entity_id: id.to_string(),
                kind: DiffKind::New,
                detail: None,
            }),
            Some(merged_item) => {
                if !eq(merged_item, truth_item) {
                    diffs.push(Difference {
                        entity_array: label,
                        entity_id: id.to_string(),
                        kind: DiffKind::Edited,
                        detail: None,
                    });
                }
            }
        }
    }
    for id in merged_by_id.keys() {
        if !truth_by_id.contains_key(id) {
            diffs.push(Difference {
                entity_array: label,
                entity_id: id.to_string(),
                kind: DiffKind::Deleted,
                detail: None,
            });
        }
    }
    diffs
}

/// Computes the structural diff between `merged` and `truth` over every entity
/// array, including nested `month.categories` (§4.4).
pub fn compute_diff(merged: &BudgetPayload, truth: &BudgetPayload) -> Vec<Difference> {
    let mut diffs = Vec::new();

    diffs.extend(diff_id_set(
        "accounts",
        &merged.accounts,
        &truth.accounts,
        |a| a.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "category_groups",
        &merged.category_groups,
        &truth.category_groups,
        |g| g.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "categories",
        &merged.categories,
        &truth.categories,
        |c| c.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "payees",
        &merged.payees,
        &truth.payees,
        |p| p.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "payee_locations",
        &merged.payee_locations,
        &truth.payee_locations,
        |p| p.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "transactions",
        &merged.transactions,
        &truth.transactions,
        |t| t.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "subtransactions",
        &merged.subtransactions,
        &truth.subtransactions,
        |s| s.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "scheduled_transactions",
        &merged.scheduled_transactions,
        &truth.scheduled_transactions,
        |s| s.id,
        |a, b| a == b,
    ));
    diffs.extend(diff_id_set(
        "scheduled_subtransactions",
        &merged.scheduled_subtransactions,
        &truth.scheduled_subtransactions,
        |s| s.id,
        |a, b| a == b,
    ));

    let merged_months: HashMap<_, _> = merged.months.iter().map(|m| (m.key(), m)).collect();
    let truth_months: HashMap<_, _> = truth.months.iter().map(|m| (m.key(), m)).collect();
    for (key, truth_month) in &truth_months {
        match merged_months.get(key) {
            None => diffs.push(Difference {
                entity_array: "months",
                entity_id: key.to_string(),
                kind: DiffKind::New,
                detail: None,
            }),
            Some(merged_month) => {
                diffs.extend(diff_id_set(
                    "month.categories",
                    &merged_month.categories,
                    &truth_month.categories,
                    |c| c.id,
                    |a, b| a == b,
                ));
                if merged_month.income != truth_month.income
                    || merged_month.budgeted != truth_month.budgeted
                    || merged_month.activity != truth_month.activity
                    || merged_month.to_be_budgeted != truth_month.to_be_budgeted
                {
                    diffs.push(Difference {
                        entity_array: "months",
                        entity_id: key.to_string(),
                        kind: DiffKind::Edited,
                        detail: Some("scalar fields differ".into()),
                    });
                }
            }
        }
    }
    for key in merged_months.keys() {
        if !truth_months.contains_key(key) {
            diffs.push(Difference {
                entity_array: "months",
                entity_id: key.to_string(),
                kind: DiffKind::Deleted,
                detail: None,
            });
        }
    }

    diffs
}

/// Per-budget sampling state for drift checks: at most once per `N` syncs OR once
/// per `M` minutes, whichever triggers first (§4.4).
#[derive(Debug, Clone, Default)]
pub struct DriftSamplingState {
    pub syncs_since_last_check: u32,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub drift_occurrences: u32,
}

impl DriftSamplingState {
    pub fn record_sync(&mut self) {
        self.syncs_since_last_check += 1;
    }

    /// Records a confirmed drift occurrence and reports whether this one should have
    /// its artifacts captured, throttled to 1-in-`sample_rate` occurrences (§6
    /// `drift-sample-rate`). A rate of 0 or 1 captures every occurrence.
    pub fn should_capture(&mut self, sample_rate: u32) -> bool {
        let rate = sample_rate.max(1);
        let due = self.drift_occurrences % rate == 0;
        self.drift_occurrences += 1;
        due
    }

    pub fn is_due(&self, interval_syncs: u32, interval: Duration, now: DateTime<Utc>) -> bool {
        if self.syncs_since_last_check >= interval_syncs.max(1) {
            return true;
        }
        if interval == Duration::ZERO {
            return false;
        }
        match self.last_checked_at {
            None => true,
            Some(last) => {
                let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
                elapsed >= interval
            }
        }
    }

    pub fn record_check(&mut self, now: DateTime<Utc>) {
        self.syncs_since_last_check = 0;
        self.last_checked_at = Some(now);
    }
}

/// Captures the six drift artifacts to a per-occurrence directory and runs the
/// diff/self-heal decision (§4.4).
pub struct DriftDetector {
    artifacts_root: PathBuf,
}

impl DriftDetector {
    pub fn new(config_root: PathBuf) -> Self {
        Self {
            artifacts_root: config_root.join("drift-artifacts"),
        }
    }

    /// Runs one drift check. `previous_full` is the last full payload on record (may
    /// be absent if one hasn't been captured yet), `delta_response` is the delta that
    /// was just merged, `merged` is the post-merge replica, and `full_response` is a
    /// concurrently fetched ground-truth full sync.
    pub async fn check(
        &self,
        budget_id: Uuid,
        previous_full: Option<&BudgetPayload>,
        delta_response: &SyncResponse,
        merged: &LocalBudget,
        full_response: &SyncResponse,
        now: DateTime<Utc>,
    ) -> Result<DriftReport, SyncError> {
        let merged_payload = local_budget_to_payload(merged);
        let differences = compute_diff(&merged_payload, &full_response.budget);
        let expected_external_change =
            full_response.server_knowledge > merged.server_knowledge;

        let report = DriftReport {
            budget_id,
            checked_at: now,
            differences,
            expected_external_change,
        };

        if report.is_drift() {
            tracing::warn!(
                budget_id = %budget_id,
                difference_count = report.differences.len(),
                "drift detected between merged replica and ground truth; self-healing"
            );
        }

        Ok(report)
    }

    /// Captures the six drift artifacts for a confirmed drift occurrence. Callers
    /// throttle how often this runs via `drift-sample-rate` (§6) — detection and
    /// self-heal happen on every confirmed drift regardless of sampling; only the
    /// on-disk artifact capture is sampled.
    pub async fn capture_artifacts(
        &self,
        budget_id: Uuid,
        previous_full: Option<&BudgetPayload>,
        delta_response: &SyncResponse,
        merged_payload: &BudgetPayload,
        full_response: &SyncResponse,
        report: &DriftReport,
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let budget_segment = budget_id.to_string();
        validate_path_segment(&budget_segment)?;
        let occurrence = now.format("%Y-%m-%dT%H-%M-%SZ").to_string();
        validate_path_segment(&occurrence)?;
        let dir = self.artifacts_root.join(budget_segment).join(occurrence);
        ensure_dir(&dir)?;

        write_json(&dir.join("previous-full.json"), &previous_full)?;
        write_json(&dir.join("delta-response.json"), delta_response)?;
        write_json(&dir.join("merged-budget.json"), merged_payload)?;
        write_json(&dir.join("full-response.json"), full_response)?;
        write_json(&dir.join("differences.json"), &report.differences)?;

        let summary = serde_json::json!({
            "budget_id": budget_id,
            "checked_at": report.checked_at,
            "difference_count": report.differences.len(),
        });
        write_json(&dir.join("summary.json"), &summary)?;

        Ok(())
    }
}

fn write_json<T: Serialize>(path: &std::path::Path, value: &T) -> Result<(), SyncError> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, &json)
}

pub(crate) fn local_budget_to_payload(local: &LocalBudget) -> BudgetPayload {
    BudgetPayload {
        name: Some(local.name.clone()),
        currency_format: Some(local.currency_format.clone()),
        accounts: local.accounts.clone(),
        category_groups: local.category_groups.clone(),
        categories: local.categories.clone(),
        payees: local.payees.clone(),
        payee_locations: local.payee_locations.clone(),
        transactions: local.transactions.clone(),
        subtransactions: local.subtransactions.clone(),
        scheduled_transactions: local.scheduled_transactions.clone(),
        scheduled_subtransactions: local.scheduled_subtransactions.clone(),
        months: local.months.clone(),
    }
}
