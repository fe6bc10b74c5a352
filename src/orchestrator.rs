//! Decides which kind of sync to perform per request, drives the provider/merge/
//! drift/history pipeline, and holds the per-budget replica slots (§4.3, §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backup::BackupStore;
use crate::domain::{BudgetPayload, LocalBudget, SyncKind};
use crate::drift::{local_budget_to_payload, DriftDetector, DriftSamplingState};
use crate::errors::SyncError;
use crate::history::SyncHistoryStore;
use crate::merge::{merge_delta, merge_delta_timed};
use crate::provider::{ForceSync, SyncProvider};

/// Per-budget mutable state guarded by that budget's mutex: the replica, drift
/// sampling state, and the last full payload captured (used as the `previous-full`
/// drift artifact).
struct BudgetSlot {
    local: Option<LocalBudget>,
    drift_state: DriftSamplingState,
    last_full_payload: Option<BudgetPayload>,
}

impl Default for BudgetSlot {
    fn default() -> Self {
        Self {
            local: None,
            drift_state: DriftSamplingState::default(),
            last_full_payload: None,
        }
    }
}

/// Tunables that drive the decision table and drift sampling (§4.3, §4.4, §6).
#[derive(Debug, Clone)]
pub struct OrchestratorPolicy {
    pub sync_interval: Duration,
    pub always_full_sync: bool,
    pub drift_detection: bool,
    pub drift_check_interval_syncs: u32,
    pub drift_check_interval_minutes: u32,
    pub drift_sample_rate: u32,
}

impl From<&crate::config::SyncConfig> for OrchestratorPolicy {
    fn from(config: &crate::config::SyncConfig) -> Self {
        Self {
            sync_interval: Duration::from_secs(config.sync_interval_seconds),
            always_full_sync: config.always_full_sync,
            drift_detection: config.drift_detection,
            drift_check_interval_syncs: config.drift_check_interval_syncs,
            drift_check_interval_minutes: config.drift_check_interval_minutes,
            drift_sample_rate: config.drift_sample_rate,
        }
    }
}

/// The decision a request for a budget's replica resolves to (§4.3 decision table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncDecision {
    None,
    Delta,
    Full,
}

/// Coordinates `SyncProvider`, `merge::merge_delta`, `DriftDetector`, and
/// `SyncHistoryStore` behind one per-budget `tokio::sync::Mutex`, folding concurrent
/// requests for the same budget into at most one in-flight sync (§5).
pub struct SyncOrchestrator {
    provider: Arc<dyn SyncProvider>,
    history: SyncHistoryStore,
    drift: DriftDetector,
    backup: BackupStore,
    policy: OrchestratorPolicy,
    slots: Mutex<HashMap<Uuid, Arc<Mutex<BudgetSlot>>>>,
}

impl SyncOrchestrator {
    pub fn new(
        provider: Arc<dyn SyncProvider>,
        history: SyncHistoryStore,
        drift: DriftDetector,
        backup: BackupStore,
        policy: OrchestratorPolicy,
    ) -> Self {
        Self {
            provider,
            history,
            drift,
            backup,
            policy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot_for(&self, budget_id: Uuid) -> Arc<Mutex<BudgetSlot>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(budget_id)
            .or_insert_with(|| Arc::new(Mutex::new(BudgetSlot::default())))
            .clone()
    }

    fn decide(&self, slot: &BudgetSlot, force: ForceSync) -> SyncDecision {
        if force == ForceSync::Full {
            return SyncDecision::Full;
        }
        let Some(local) = &slot.local else {
            return SyncDecision::Full;
        };
        if self.policy.always_full_sync {
            return SyncDecision::Full;
        }
        if force == ForceSync::Delta {
            return SyncDecision::Delta;
        }
        if local.needs_sync {
            return SyncDecision::Delta;
        }
        let elapsed = (Utc::now() - local.last_synced_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if elapsed >= self.policy.sync_interval {
            return SyncDecision::Delta;
        }
        SyncDecision::None
    }

    /// Ensures the replica for `budget_id` is synced per the decision table, then
    /// returns a clone of it. Holding the per-budget mutex across decide→fetch→
    /// merge→persist means concurrent callers for the same budget fold into one
    /// in-flight sync (§5).
    pub async fn get_local_budget_with_sync(
        &self,
        budget_id: Uuid,
        force: ForceSync,
    ) -> Result<LocalBudget, SyncError> {
        let slot_handle = self.slot_for(budget_id).await;
        let mut slot = slot_handle.lock().await;

        let span = tracing::info_span!(
            "sync",
            budget_id = %budget_id,
            kind = tracing::field::Empty,
            provider_latency_ms = tracing::field::Empty,
            merge_duration_ms = tracing::field::Empty,
            index_rebuild_duration_ms = tracing::field::Empty,
            history_persist_duration_ms = tracing::field::Empty,
        );
        let _entered = span.enter();

        let decision = self.decide(&slot, force);
        match decision {
            SyncDecision::None => {}
            SyncDecision::Full => {
                span.record("kind", "full");
                self.run_full_sync(budget_id, &mut slot, &span).await?;
            }
            SyncDecision::Delta => {
                span.record("kind", "delta");
                self.run_delta_sync(budget_id, &mut slot, &span).await?;
            }
        }

        slot.local
            .clone()
            .ok_or_else(|| SyncError::ProviderNotFound(budget_id.to_string()))
    }

    async fn run_full_sync(
        &self,
        budget_id: Uuid,
        slot: &mut BudgetSlot,
        span: &tracing::Span,
    ) -> Result<(), SyncError> {
        tracing::debug!(budget_id = %budget_id, "issuing full sync");
        let provider_start = Instant::now();
        let response = self.provider.full_sync(budget_id).await?;
        span.record("provider_latency_ms", provider_start.elapsed().as_millis() as u64);

        let mut local = LocalBudget::empty(budget_id, "");
        let before = local.server_knowledge;
        let timing = merge_delta_timed(&mut local, &response.budget, response.server_knowledge)?;
        span.record("merge_duration_ms", timing.merge_duration.as_millis() as u64);
        span.record(
            "index_rebuild_duration_ms",
            timing.index_rebuild_duration.as_millis() as u64,
        );
        local.last_synced_at = Utc::now();
        local.needs_sync = false;

        let history_start = Instant::now();
        self.history
            .append(budget_id, SyncKind::Full, before, &response, Utc::now())?;
        span.record("history_persist_duration_ms", history_start.elapsed().as_millis() as u64);

        self.backup
            .maybe_backup(budget_id, &response.budget, Utc::now())?;

        slot.last_full_payload = Some(response.budget.clone());
        slot.local = Some(local);
        slot.drift_state.record_sync();

        Ok(())
    }

    async fn run_delta_sync(
        &self,
        budget_id: Uuid,
        slot: &mut BudgetSlot,
        span: &tracing::Span,
    ) -> Result<(), SyncError> {
        let before = slot
            .local
            .as_ref()
            .map(|l| l.server_knowledge)
            .unwrap_or(0);

        tracing::debug!(budget_id = %budget_id, cursor = before, "issuing delta sync");
        let provider_start = Instant::now();
        let response = self.provider.delta_sync(budget_id, before).await?;
        span.record("provider_latency_ms", provider_start.elapsed().as_millis() as u64);

        let local = slot
            .local
            .as_mut()
            .ok_or_else(|| SyncError::ProviderNotFound(budget_id.to_string()))?;
        let timing = merge_delta_timed(local, &response.budget, response.server_knowledge)?;
        span.record("merge_duration_ms", timing.merge_duration.as_millis() as u64);
        span.record(
            "index_rebuild_duration_ms",
            timing.index_rebuild_duration.as_millis() as u64,
        );
        local.last_synced_at = Utc::now();
        local.needs_sync = false;

        let history_start = Instant::now();
        self.history
            .append(budget_id, SyncKind::Delta, before, &response, Utc::now())?;
        span.record("history_persist_duration_ms", history_start.elapsed().as_millis() as u64);
        slot.drift_state.record_sync();

        if self.policy.drift_detection {
            self.maybe_check_drift(budget_id, slot, &response).await?;
        }

        Ok(())
    }

    async fn maybe_check_drift(
        &self,
        budget_id: Uuid,
        slot: &mut BudgetSlot,
        delta_response: &crate::domain::SyncResponse,
    ) -> Result<(), SyncError> {
        let now = Utc::now();
        let minute_floor = Duration::from_secs(self.policy.drift_check_interval_minutes as u64 * 60);
        if !slot
            .drift_state
            .is_due(self.policy.drift_check_interval_syncs, minute_floor, now)
        {
            return Ok(());
        }

        let full_response = self.provider.full_sync(budget_id).await?;
        let Some(local) = slot.local.as_ref() else {
            return Ok(());
        };

        let report = self
            .drift
            .check(
                budget_id,
                slot.last_full_payload.as_ref(),
                delta_response,
                local,
                &full_response,
                now,
            )
            .await?;

        slot.drift_state.record_check(now);

        if report.is_drift() {
            if slot.drift_state.should_capture(self.policy.drift_sample_rate) {
                let merged_payload = local_budget_to_payload(local);
                self.drift
                    .capture_artifacts(
                        budget_id,
                        slot.last_full_payload.as_ref(),
                        delta_response,
                        &merged_payload,
                        &full_response,
                        &report,
                        now,
                    )
                    .await?;
            } else {
                tracing::debug!(budget_id = %budget_id, "drift artifact capture skipped by sample rate");
            }

            let mut healed = LocalBudget::empty(budget_id, "");
            merge_delta(&mut healed, &full_response.budget, full_response.server_knowledge)?;
            healed.last_synced_at = now;
            healed.needs_sync = false;
            slot.local = Some(healed);
        }
        slot.last_full_payload = Some(full_response.budget.clone());

        Ok(())
    }

    /// Marks a budget's replica dirty after a successful write (§4.8). Does not touch
    /// the replica's entity arrays.
    pub async fn mark_needs_sync(&self, budget_id: Uuid) {
        let slot_handle = self.slot_for(budget_id).await;
        let mut slot = slot_handle.lock().await;
        if let Some(local) = slot.local.as_mut() {
            local.needs_sync = true;
        }
    }

    pub fn provider(&self) -> &Arc<dyn SyncProvider> {
        &self.provider
    }
}
