//! Pure merge functions over [`LocalBudget`] state and delta payloads (§4.2).
//!
//! Nothing in this module performs I/O or async work — `mergeDelta`/`rebuildIndexes`
//! never suspend, matching §5's concurrency model.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::domain::{
    common::{HasId, IsDeleted},
    month::{Month, MonthCategory},
    BudgetPayload, Indexes, LocalBudget,
};
use crate::errors::SyncError;

/// Merges two arrays of id-addressable entities: an incoming entity with
/// `deleted=true` removes the matching id; any other incoming entity upserts
/// (inserts, or replaces the existing entry with the same id). Entities absent from
/// `delta` are carried over unchanged. Order is unspecified (§4.2).
pub fn merge_entity_array<T>(existing: Vec<T>, delta: &[T]) -> Vec<T>
where
    T: HasId + IsDeleted + Clone,
{
    let mut by_id: HashMap<Uuid, T> = existing.into_iter().map(|e| (e.entity_id(), e)).collect();
    for item in delta {
        let id = item.entity_id();
        if item.is_deleted() {
            by_id.remove(&id);
        } else {
            by_id.insert(id, item.clone());
        }
    }
    by_id.into_values().collect()
}

/// Merges month records by month key (§3 invariant 5, §4.2). A delta month replaces
/// the existing month's scalar fields but its `categories` are id-merged against the
/// existing month's categories rather than replaced wholesale — this is the single
/// most important correctness rule in the whole engine.
pub fn merge_month_array(existing: Vec<Month>, delta: &[Month]) -> Vec<Month> {
    let mut by_key: HashMap<chrono::NaiveDate, Month> =
        existing.into_iter().map(|m| (m.key(), m)).collect();

    for incoming in delta {
        let key = incoming.key();
        if incoming.is_deleted() {
            by_key.remove(&key);
            continue;
        }
        match by_key.remove(&key) {
            Some(current) => {
                let merged_categories =
                    merge_entity_array(current.categories, &incoming.categories);
                let mut installed = incoming.clone();
                installed.categories = merged_categories;
                by_key.insert(key, installed);
            }
            None => {
                by_key.insert(key, incoming.clone());
            }
        }
    }

    by_key.into_values().collect()
}

fn merge_optional_category_category_group_map(
    groups: &[crate::domain::CategoryGroup],
    categories: &[crate::domain::Category],
) -> HashMap<Uuid, String> {
    let group_name: HashMap<Uuid, &str> = groups.iter().map(|g| (g.id, g.name.as_str())).collect();
    categories
        .iter()
        .filter_map(|c| {
            group_name
                .get(&c.category_group_id)
                .map(|name| (c.id, name.to_string()))
        })
        .collect()
}

/// Rebuilds every derived index from the authoritative entity arrays (§3, §4.2).
/// Indexes are never mutated incrementally — always fully recomputed.
pub fn rebuild_indexes(local: &mut LocalBudget) {
    let mut account_by_id = HashMap::new();
    let mut account_by_lower_name = HashMap::new();
    for (idx, account) in local.accounts.iter().enumerate() {
        account_by_id.insert(account.id, idx);
        account_by_lower_name.insert(account.name.to_lowercase(), account.id);
    }

    let mut category_by_id = HashMap::new();
    let mut category_by_lower_name = HashMap::new();
    for (idx, category) in local.categories.iter().enumerate() {
        category_by_id.insert(category.id, idx);
        category_by_lower_name.insert(category.name.to_lowercase(), category.id);
    }

    let mut payee_by_id = HashMap::new();
    let mut payee_by_lower_name = HashMap::new();
    for (idx, payee) in local.payees.iter().enumerate() {
        payee_by_id.insert(payee.id, idx);
        payee_by_lower_name.insert(payee.name.to_lowercase(), payee.id);
    }

    let mut subtransactions_by_parent: HashMap<Uuid, Vec<usize>> = HashMap::new();
    for (idx, sub) in local.subtransactions.iter().enumerate() {
        if sub.has_resolvable_parent() {
            subtransactions_by_parent
                .entry(sub.transaction_id)
                .or_default()
                .push(idx);
        }
    }

    let mut scheduled_subtransactions_by_parent: HashMap<Uuid, Vec<usize>> = HashMap::new();
    for (idx, sub) in local.scheduled_subtransactions.iter().enumerate() {
        if !sub.scheduled_transaction_id.is_nil() {
            scheduled_subtransactions_by_parent
                .entry(sub.scheduled_transaction_id)
                .or_default()
                .push(idx);
        }
    }

    let category_group_name_by_category_id =
        merge_optional_category_category_group_map(&local.category_groups, &local.categories);

    local.indexes = Indexes {
        account_by_id,
        account_by_lower_name,
        category_by_id,
        category_by_lower_name,
        category_group_name_by_category_id,
        payee_by_id,
        payee_by_lower_name,
        subtransactions_by_parent,
        scheduled_subtransactions_by_parent,
    };
}

/// Wall-clock durations for one [`merge_delta_timed`] call, surfaced by the
/// orchestrator as `tracing` fields on its `sync` span (§4.3 timing metrics).
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeTiming {
    pub merge_duration: Duration,
    pub index_rebuild_duration: Duration,
}

/// Merges a delta (or full) payload into `local`, replacing scalar fields,
/// id-merging every entity array, id-merging nested month categories, and rebuilding
/// all indexes. Returns [`SyncError::MergeInvariantViolation`] if `server_knowledge`
/// moves backwards (§3 invariant 2) — the replica is left untouched in that case.
pub fn merge_delta(
    local: &mut LocalBudget,
    payload: &BudgetPayload,
    reported_server_knowledge: i64,
) -> Result<(), SyncError> {
    merge_delta_timed(local, payload, reported_server_knowledge).map(|_| ())
}

/// Same as [`merge_delta`], but reports how long the field/array merge and the
/// index rebuild each took (§4.3: "provider latency, merge duration, index-rebuild
/// duration, history-persist duration" are captured per sync).
pub fn merge_delta_timed(
    local: &mut LocalBudget,
    payload: &BudgetPayload,
    reported_server_knowledge: i64,
) -> Result<MergeTiming, SyncError> {
    if reported_server_knowledge < local.server_knowledge {
        return Err(SyncError::MergeInvariantViolation(format!(
            "server_knowledge regressed: local={}, reported={}",
            local.server_knowledge, reported_server_knowledge
        )));
    }

    let merge_start = Instant::now();

    if let Some(name) = &payload.name {
        local.name = name.clone();
    }
    if let Some(format) = &payload.currency_format {
        local.currency_format = format.clone();
    }

    local.accounts = merge_entity_array(std::mem::take(&mut local.accounts), &payload.accounts);
    local.category_groups =
        merge_entity_array(std::mem::take(&mut local.category_groups), &payload.category_groups);
    local.categories = merge_entity_array(std::mem::take(&mut local.categories), &payload.categories);
    local.payees = merge_entity_array(std::mem::take(&mut local.payees), &payload.payees);
    local.payee_locations =
        merge_entity_array(std::mem::take(&mut local.payee_locations), &payload.payee_locations);
    local.transactions =
        merge_entity_array(std::mem::take(&mut local.transactions), &payload.transactions);
    local.subtransactions =
        merge_entity_array(std::mem::take(&mut local.subtransactions), &payload.subtransactions);
    local.scheduled_transactions = merge_entity_array(
        std::mem::take(&mut local.scheduled_transactions),
        &payload.scheduled_transactions,
    );
    local.scheduled_subtransactions = merge_entity_array(
        std::mem::take(&mut local.scheduled_subtransactions),
        &payload.scheduled_subtransactions,
    );
    local.months = merge_month_array(std::mem::take(&mut local.months), &payload.months);

    local.server_knowledge = reported_server_knowledge;
    let merge_duration = merge_start.elapsed();

    let rebuild_start = Instant::now();
    rebuild_indexes(local);
    let index_rebuild_duration = rebuild_start.elapsed();

    validate_post_merge(local);
    Ok(MergeTiming {
        merge_duration,
        index_rebuild_duration,
    })
}

/// Best-effort post-merge sanity sweep: logs, never fails. A subtransaction whose
/// parent id doesn't resolve to any transaction after merge is a merge invariant
/// smell worth a warning, but is not itself corruption (§7 MergeInvariantViolation
/// note: "a subtransaction with a malformed parent id after merge" is logged, not
/// raised).
fn validate_post_merge(local: &LocalBudget) {
    let transaction_ids: HashSet<Uuid> = local.transactions.iter().map(|t| t.id).collect();
    for sub in &local.subtransactions {
        if sub.has_resolvable_parent() && !transaction_ids.contains(&sub.transaction_id) {
            tracing::warn!(
                subtransaction_id = %sub.id,
                parent_id = %sub.transaction_id,
                "subtransaction references a transaction absent from the replica"
            );
        }
    }
}
