mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use common::{temp_config_root, MockProvider};
use uuid::Uuid;
use ynab_sync_core::backup::BackupStore;
use ynab_sync_core::domain::{Account, AccountType, BudgetPayload, CategoryGroup, ClearedStatus, Transaction};
use ynab_sync_core::drift::DriftDetector;
use ynab_sync_core::errors::SyncError;
use ynab_sync_core::history::SyncHistoryStore;
use ynab_sync_core::orchestrator::{OrchestratorPolicy, SyncOrchestrator};
use ynab_sync_core::provider::ForceSync;
use ynab_sync_core::selector::{resolve_account, Selector};

fn policy(sync_interval: Duration) -> OrchestratorPolicy {
    OrchestratorPolicy {
        sync_interval,
        always_full_sync: false,
        drift_detection: true,
        drift_check_interval_syncs: 1,
        drift_check_interval_minutes: 0,
        drift_sample_rate: 1,
    }
}

fn account(id: Uuid, name: &str) -> Account {
    Account {
        id,
        name: name.into(),
        account_type: AccountType::Checking,
        on_budget: true,
        closed: false,
        balance: 0,
        cleared_balance: 0,
        uncleared_balance: 0,
        direct_import_linked: false,
        direct_import_in_error: false,
        last_reconciled_at: None,
        deleted: false,
    }
}

fn category_group(id: Uuid, name: &str) -> CategoryGroup {
    CategoryGroup {
        id,
        name: name.into(),
        hidden: false,
        deleted: false,
    }
}

fn transaction(id: Uuid, account_id: Uuid, amount: i64) -> Transaction {
    Transaction {
        id,
        date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        amount,
        memo: None,
        cleared: ClearedStatus::Cleared,
        approved: true,
        flag_color: None,
        account_id,
        payee_id: None,
        category_id: None,
        transfer_account_id: None,
        transfer_transaction_id: None,
        matched_transaction_id: None,
        import_id: None,
        import_payee_name: None,
        import_payee_name_original: None,
        debt_transaction_type: None,
        deleted: false,
    }
}

/// Scenario A: first access against an empty replica performs a full sync; a second
/// access shortly after performs neither a second full sync nor a delta.
#[tokio::test]
async fn scenario_a_first_access_full_syncs_then_settles() {
    let budget_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let t1 = transaction(Uuid::new_v4(), account_id, -5000);
    let t2 = transaction(Uuid::new_v4(), account_id, -2500);

    let full = BudgetPayload {
        accounts: vec![account(account_id, "Checking")],
        transactions: vec![t1, t2],
        ..Default::default()
    };

    let provider = Arc::new(MockProvider::new(budget_id, full, 10));
    let root = temp_config_root();
    let orchestrator = SyncOrchestrator::new(
        provider,
        SyncHistoryStore::new(root.path().to_path_buf()),
        DriftDetector::new(root.path().to_path_buf()),
        BackupStore::new(root.path().to_path_buf()),
        policy(Duration::from_secs(600)),
    );

    let local = orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();
    assert_eq!(local.transactions.len(), 2);
    assert_eq!(local.server_knowledge, 10);

    let again = orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();
    assert_eq!(again.server_knowledge, 10);
    assert_eq!(again.transactions.len(), 2);
}

/// Scenario B: a delta containing only a changed month categories array is merged
/// against the existing categories without disturbing untouched ones.
#[tokio::test]
async fn scenario_b_month_category_delta_merges_in_place() {
    use ynab_sync_core::domain::{Month, MonthCategory};

    let budget_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();
    let groceries_id = Uuid::new_v4();
    let rent_id = Uuid::new_v4();
    let month_key = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    let month_category = |id: Uuid, name: &str, budgeted: i64| MonthCategory {
        id,
        category_group_id: group_id,
        name: name.into(),
        hidden: false,
        budgeted,
        activity: 0,
        balance: budgeted,
        deleted: false,
    };

    let full = BudgetPayload {
        category_groups: vec![category_group(group_id, "Everyday")],
        months: vec![Month {
            month: month_key,
            income: 0,
            budgeted: 150,
            activity: 0,
            to_be_budgeted: 0,
            age_of_money: None,
            note: None,
            categories: vec![
                month_category(groceries_id, "Groceries", 100),
                month_category(rent_id, "Rent", 50),
            ],
            deleted: false,
        }],
        ..Default::default()
    };

    let provider = Arc::new(MockProvider::new(budget_id, full, 1));
    let root = temp_config_root();
    let orchestrator = SyncOrchestrator::new(
        provider.clone(),
        SyncHistoryStore::new(root.path().to_path_buf()),
        DriftDetector::new(root.path().to_path_buf()),
        BackupStore::new(root.path().to_path_buf()),
        policy(Duration::from_secs(600)),
    );

    orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();

    provider.queue_delta(BudgetPayload {
        months: vec![Month {
            month: month_key,
            income: 0,
            budgeted: 125,
            activity: 0,
            to_be_budgeted: 0,
            age_of_money: None,
            note: None,
            categories: vec![month_category(groceries_id, "Groceries", 75)],
            deleted: false,
        }],
        ..Default::default()
    });
    orchestrator.mark_needs_sync(budget_id).await;

    let local = orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();

    let month = local.month(month_key).unwrap();
    assert_eq!(month.budgeted, 125);
    let groceries = month.categories.iter().find(|c| c.id == groceries_id).unwrap();
    assert_eq!(groceries.budgeted, 75);
    let rent = month.categories.iter().find(|c| c.id == rent_id).unwrap();
    assert_eq!(rent.budgeted, 50, "untouched category must survive the merge unchanged");
}

/// Scenario C: creating a transaction through the write API flips `needs_sync`, so
/// the next read performs a delta sync that picks up the new transaction.
#[tokio::test]
async fn scenario_c_write_triggers_resync() {
    use ynab_sync_core::api::WriteApi;

    let budget_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let full = BudgetPayload {
        accounts: vec![account(account_id, "Checking")],
        ..Default::default()
    };

    let provider = Arc::new(MockProvider::new(budget_id, full, 1));
    let root = temp_config_root();
    let orchestrator = SyncOrchestrator::new(
        provider,
        SyncHistoryStore::new(root.path().to_path_buf()),
        DriftDetector::new(root.path().to_path_buf()),
        BackupStore::new(root.path().to_path_buf()),
        policy(Duration::from_secs(600)),
    );

    orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();

    let write_api = WriteApi::new(&orchestrator, false);
    let new_id = Uuid::new_v4();
    write_api
        .create_transaction(budget_id, transaction(new_id, account_id, -1000), Vec::new())
        .await
        .unwrap();

    let local = orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();
    assert!(local.transactions.iter().any(|t| t.id == new_id));
}

/// Scenario D: the remote drifts out-of-band (a silent full-snapshot edit a delta
/// sync would never report); the drift check detects the mismatch and self-heals
/// the replica from the fresh full sync.
#[tokio::test]
async fn scenario_d_drift_triggers_self_heal() {
    let budget_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let txn_id = Uuid::new_v4();

    let full = BudgetPayload {
        accounts: vec![account(account_id, "Checking")],
        transactions: vec![transaction(txn_id, account_id, -1000)],
        ..Default::default()
    };

    let provider = Arc::new(MockProvider::new(budget_id, full, 1));
    let root = temp_config_root();
    let orchestrator = SyncOrchestrator::new(
        provider.clone(),
        SyncHistoryStore::new(root.path().to_path_buf()),
        DriftDetector::new(root.path().to_path_buf()),
        BackupStore::new(root.path().to_path_buf()),
        policy(Duration::from_secs(600)),
    );

    orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();

    // Silently edit the remote's amount without going through the merge-visible
    // delta/cursor path, then force a delta sync (which always runs the drift check).
    provider.mutate_full_silently(|payload| {
        payload.transactions[0].amount = -9999;
    });
    provider.queue_delta(BudgetPayload::default());
    orchestrator.mark_needs_sync(budget_id).await;

    let local = orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();

    let healed = local.transactions.iter().find(|t| t.id == txn_id).unwrap();
    assert_eq!(healed.amount, -9999, "drift check should have self-healed from the full sync");
}

/// Scenario E: a read-only write API rejects mutations without ever calling the
/// provider, and the error names the attempted operation.
#[tokio::test]
async fn scenario_e_read_only_blocks_writes() {
    use ynab_sync_core::api::WriteApi;

    let budget_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let provider = Arc::new(MockProvider::new(
        budget_id,
        BudgetPayload {
            accounts: vec![account(account_id, "Checking")],
            ..Default::default()
        },
        1,
    ));
    let root = temp_config_root();
    let orchestrator = SyncOrchestrator::new(
        provider,
        SyncHistoryStore::new(root.path().to_path_buf()),
        DriftDetector::new(root.path().to_path_buf()),
        BackupStore::new(root.path().to_path_buf()),
        policy(Duration::from_secs(600)),
    );

    let write_api = WriteApi::new(&orchestrator, true);
    let result = write_api
        .delete_transaction(budget_id, transaction(Uuid::new_v4(), account_id, -100))
        .await;
    match result {
        Err(SyncError::ReadOnlyBlocked { operation }) => assert_eq!(operation, "delete_transaction"),
        other => panic!("expected ReadOnlyBlocked naming delete_transaction, got {other:?}"),
    }
}

/// Scenario F: resolving "chase" against two accounts named "Chase Checking" and
/// "Chase Savings" fails with both candidates named, since neither equals "chase"
/// once lowercased.
#[tokio::test]
async fn scenario_f_ambiguous_partial_name_lists_candidates() {
    let budget_id = Uuid::new_v4();
    let checking_id = Uuid::new_v4();
    let savings_id = Uuid::new_v4();

    let full = BudgetPayload {
        accounts: vec![
            account(checking_id, "Chase Checking"),
            account(savings_id, "Chase Savings"),
        ],
        ..Default::default()
    };

    let provider = Arc::new(MockProvider::new(budget_id, full, 1));
    let root = temp_config_root();
    let orchestrator = SyncOrchestrator::new(
        provider,
        SyncHistoryStore::new(root.path().to_path_buf()),
        DriftDetector::new(root.path().to_path_buf()),
        BackupStore::new(root.path().to_path_buf()),
        policy(Duration::from_secs(600)),
    );

    let local = orchestrator
        .get_local_budget_with_sync(budget_id, ForceSync::Auto)
        .await
        .unwrap();

    let result = resolve_account(&Selector::by_name("chase"), &local);
    match result {
        Err(SyncError::SelectorUnresolved(msg)) => {
            assert!(msg.contains("Chase Checking"));
            assert!(msg.contains("Chase Savings"));
        }
        other => panic!("expected SelectorUnresolved naming both accounts, got {other:?}"),
    }
}
