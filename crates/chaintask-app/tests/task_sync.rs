//! Mutations, confirmation and cache reconciliation.

use assert_matches::assert_matches;
use chaintask_app::{OperationKind, Outcome};
use chaintask_core::effects::{ETH_ACCOUNTS, ETH_REQUEST_ACCOUNTS};
use chaintask_core::{
    AppConfig, ContractError, ContractErrorKind, ErrorKind, MutationKind, ProviderError,
    TaskError, TaskId, TaskRecord,
};
use chaintask_testkit::{alice, bob, TestHarness, TEST_EPOCH_MS};

fn ids(h: &TestHarness) -> Vec<u64> {
    h.ctx.tasks().iter().map(|t| t.id.value()).collect()
}

fn seeded(count: u64) -> Vec<TaskRecord> {
    (0..count)
        .map(|i| TaskRecord::new(i, format!("task {i}"), format!("body {i}")))
        .collect()
}

#[tokio::test]
async fn test_create_confirms_and_refreshes() {
    let h = TestHarness::new().connected().await;
    let mut notes = h.ctx.subscribe_notifications();

    h.ctx.create_task("  Title ", "Body\n").await.unwrap();

    let tasks = h.ctx.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Title");
    assert_eq!(tasks[0].body, "Body");
    assert!(h.ctx.pending_operation().is_none());

    let note = notes.try_recv().unwrap();
    assert_eq!(note.operation, OperationKind::Create);
    assert_eq!(note.outcome, Outcome::Success);
}

#[tokio::test]
async fn test_create_requires_connection() {
    let h = TestHarness::new();
    let mut notes = h.ctx.subscribe_notifications();

    assert_eq!(h.ctx.create_task("t", "b").await, Err(TaskError::NotConnected));
    assert_eq!(h.wallet.request_count(ETH_ACCOUNTS), 0);
    assert_eq!(h.contract.submissions(), 0);
    assert_matches!(
        notes.try_recv().unwrap().outcome,
        Outcome::Failure { kind: ErrorKind::NotConnected, .. }
    );
}

#[tokio::test]
async fn test_empty_body_fails_locally() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(2));
    let h = h.connected().await;
    let before = h.ctx.tasks();
    let wallet_calls = h.wallet.request_count(ETH_ACCOUNTS);

    let err = h.ctx.create_task("Buy milk", "").await.unwrap_err();
    assert_eq!(err, TaskError::validation("body", "must not be empty"));
    assert_eq!(h.wallet.request_count(ETH_ACCOUNTS), wallet_calls);
    assert_eq!(h.wallet.request_count(ETH_REQUEST_ACCOUNTS), 1);
    assert_eq!(h.contract.submissions(), 0);
    assert_eq!(h.ctx.tasks(), before);
}

#[tokio::test]
async fn test_delete_removes_task_after_refresh() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(5));
    let h = h.connected().await;
    assert!(ids(&h).contains(&3));

    h.ctx.delete_task(TaskId(3)).await.unwrap();
    assert_eq!(ids(&h), vec![0, 1, 2, 4]);

    h.ctx.refresh().await.unwrap();
    assert_eq!(ids(&h), vec![0, 1, 2, 4]);
    assert!(h.contract.records(&alice())[3].is_deleted);
}

#[tokio::test]
async fn test_delete_unknown_id_is_rejected_locally() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(2));
    let h = h.connected().await;

    assert_eq!(
        h.ctx.delete_task(TaskId(7)).await,
        Err(TaskError::InvalidTarget { id: TaskId(7) })
    );
    assert_eq!(h.contract.submissions(), 0);
}

#[tokio::test]
async fn test_refresh_is_idempotent_and_hides_deleted() {
    let h = TestHarness::new();
    let mut records = seeded(4);
    records[1].is_deleted = true;
    h.seed(alice(), records);
    h.contract.set_reverse_reads(true);
    let h = h.connected().await;

    let first = h.ctx.refresh().await.unwrap();
    let second = h.ctx.refresh().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(ids(&h), vec![3, 2, 0]);
}

#[tokio::test]
async fn test_concurrent_refreshes_collapse() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(1));
    let h = h.connected().await;
    let reads = h.contract.list_calls();

    let gate = h.contract.gate_next_read();
    let (a, b, ()) = futures::join!(h.ctx.refresh(), h.ctx.refresh(), async {
        tokio::task::yield_now().await;
        gate.open();
    });
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(h.contract.list_calls(), reads + 1);
}

#[tokio::test]
async fn test_refresh_after_confirmation_does_not_reuse_older_read() {
    let h = TestHarness::new().connected().await;
    let gate = h.contract.gate_next_read();

    // A manual refresh that read the chain before the create lands.
    let mut stale = Box::pin(h.ctx.refresh());
    assert!(futures::poll!(&mut stale).is_pending());

    h.ctx.create_task("Title", "Body").await.unwrap();
    assert_eq!(h.ctx.tasks().len(), 1);

    gate.open();
    stale.await.unwrap();
    assert_eq!(h.ctx.tasks().len(), 1, "older read must not overwrite");
}

#[tokio::test]
async fn test_timeout_then_reconciled_by_refresh() {
    let h = TestHarness::new().connected().await;
    h.contract.set_auto_mine(false);
    let mut notes = h.ctx.subscribe_notifications();

    let err = h.ctx.create_task("Title", "Body").await.unwrap_err();
    assert_eq!(err, TaskError::Timeout { polls: 60 });
    assert_eq!(h.time.sleep_count(), 59);
    assert_eq!(h.contract.status_calls(), 60);
    assert_eq!(h.time.now(), TEST_EPOCH_MS + 59_000);
    assert!(h.ctx.tasks().is_empty());
    assert!(h.ctx.pending_operation().is_none());
    assert_matches!(
        notes.try_recv().unwrap().outcome,
        Outcome::Failure { kind: ErrorKind::Timeout, .. }
    );

    // The transaction lands later; no rollback happened.
    assert_eq!(h.contract.mine(), 1);
    let tasks = h.ctx.refresh().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Title");
}

#[tokio::test]
async fn test_poll_bound_follows_configuration() {
    let mut config = AppConfig::default();
    config.confirmation.max_polls = 3;
    config.confirmation.poll_interval_ms = 250;
    let h = TestHarness::with_config(config).connected().await;
    h.contract.set_auto_mine(false);

    assert_eq!(
        h.ctx.create_task("t", "b").await,
        Err(TaskError::Timeout { polls: 3 })
    );
    assert_eq!(h.time.sleep_count(), 2);
}

#[tokio::test]
async fn test_second_mutation_rejected_while_pending() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(2));
    let h = h.connected().await;
    h.contract.set_auto_mine(false);
    let before = h.ctx.tasks();

    let mut first = Box::pin(h.ctx.create_task("first", "b"));
    assert!(futures::poll!(&mut first).is_pending());

    let pending = h.ctx.pending_operation().unwrap();
    assert_eq!(pending.kind, MutationKind::Create);
    assert_eq!(pending.submitted_at_ms, TEST_EPOCH_MS);
    assert!(pending.tx.is_some());

    assert_eq!(
        h.ctx.delete_task(TaskId(0)).await,
        Err(TaskError::OperationInProgress { account: alice() })
    );
    assert_eq!(
        h.ctx.create_task("second", "b").await,
        Err(TaskError::OperationInProgress { account: alice() })
    );
    assert_eq!(h.ctx.tasks(), before);
    assert_eq!(h.contract.submissions(), 1);
    assert_eq!(h.contract.pending_count(), 1);

    h.contract.mine();
    first.await.unwrap();
    assert_eq!(h.ctx.tasks().len(), 3);
    assert!(h.ctx.pending_operation().is_none());
}

#[tokio::test]
async fn test_revert_is_remote_failure_without_refresh() {
    let h = TestHarness::new().connected().await;
    h.contract.revert_next("out of gas");
    let reads = h.contract.list_calls();

    let err = h.ctx.create_task("t", "b").await.unwrap_err();
    assert_matches!(&err, TaskError::RemoteCall { cause } if cause.contains("out of gas"));
    assert_eq!(h.contract.list_calls(), reads);
    assert!(h.ctx.pending_operation().is_none());
}

#[tokio::test]
async fn test_submission_failure_keeps_cause_and_cache() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(1));
    let h = h.connected().await;
    h.contract.fail_next(ContractError::new(
        ContractErrorKind::InsufficientFunds,
        "insufficient funds for gas",
    ));

    let err = h.ctx.delete_task(TaskId(0)).await.unwrap_err();
    assert_matches!(&err, TaskError::RemoteCall { cause } if cause.contains("insufficient funds"));
    assert_eq!(ids(&h), vec![0]);

    // Nothing is retried; a new request goes through.
    h.ctx.delete_task(TaskId(0)).await.unwrap();
    assert!(h.ctx.tasks().is_empty());
}

#[tokio::test]
async fn test_wallet_rejection_during_signing() {
    let h = TestHarness::new().connected().await;
    h.wallet.fail_next_request(ProviderError::user_rejected());

    assert_eq!(h.ctx.create_task("t", "b").await, Err(TaskError::UserRejected));
    assert!(h.ctx.pending_operation().is_none());
    assert_eq!(h.contract.submissions(), 0);
}

#[tokio::test]
async fn test_failed_settlement_refresh_is_reported_separately() {
    let h = TestHarness::new().connected().await;
    let mut notes = h.ctx.subscribe_notifications();

    h.contract
        .fail_next_read(ContractError::new(ContractErrorKind::Rpc, "node unavailable"));

    // The mutation itself confirmed, so it still succeeds.
    h.ctx.create_task("t", "b").await.unwrap();
    assert!(h.ctx.tasks().is_empty());

    let refresh = notes.try_recv().unwrap();
    assert_eq!(refresh.operation, OperationKind::Refresh);
    assert!(!refresh.outcome.is_success());
    let created = notes.try_recv().unwrap();
    assert_eq!(created.operation, OperationKind::Create);
    assert!(created.outcome.is_success());
}

#[tokio::test]
async fn test_wallet_account_changed_before_signing_submits_nothing() {
    let h = TestHarness::new();
    h.seed(alice(), seeded(2));
    let h = h.connected().await;
    let mut notes = h.ctx.subscribe_notifications();

    // The wallet moved on but its accountsChanged event has not arrived yet.
    h.wallet.switch_account(bob());

    assert_eq!(h.ctx.create_task("t", "b").await, Err(TaskError::SessionChanged));
    assert_eq!(h.ctx.delete_task(TaskId(0)).await, Err(TaskError::SessionChanged));
    assert_eq!(h.contract.submissions(), 0);
    assert!(h.ctx.pending_operation().is_none());
    assert_eq!(ids(&h), vec![0, 1]);
    assert_matches!(
        notes.try_recv().unwrap().outcome,
        Outcome::Failure { kind: ErrorKind::SessionChanged, .. }
    );
}
