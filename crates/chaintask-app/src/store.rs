//! Task store
//!
//! Read-through cache of the connected account's visible tasks. The list
//! is only ever replaced wholesale by a refresh; readers get an
//! `Arc<[Task]>` snapshot and never see a half-applied update.
//!
//! Every fetch is tagged with a sequence number and the session epoch it
//! was issued under. A result is applied only when its epoch is still
//! current and its sequence is newer than the last one applied, so a slow
//! read can never overwrite a fresher one or leak into another session.

use std::sync::Arc;

use async_trait::async_trait;
use chaintask_core::{visible_tasks, Address, Task, TaskError, TaskId, TaskResult, WalletSession};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::contract::ContractClient;
use crate::notifications::{Notifier, OperationKind};
use crate::session::SessionListener;

type RefreshFuture = Shared<BoxFuture<'static, TaskResult<Arc<[Task]>>>>;

struct InFlight {
    seq: u64,
    future: RefreshFuture,
}

struct StoreState {
    owner: Option<Address>,
    items: Arc<[Task]>,
    epoch: u64,
    next_seq: u64,
    applied_seq: u64,
    in_flight: Option<InFlight>,
}

/// Cache of the current owner's visible tasks.
pub struct TaskStore {
    client: Arc<ContractClient>,
    notifier: Arc<Notifier>,
    state: Arc<Mutex<StoreState>>,
}

impl TaskStore {
    /// Create an empty store with no owner. Failed loads on session change
    /// are reported through `notifier`.
    pub fn new(client: Arc<ContractClient>, notifier: Arc<Notifier>) -> Self {
        Self {
            client,
            notifier,
            state: Arc::new(Mutex::new(StoreState {
                owner: None,
                items: Arc::from(Vec::new()),
                epoch: 0,
                next_seq: 1,
                applied_seq: 0,
                in_flight: None,
            })),
        }
    }

    /// Account whose tasks are cached.
    pub fn owner(&self) -> Option<Address> {
        self.state.lock().owner
    }

    /// Current task list.
    pub fn snapshot(&self) -> Arc<[Task]> {
        Arc::clone(&self.state.lock().items)
    }

    /// Whether `id` is in the current list.
    pub fn contains(&self, id: TaskId) -> bool {
        self.state.lock().items.iter().any(|task| task.id == id)
    }

    /// Refresh from the contract, joining a fetch already in flight.
    pub async fn refresh(&self) -> TaskResult<Arc<[Task]>> {
        let future = self.join_or_start(true)?;
        future.await
    }

    /// Refresh with a fetch issued now, never one already in flight.
    ///
    /// Used after a mutation confirms: an older fetch may have read the
    /// chain before the change landed. Later `refresh` calls join this one.
    pub async fn reload(&self) -> TaskResult<Arc<[Task]>> {
        let future = self.join_or_start(false)?;
        future.await
    }

    /// Reset for a new owner (or none). Drops cached items and orphans any
    /// fetch issued for the previous owner.
    pub fn invalidate(&self, owner: Option<Address>) {
        let mut state = self.state.lock();
        state.owner = owner;
        state.items = Arc::from(Vec::new());
        state.epoch += 1;
        state.in_flight = None;
        debug!(epoch = state.epoch, "task cache invalidated");
    }

    fn join_or_start(&self, join: bool) -> TaskResult<RefreshFuture> {
        let mut state = self.state.lock();
        let owner = state.owner.ok_or(TaskError::NotConnected)?;

        if let Some(in_flight) = state.in_flight.as_ref().filter(|_| join) {
            debug!(seq = in_flight.seq, "joining in-flight refresh");
            return Ok(in_flight.future.clone());
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let epoch = state.epoch;
        let future = fetch(
            Arc::clone(&self.client),
            Arc::clone(&self.state),
            owner,
            seq,
            epoch,
        )
        .boxed()
        .shared();
        state.in_flight = Some(InFlight {
            seq,
            future: future.clone(),
        });
        Ok(future)
    }
}

async fn fetch(
    client: Arc<ContractClient>,
    state: Arc<Mutex<StoreState>>,
    owner: Address,
    seq: u64,
    epoch: u64,
) -> TaskResult<Arc<[Task]>> {
    let result = client.list_tasks(&owner).await;

    let mut state = state.lock();
    if state.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
        state.in_flight = None;
    }
    if state.epoch != epoch {
        debug!(seq, "discarding refresh from a previous session");
        return Err(TaskError::SessionChanged);
    }
    let records = result?;
    if seq <= state.applied_seq {
        debug!(seq, applied = state.applied_seq, "discarding stale refresh");
        return Ok(Arc::clone(&state.items));
    }

    let items: Arc<[Task]> = visible_tasks(records).into();
    state.applied_seq = seq;
    state.items = Arc::clone(&items);
    debug!(owner = %owner, seq, count = items.len(), "task cache replaced");
    Ok(items)
}

#[async_trait]
impl SessionListener for TaskStore {
    async fn on_session_change(&self, session: &WalletSession) {
        match session {
            WalletSession::Connected { account } => {
                self.invalidate(Some(*account));
                let result = self.refresh().await;
                match &result {
                    // A newer session change owns the next load.
                    Err(TaskError::SessionChanged) => {}
                    Err(err) => {
                        warn!(account = %account, error = %err, "initial task load failed");
                        self.notifier.report(OperationKind::Refresh, &result);
                    }
                    Ok(_) => {}
                }
            }
            WalletSession::Disconnected => self.invalidate(None),
            WalletSession::Connecting => {}
        }
    }
}
