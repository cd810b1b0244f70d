//! Operation controller
//!
//! Drives one user mutation from request to settled outcome:
//!
//! 1. the session must be `Connected` (no wallet contact otherwise)
//! 2. input is validated locally
//! 3. a pending slot is reserved for the account; a second mutation
//!    while one is pending fails with `OperationInProgress`
//! 4. a signer is acquired and the transaction submitted
//! 5. confirmation is awaited under the configured polling bound
//! 6. the slot is released and, on confirmation only, the store is
//!    refreshed with a result no older than the confirmation
//! 7. the outcome is reported on the notification channel
//!
//! A timed-out transaction is not rolled back; the next refresh picks it
//! up if it lands.

use std::collections::HashMap;
use std::sync::Arc;

use chaintask_core::effects::PhysicalTimeEffects;
use chaintask_core::{
    Address, PendingOperation, SigningHandle, TaskError, TaskId, TaskResult, TransactionHandle,
    TxHash,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::contract::{ensure_deletable, ContractClient, NewTask};
use crate::gateway::ProviderGateway;
use crate::notifications::{Notifier, OperationKind};
use crate::session::SessionManager;
use crate::store::TaskStore;

type PendingMap = Arc<Mutex<HashMap<Address, PendingOperation>>>;

/// Reservation of the per-account pending slot. Released on drop.
struct PendingSlot {
    pending: PendingMap,
    account: Address,
}

impl PendingSlot {
    fn record_tx(&self, hash: TxHash) {
        if let Some(op) = self.pending.lock().get_mut(&self.account) {
            op.tx = Some(hash);
        }
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.account);
    }
}

/// Runs create and delete operations one at a time per account.
pub struct OperationController {
    session: Arc<SessionManager>,
    gateway: Arc<ProviderGateway>,
    client: Arc<ContractClient>,
    store: Arc<TaskStore>,
    notifier: Arc<Notifier>,
    time: Arc<dyn PhysicalTimeEffects>,
    pending: PendingMap,
}

impl OperationController {
    /// Wire a controller over the shared components.
    pub fn new(
        session: Arc<SessionManager>,
        gateway: Arc<ProviderGateway>,
        client: Arc<ContractClient>,
        store: Arc<TaskStore>,
        notifier: Arc<Notifier>,
        time: Arc<dyn PhysicalTimeEffects>,
    ) -> Self {
        Self {
            session,
            gateway,
            client,
            store,
            notifier,
            time,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The unsettled mutation for `account`, if any.
    pub fn pending_operation(&self, account: &Address) -> Option<PendingOperation> {
        self.pending.lock().get(account).cloned()
    }

    /// Create a task and report the outcome.
    pub async fn create_task(&self, title: &str, body: &str) -> TaskResult<()> {
        let result = self.run_create(title, body).await;
        self.notifier.report(OperationKind::Create, &result);
        result
    }

    /// Delete a cached task and report the outcome.
    pub async fn delete_task(&self, id: TaskId) -> TaskResult<()> {
        let result = self.run_delete(id).await;
        self.notifier.report(OperationKind::Delete, &result);
        result
    }

    async fn run_create(&self, title: &str, body: &str) -> TaskResult<()> {
        let account = self.require_connected()?;
        let task = NewTask::parse(title, body)?;
        let now = self.time.now_ms().await;
        let slot = self.reserve(account, PendingOperation::create(now))?;

        let signer = self.acquire_signer(account).await?;
        let tx = self.client.submit_create(&signer, &task).await?;
        slot.record_tx(tx.hash);
        self.settle(slot, &tx).await
    }

    async fn run_delete(&self, id: TaskId) -> TaskResult<()> {
        let account = self.require_connected()?;
        ensure_deletable(id, &self.store.snapshot())?;
        let now = self.time.now_ms().await;
        let slot = self.reserve(account, PendingOperation::delete(id, now))?;

        let signer = self.acquire_signer(account).await?;
        let tx = self.client.submit_delete(&signer, id).await?;
        slot.record_tx(tx.hash);
        self.settle(slot, &tx).await
    }

    fn require_connected(&self) -> TaskResult<Address> {
        self.session.account().ok_or(TaskError::NotConnected)
    }

    fn reserve(&self, account: Address, op: PendingOperation) -> TaskResult<PendingSlot> {
        let mut pending = self.pending.lock();
        if pending.contains_key(&account) {
            debug!(account = %account, "rejecting mutation while another is pending");
            return Err(TaskError::OperationInProgress { account });
        }
        debug!(account = %account, kind = %op.kind, "pending operation registered");
        pending.insert(account, op);
        Ok(PendingSlot {
            pending: Arc::clone(&self.pending),
            account,
        })
    }

    async fn acquire_signer(&self, account: Address) -> TaskResult<SigningHandle> {
        let signer = self.gateway.acquire_signer().await?;
        if signer.account() != account {
            warn!(
                expected = %account,
                actual = %signer.account(),
                "wallet account changed before signing"
            );
            return Err(TaskError::SessionChanged);
        }
        Ok(signer)
    }

    async fn settle(&self, slot: PendingSlot, tx: &TransactionHandle) -> TaskResult<()> {
        let confirmed = self.client.wait_for_confirmation(tx).await;
        drop(slot);
        confirmed?;
        info!(tx = %tx.hash, kind = %tx.kind, "mutation settled");

        let refreshed = self.store.reload().await;
        if let Err(err) = &refreshed {
            warn!(tx = %tx.hash, error = %err, "refresh after confirmation failed");
            self.notifier.report(OperationKind::Refresh, &refreshed);
        }
        Ok(())
    }
}
