//! In-memory task contract with manual mining.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chaintask_core::effects::{ContractError, ContractErrorKind, TaskContractEffects, TxStatus};
use chaintask_core::{Address, SigningHandle, TaskId, TaskRecord, TxHash};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Holds a mocked call until opened.
#[derive(Default)]
pub struct Gate {
    open: AtomicBool,
    notify: Notify,
}

impl Gate {
    /// Release every call waiting on this gate.
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub(crate) async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.open.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

enum Mutation {
    Add {
        owner: Address,
        title: String,
        body: String,
    },
    Delete {
        owner: Address,
        id: TaskId,
    },
}

struct PendingTx {
    mutation: Mutation,
    revert: Option<String>,
}

#[derive(Default)]
struct ContractState {
    records: HashMap<Address, Vec<TaskRecord>>,
    pending: Vec<(TxHash, PendingTx)>,
    statuses: HashMap<TxHash, TxStatus>,
    auto_mine: bool,
    next_tx: u64,
    revert_next: Option<String>,
    fail_next: Option<ContractError>,
    fail_next_read: Option<ContractError>,
    reverse_reads: bool,
    next_gate: Option<Arc<Gate>>,
    list_calls: usize,
    status_calls: usize,
    submissions: usize,
}

/// Task contract that keeps per-owner records in memory.
///
/// Ids are the index in the owner's list and are never reused; deletes are
/// soft. Submitted transactions stay `Pending` until [`mine`] unless
/// auto-mining is on, in which case they are applied at submission.
///
/// [`mine`]: InMemoryTaskContract::mine
pub struct InMemoryTaskContract {
    address: Address,
    state: Mutex<ContractState>,
}

impl InMemoryTaskContract {
    /// Contract deployed at `address`, auto-mining on.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(ContractState {
                auto_mine: true,
                ..ContractState::default()
            }),
        }
    }

    /// Replace `owner`'s records.
    pub fn seed(&self, owner: Address, records: Vec<TaskRecord>) {
        self.state.lock().records.insert(owner, records);
    }

    /// Raw records for `owner`, deleted ones included.
    pub fn records(&self, owner: &Address) -> Vec<TaskRecord> {
        self.state
            .lock()
            .records
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    /// Apply transactions at submission (`true`) or only on [`Self::mine`].
    pub fn set_auto_mine(&self, auto_mine: bool) {
        self.state.lock().auto_mine = auto_mine;
    }

    /// Return records in reverse order from `get_my_task`.
    pub fn set_reverse_reads(&self, reverse: bool) {
        self.state.lock().reverse_reads = reverse;
    }

    /// Make the next mined transaction revert with `reason`.
    pub fn revert_next(&self, reason: impl Into<String>) {
        self.state.lock().revert_next = Some(reason.into());
    }

    /// Fail the next call of any method with `error`.
    pub fn fail_next(&self, error: ContractError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Fail the next `get_my_task` with `error`; submissions are unaffected.
    pub fn fail_next_read(&self, error: ContractError) {
        self.state.lock().fail_next_read = Some(error);
    }

    /// Hold the next `get_my_task` after it has read its snapshot.
    pub fn gate_next_read(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state.lock().next_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Mine every pending transaction in submission order.
    pub fn mine(&self) -> usize {
        let mut state = self.state.lock();
        let pending = std::mem::take(&mut state.pending);
        let mined = pending.len();
        for (hash, tx) in pending {
            apply(&mut state, hash, tx);
        }
        mined
    }

    /// Transactions awaiting mining.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of `get_my_task` calls.
    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    /// Number of `transaction_status` calls.
    pub fn status_calls(&self) -> usize {
        self.state.lock().status_calls
    }

    /// Number of accepted submissions.
    pub fn submissions(&self) -> usize {
        self.state.lock().submissions
    }

    fn check(&self, state: &mut ContractState, contract: &Address) -> Result<(), ContractError> {
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        if *contract != self.address {
            return Err(ContractError::new(
                ContractErrorKind::NoContract,
                format!("no contract code at {contract}"),
            ));
        }
        Ok(())
    }

    fn submit(&self, contract: &Address, mutation: Mutation) -> Result<TxHash, ContractError> {
        let mut state = self.state.lock();
        self.check(&mut state, contract)?;

        state.next_tx += 1;
        let mut bytes = [0xab; 32];
        bytes[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        let hash = TxHash::from_bytes(bytes);
        let tx = PendingTx {
            mutation,
            revert: state.revert_next.take(),
        };
        state.submissions += 1;
        if state.auto_mine {
            apply(&mut state, hash, tx);
        } else {
            state.statuses.insert(hash, TxStatus::Pending);
            state.pending.push((hash, tx));
        }
        Ok(hash)
    }
}

fn apply(state: &mut ContractState, hash: TxHash, tx: PendingTx) {
    if let Some(reason) = tx.revert {
        state.statuses.insert(hash, TxStatus::Reverted { reason });
        return;
    }
    let status = match tx.mutation {
        Mutation::Add { owner, title, body } => {
            let records = state.records.entry(owner).or_default();
            let id = records.len() as u64;
            records.push(TaskRecord::new(id, title, body));
            TxStatus::Confirmed
        }
        Mutation::Delete { owner, id } => {
            let record = state
                .records
                .get_mut(&owner)
                .and_then(|records| records.get_mut(id.value() as usize));
            match record {
                Some(record) if !record.is_deleted => {
                    record.is_deleted = true;
                    TxStatus::Confirmed
                }
                _ => TxStatus::Reverted {
                    reason: format!("task {id} does not exist"),
                },
            }
        }
    };
    state.statuses.insert(hash, status);
}

#[async_trait]
impl TaskContractEffects for InMemoryTaskContract {
    async fn add_task(
        &self,
        contract: &Address,
        signer: &SigningHandle,
        body: &str,
        title: &str,
        _flag: bool,
    ) -> Result<TxHash, ContractError> {
        self.submit(
            contract,
            Mutation::Add {
                owner: signer.account(),
                title: title.to_string(),
                body: body.to_string(),
            },
        )
    }

    async fn get_my_task(
        &self,
        contract: &Address,
        caller: &Address,
    ) -> Result<Vec<TaskRecord>, ContractError> {
        let (records, gate) = {
            let mut state = self.state.lock();
            self.check(&mut state, contract)?;
            state.list_calls += 1;
            if let Some(error) = state.fail_next_read.take() {
                return Err(error);
            }
            let mut records = state.records.get(caller).cloned().unwrap_or_default();
            if state.reverse_reads {
                records.reverse();
            }
            (records, state.next_gate.take())
        };
        if let Some(gate) = gate {
            gate.wait().await;
        }
        Ok(records)
    }

    async fn delete_task(
        &self,
        contract: &Address,
        signer: &SigningHandle,
        id: TaskId,
    ) -> Result<TxHash, ContractError> {
        self.submit(
            contract,
            Mutation::Delete {
                owner: signer.account(),
                id,
            },
        )
    }

    async fn transaction_status(
        &self,
        contract: &Address,
        tx: &TxHash,
    ) -> Result<TxStatus, ContractError> {
        let mut state = self.state.lock();
        self.check(&mut state, contract)?;
        state.status_calls += 1;
        state.statuses.get(tx).cloned().ok_or_else(|| {
            ContractError::new(ContractErrorKind::Rpc, format!("unknown transaction {tx}"))
        })
    }
}
