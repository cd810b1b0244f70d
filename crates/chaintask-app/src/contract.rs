//! Contract client
//!
//! Typed façade over the task contract. Input checks run here before any
//! signature prompt or network call; everything the contract or node
//! rejects comes back as [`TaskError::RemoteCall`] with the cause attached.

use std::sync::Arc;

use chaintask_core::effects::{PhysicalTimeEffects, TaskContractEffects, TxStatus};
use chaintask_core::{
    Address, ConfirmationPolicy, MutationKind, SigningHandle, Task, TaskError, TaskId,
    TaskRecord, TaskResult, TransactionHandle,
};
use tracing::{debug, info, warn};

/// Title and body that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    body: String,
}

impl NewTask {
    /// Validate and trim user input. Both fields must be non-empty.
    pub fn parse(title: &str, body: &str) -> TaskResult<Self> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(TaskError::validation("title", "must not be empty"));
        }
        if body.is_empty() {
            return Err(TaskError::validation("body", "must not be empty"));
        }
        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Trimmed body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Check that `id` is one of the tasks currently shown to the user.
pub fn ensure_deletable(id: TaskId, visible: &[Task]) -> TaskResult<()> {
    if visible.iter().any(|task| task.id == id) {
        Ok(())
    } else {
        Err(TaskError::InvalidTarget { id })
    }
}

/// Client for one deployed task contract.
pub struct ContractClient {
    contract: Arc<dyn TaskContractEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
    address: Address,
    policy: ConfirmationPolicy,
}

impl ContractClient {
    /// Create a client for the contract at `address`.
    pub fn new(
        contract: Arc<dyn TaskContractEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
        address: Address,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            contract,
            time,
            address,
            policy,
        }
    }

    /// Contract address this client talks to.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Validate and submit a new task.
    pub async fn create_task(
        &self,
        signer: &SigningHandle,
        title: &str,
        body: &str,
    ) -> TaskResult<TransactionHandle> {
        let task = NewTask::parse(title, body)?;
        self.submit_create(signer, &task).await
    }

    /// Submit an already validated task.
    pub async fn submit_create(
        &self,
        signer: &SigningHandle,
        task: &NewTask,
    ) -> TaskResult<TransactionHandle> {
        // The deployed contract takes the body first and a constant flag.
        let hash = self
            .contract
            .add_task(&self.address, signer, task.body(), task.title(), false)
            .await?;
        info!(account = %signer.account(), tx = %hash, "submitted addTask");
        Ok(TransactionHandle {
            hash,
            kind: MutationKind::Create,
            target: None,
            submitted_at_ms: self.time.now_ms().await,
        })
    }

    /// Every task record owned by `owner`, soft-deleted ones included.
    pub async fn list_tasks(&self, owner: &Address) -> TaskResult<Vec<TaskRecord>> {
        let records = self.contract.get_my_task(&self.address, owner).await?;
        debug!(owner = %owner, count = records.len(), "fetched task records");
        Ok(records)
    }

    /// Submit a delete after checking `id` against the visible tasks.
    pub async fn delete_task(
        &self,
        signer: &SigningHandle,
        id: TaskId,
        visible: &[Task],
    ) -> TaskResult<TransactionHandle> {
        ensure_deletable(id, visible)?;
        self.submit_delete(signer, id).await
    }

    /// Submit a delete without the visibility check.
    pub async fn submit_delete(
        &self,
        signer: &SigningHandle,
        id: TaskId,
    ) -> TaskResult<TransactionHandle> {
        let hash = self
            .contract
            .delete_task(&self.address, signer, id)
            .await?;
        info!(account = %signer.account(), tx = %hash, task = %id, "submitted deleteTask");
        Ok(TransactionHandle {
            hash,
            kind: MutationKind::Delete,
            target: Some(id),
            submitted_at_ms: self.time.now_ms().await,
        })
    }

    /// Poll until the transaction is confirmed, reverted, or the bound is hit.
    ///
    /// A timeout does not cancel anything: the transaction may still land
    /// and will show up on the next refresh.
    pub async fn wait_for_confirmation(&self, tx: &TransactionHandle) -> TaskResult<()> {
        let polls = self.policy.max_polls;
        for attempt in 1..=polls {
            match self
                .contract
                .transaction_status(&self.address, &tx.hash)
                .await?
            {
                TxStatus::Confirmed => {
                    info!(tx = %tx.hash, attempt, "transaction confirmed");
                    return Ok(());
                }
                TxStatus::Reverted { reason } => {
                    warn!(tx = %tx.hash, %reason, "transaction reverted");
                    return Err(TaskError::remote(format!("transaction reverted: {reason}")));
                }
                TxStatus::Pending if attempt < polls => {
                    self.time.sleep_ms(self.policy.poll_interval_ms).await;
                }
                TxStatus::Pending => {}
            }
        }
        warn!(tx = %tx.hash, polls, "confirmation not observed in time");
        Err(TaskError::Timeout { polls })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintask_core::{ErrorKind, TaskRecord, DEFAULT_CONTRACT_ADDRESS};
    use chaintask_testkit::{alice, ControllableTime, InMemoryTaskContract, TEST_EPOCH_MS};

    fn client(contract: &Arc<InMemoryTaskContract>, max_polls: u32) -> ContractClient {
        ContractClient::new(
            contract.clone(),
            Arc::new(ControllableTime::new()),
            DEFAULT_CONTRACT_ADDRESS,
            ConfirmationPolicy {
                max_polls,
                poll_interval_ms: 1_000,
            },
        )
    }

    #[test]
    fn test_new_task_trims_and_validates() {
        let task = NewTask::parse("  Buy milk ", "\t2 litres\n").unwrap();
        assert_eq!(task.title(), "Buy milk");
        assert_eq!(task.body(), "2 litres");

        let err = NewTask::parse("Buy milk", "").unwrap_err();
        assert_eq!(err, TaskError::validation("body", "must not be empty"));

        let err = NewTask::parse("   ", "body").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_ensure_deletable() {
        let visible = vec![Task {
            id: TaskId(3),
            title: "t".into(),
            body: "b".into(),
        }];
        assert!(ensure_deletable(TaskId(3), &visible).is_ok());
        assert_eq!(
            ensure_deletable(TaskId(4), &visible),
            Err(TaskError::InvalidTarget { id: TaskId(4) })
        );
    }

    #[tokio::test]
    async fn test_create_submits_body_first_and_confirms() {
        let contract = Arc::new(InMemoryTaskContract::new(DEFAULT_CONTRACT_ADDRESS));
        let client = client(&contract, 5);
        let signer = SigningHandle::new(alice());

        let tx = client.create_task(&signer, " Title ", " Body ").await.unwrap();
        assert_eq!(tx.kind, MutationKind::Create);
        assert_eq!(tx.submitted_at_ms, TEST_EPOCH_MS);
        client.wait_for_confirmation(&tx).await.unwrap();

        let records = client.list_tasks(&alice()).await.unwrap();
        assert_eq!(records, vec![TaskRecord::new(0, "Title", "Body")]);
    }

    #[tokio::test]
    async fn test_delete_checks_visible_list_first() {
        let contract = Arc::new(InMemoryTaskContract::new(DEFAULT_CONTRACT_ADDRESS));
        let client = client(&contract, 5);
        let signer = SigningHandle::new(alice());

        let err = client.delete_task(&signer, TaskId(0), &[]).await.unwrap_err();
        assert_eq!(err, TaskError::InvalidTarget { id: TaskId(0) });
        assert_eq!(contract.submissions(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_gives_up_after_bound() {
        let contract = Arc::new(InMemoryTaskContract::new(DEFAULT_CONTRACT_ADDRESS));
        contract.set_auto_mine(false);
        let client = client(&contract, 4);
        let signer = SigningHandle::new(alice());

        let tx = client.submit_delete(&signer, TaskId(9)).await.unwrap();
        assert_eq!(tx.target, Some(TaskId(9)));
        assert_eq!(
            client.wait_for_confirmation(&tx).await,
            Err(TaskError::Timeout { polls: 4 })
        );
        assert_eq!(contract.status_calls(), 4);

        // Mined later, the unknown id reverts.
        contract.mine();
        let err = client.wait_for_confirmation(&tx).await.unwrap_err();
        assert!(matches!(err, TaskError::RemoteCall { cause } if cause.contains("reverted")));
    }
}
