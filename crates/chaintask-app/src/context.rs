//! Application context
//!
//! One `AppContext` per open page: it owns the session, the task cache and
//! the controller, and is the only surface presentation talks to.

use std::sync::Arc;

use chaintask_core::effects::{PhysicalTimeEffects, TaskContractEffects, WalletEffects};
use chaintask_core::{
    Address, AppConfig, PendingOperation, SystemTimeHandler, Task, TaskError, TaskId,
    TaskResult, WalletSession,
};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::contract::ContractClient;
use crate::controller::OperationController;
use crate::gateway::ProviderGateway;
use crate::notifications::{Notification, Notifier, OperationKind};
use crate::session::{SessionListener, SessionManager};
use crate::store::TaskStore;

/// Builder for [`AppContext`].
#[derive(Default)]
pub struct AppContextBuilder {
    config: AppConfig,
    wallet: Option<Arc<dyn WalletEffects>>,
    contract: Option<Arc<dyn TaskContractEffects>>,
    time: Option<Arc<dyn PhysicalTimeEffects>>,
}

impl AppContextBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of the defaults.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Injected wallet provider.
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletEffects>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Contract transport.
    pub fn with_contract(mut self, contract: Arc<dyn TaskContractEffects>) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Clock; defaults to [`SystemTimeHandler`].
    pub fn with_time(mut self, time: Arc<dyn PhysicalTimeEffects>) -> Self {
        self.time = Some(time);
        self
    }

    /// Validate the configuration and wire the components.
    pub fn build(self) -> TaskResult<AppContext> {
        self.config.validate()?;
        let wallet = self
            .wallet
            .ok_or_else(|| TaskError::config("a wallet provider is required"))?;
        let contract = self
            .contract
            .ok_or_else(|| TaskError::config("a contract transport is required"))?;
        let time = self
            .time
            .unwrap_or_else(|| Arc::new(SystemTimeHandler::new()));

        let gateway = Arc::new(ProviderGateway::new(wallet));
        let session = Arc::new(SessionManager::new(Arc::clone(&gateway)));
        let client = Arc::new(ContractClient::new(
            contract,
            Arc::clone(&time),
            self.config.contract.address,
            self.config.confirmation,
        ));
        let notifier = Arc::new(Notifier::new(self.config.notifications.capacity));
        let store = Arc::new(TaskStore::new(Arc::clone(&client), Arc::clone(&notifier)));
        session.add_listener(Arc::clone(&store) as Arc<dyn SessionListener>);
        let controller = OperationController::new(
            Arc::clone(&session),
            gateway,
            client,
            Arc::clone(&store),
            Arc::clone(&notifier),
            time,
        );

        info!(contract = %self.config.contract.address, "app context ready");
        Ok(AppContext {
            config: self.config,
            session,
            store,
            controller,
            notifier,
        })
    }
}

/// Process-scoped wiring of the synchronization core.
pub struct AppContext {
    config: AppConfig,
    session: Arc<SessionManager>,
    store: Arc<TaskStore>,
    controller: OperationController,
    notifier: Arc<Notifier>,
}

impl AppContext {
    /// Shortcut for [`AppContextBuilder::new`].
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Page-load probe. Connects silently when the wallet already granted
    /// access; failures are reported and leave the session disconnected.
    pub async fn start(&self) -> TaskResult<WalletSession> {
        let result = self.session.probe().await;
        if let Err(err) = &result {
            warn!(error = %err, "startup probe failed");
            self.notifier.report(OperationKind::Connect, &result);
        }
        result
    }

    /// User-initiated connect.
    pub async fn connect(&self) -> TaskResult<Address> {
        let result = self.session.connect().await;
        self.notifier.report(OperationKind::Connect, &result);
        result
    }

    /// Create a task with the given title and body.
    pub async fn create_task(&self, title: &str, body: &str) -> TaskResult<()> {
        self.controller.create_task(title, body).await
    }

    /// Delete a task shown in the current list.
    pub async fn delete_task(&self, id: TaskId) -> TaskResult<()> {
        self.controller.delete_task(id).await
    }

    /// Manual refresh of the task list.
    pub async fn refresh(&self) -> TaskResult<Arc<[Task]>> {
        let result = self.store.refresh().await;
        self.notifier.report(OperationKind::Refresh, &result);
        result
    }

    /// Forward a wallet `accountsChanged` event.
    pub async fn handle_accounts_changed(&self, accounts: &[Address]) {
        self.session.handle_accounts_changed(accounts).await;
    }

    /// Drop the session and the cached tasks.
    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    /// Teardown on page close.
    pub async fn shutdown(&self) {
        self.session.disconnect().await;
        self.store.invalidate(None);
        info!("app context shut down");
    }

    /// Current session.
    pub fn session(&self) -> WalletSession {
        self.session.current()
    }

    /// Current visible tasks.
    pub fn tasks(&self) -> Arc<[Task]> {
        self.store.snapshot()
    }

    /// Unsettled mutation for the connected account, if any.
    pub fn pending_operation(&self) -> Option<PendingOperation> {
        let account = self.session.account()?;
        self.controller.pending_operation(&account)
    }

    /// Follow session changes.
    pub fn subscribe_session(&self) -> watch::Receiver<WalletSession> {
        self.session.subscribe()
    }

    /// Follow operation outcomes.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }
}
