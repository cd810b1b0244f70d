//! Session manager
//!
//! Owns the [`WalletSession`] state machine:
//!
//! ```text
//! Disconnected --connect() succeeds------------> Connected
//! Disconnected --probe finds prior grant-------> Connected
//! Connected    --accounts list becomes empty---> Disconnected
//! Connected    --disconnect()------------------> Disconnected
//! Connected    --accounts switch to another----> Connected (new account)
//! ```
//!
//! `Connecting` is transient and only guards against duplicate connect
//! requests: a second `connect()` while one is in flight awaits the same
//! result. A failed connect returns the session to where it was. A connect
//! overtaken by a disconnect or an account switch while the prompt was open
//! fails with `SessionChanged` and leaves the newer state in place.
//!
//! Listeners are told about every change between `Disconnected` and
//! `Connected`; presentation can also follow every state through
//! [`SessionManager::subscribe`].

use std::sync::Arc;

use async_trait::async_trait;
use chaintask_core::{Address, TaskError, TaskResult, WalletSession};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::gateway::ProviderGateway;

/// Receives session changes.
#[async_trait]
pub trait SessionListener: Send + Sync {
    /// Called after the session moved to `Connected` or `Disconnected`.
    async fn on_session_change(&self, session: &WalletSession);
}

type ConnectFuture = Shared<BoxFuture<'static, TaskResult<Address>>>;

struct SessionState {
    session: WalletSession,
    connecting: Option<ConnectFuture>,
}

/// Tracks wallet connection state and the active account.
pub struct SessionManager {
    gateway: Arc<ProviderGateway>,
    state: Mutex<SessionState>,
    updates: watch::Sender<WalletSession>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl SessionManager {
    /// Create a manager in the `Disconnected` state.
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        let (updates, _) = watch::channel(WalletSession::Disconnected);
        Self {
            gateway,
            state: Mutex::new(SessionState {
                session: WalletSession::Disconnected,
                connecting: None,
            }),
            updates,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener for session changes.
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.write().push(listener);
    }

    /// Current session.
    pub fn current(&self) -> WalletSession {
        self.state.lock().session.clone()
    }

    /// The active account, if connected.
    pub fn account(&self) -> Option<Address> {
        self.state.lock().session.account()
    }

    /// Follow session changes, including the transient `Connecting` state.
    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.updates.subscribe()
    }

    /// Connect, prompting in the wallet if there is no prior grant.
    ///
    /// Returns the connected account. Already connected sessions return
    /// immediately; concurrent calls share one request.
    pub async fn connect(&self) -> TaskResult<Address> {
        let future = {
            let mut state = self.state.lock();
            if let WalletSession::Connected { account } = state.session {
                return Ok(account);
            }
            match &state.connecting {
                Some(in_flight) => {
                    debug!("connect already in flight, awaiting it");
                    in_flight.clone()
                }
                None => {
                    let gateway = Arc::clone(&self.gateway);
                    let request = async move {
                        gateway
                            .acquire_connection()
                            .await
                            .map(|handle| handle.account())
                    }
                    .boxed()
                    .shared();
                    state.connecting = Some(request.clone());
                    state.session = WalletSession::Connecting;
                    self.updates.send_replace(WalletSession::Connecting);
                    request
                }
            }
        };

        let result = future.clone().await;
        self.finish_connect(&future, result).await
    }

    /// Silent startup probe; connects if the wallet already has a grant.
    ///
    /// Also used to re-check a live session: an empty account list while
    /// connected disconnects.
    pub async fn probe(&self) -> TaskResult<WalletSession> {
        let accounts = self.gateway.probe().await?;
        self.apply_accounts(&accounts).await;
        Ok(self.current())
    }

    /// Handle an `accountsChanged` notification from the wallet.
    pub async fn handle_accounts_changed(&self, accounts: &[Address]) {
        self.apply_accounts(accounts).await;
    }

    /// Explicit disconnect.
    pub async fn disconnect(&self) {
        self.transition(WalletSession::Disconnected).await;
    }

    async fn apply_accounts(&self, accounts: &[Address]) {
        match accounts.first() {
            Some(account) => {
                self.transition(WalletSession::Connected { account: *account })
                    .await;
            }
            None => {
                // An open connect prompt also reports no accounts; let it finish.
                let connecting = self.state.lock().connecting.is_some();
                if connecting {
                    return;
                }
                self.transition(WalletSession::Disconnected).await;
            }
        }
    }

    async fn finish_connect(
        &self,
        request: &ConnectFuture,
        result: TaskResult<Address>,
    ) -> TaskResult<Address> {
        let next = {
            let mut state = self.state.lock();
            // Whoever observes the shared result first applies it.
            let applies = state
                .connecting
                .as_ref()
                .is_some_and(|current| current.ptr_eq(request));
            if !applies {
                return match result {
                    Ok(account) if state.session.account() == Some(account) => Ok(account),
                    Ok(account) => {
                        debug!(account = %account, "session changed while connecting");
                        Err(TaskError::SessionChanged)
                    }
                    Err(err) => Err(err),
                };
            }
            state.connecting = None;
            match &result {
                Ok(account) => WalletSession::Connected { account: *account },
                Err(err) => {
                    warn!(error = %err, "wallet connect failed");
                    state.session = WalletSession::Disconnected;
                    self.updates.send_replace(WalletSession::Disconnected);
                    return result;
                }
            }
        };
        self.transition(next).await;
        result
    }

    async fn transition(&self, next: WalletSession) {
        {
            let mut state = self.state.lock();
            state.connecting = None;
            if state.session == next {
                return;
            }
            state.session = next.clone();
        }

        match next.account() {
            Some(account) => info!(account = %account, "wallet session connected"),
            None => info!("wallet session disconnected"),
        }
        self.updates.send_replace(next.clone());

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_session_change(&next).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintask_core::SessionStatus;
    use chaintask_testkit::{alice, bob, MockWallet};

    fn manager(wallet: &Arc<MockWallet>) -> SessionManager {
        SessionManager::new(Arc::new(ProviderGateway::new(wallet.clone())))
    }

    #[tokio::test]
    async fn test_probe_without_grant_stays_disconnected() {
        let wallet = Arc::new(MockWallet::new(alice()));
        let manager = manager(&wallet);
        let session = manager.probe().await.unwrap();
        assert_eq!(session, WalletSession::Disconnected);
        assert_eq!(wallet.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_with_grant_connects_silently() {
        let wallet = Arc::new(MockWallet::new(alice()).with_prior_grant());
        let manager = manager(&wallet);
        let session = manager.probe().await.unwrap();
        assert_eq!(session.account(), Some(alice()));
        assert_eq!(wallet.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_state() {
        let wallet = Arc::new(MockWallet::new(alice()));
        wallet.set_approve_prompts(false);
        let manager = manager(&wallet);
        assert_eq!(manager.connect().await, Err(TaskError::UserRejected));
        assert_eq!(manager.current(), WalletSession::Disconnected);
    }

    #[tokio::test]
    async fn test_concurrent_connects_share_one_prompt() {
        let wallet = Arc::new(MockWallet::new(alice()));
        let manager = manager(&wallet);
        let (a, b) = futures::join!(manager.connect(), manager.connect());
        assert_eq!(a, Ok(alice()));
        assert_eq!(b, Ok(alice()));
        assert_eq!(wallet.prompt_count(), 1);
        assert_eq!(manager.current().status(), SessionStatus::Connected);
    }

    #[tokio::test]
    async fn test_account_switch_and_empty_list() {
        let wallet = Arc::new(MockWallet::new(alice()).with_prior_grant());
        let manager = manager(&wallet);
        let mut updates = manager.subscribe();
        manager.probe().await.unwrap();

        manager.handle_accounts_changed(&[bob()]).await;
        assert_eq!(manager.account(), Some(bob()));

        manager.handle_accounts_changed(&[]).await;
        assert_eq!(manager.current(), WalletSession::Disconnected);
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), WalletSession::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_during_prompt_fails_connect() {
        let wallet = Arc::new(MockWallet::new(alice()));
        let gate = wallet.hold_next_prompt();
        let manager = manager(&wallet);

        let mut connect = Box::pin(manager.connect());
        assert!(futures::poll!(&mut connect).is_pending());
        assert_eq!(manager.current(), WalletSession::Connecting);

        manager.disconnect().await;
        gate.open();
        assert_eq!(connect.await, Err(TaskError::SessionChanged));
        assert_eq!(manager.current(), WalletSession::Disconnected);
    }

    #[tokio::test]
    async fn test_overtaken_connect_leaves_newer_request_alone() {
        let wallet = Arc::new(MockWallet::new(alice()));
        let manager = manager(&wallet);

        let first_gate = wallet.hold_next_prompt();
        let mut first = Box::pin(manager.connect());
        assert!(futures::poll!(&mut first).is_pending());
        manager.disconnect().await;

        let second_gate = wallet.hold_next_prompt();
        let mut second = Box::pin(manager.connect());
        assert!(futures::poll!(&mut second).is_pending());

        first_gate.open();
        assert_eq!(first.await, Err(TaskError::SessionChanged));
        assert_eq!(manager.current(), WalletSession::Connecting);

        second_gate.open();
        assert_eq!(second.await, Ok(alice()));
        assert_eq!(manager.current(), WalletSession::Connected { account: alice() });
        assert_eq!(wallet.prompt_count(), 2);
    }
}
