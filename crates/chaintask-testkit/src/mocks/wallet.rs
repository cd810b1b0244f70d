//! Scriptable wallet provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chaintask_core::effects::{RpcRequest, WalletEffects, ETH_ACCOUNTS, ETH_REQUEST_ACCOUNTS};
use chaintask_core::{Address, ProviderError};
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::contract::Gate;

struct WalletState {
    selected: Address,
    granted: bool,
    approve_prompts: bool,
    fail_next: Option<ProviderError>,
    prompt_gate: Option<Arc<Gate>>,
    requests: HashMap<String, usize>,
}

/// In-memory wallet with one selected account and a site grant flag.
///
/// `eth_accounts` returns the selected account only once the site has been
/// granted access. `eth_requestAccounts` grants access if prompts are
/// approved and fails with code 4001 otherwise.
pub struct MockWallet {
    installed: bool,
    state: Mutex<WalletState>,
}

impl MockWallet {
    /// Installed wallet with `account` selected and no grant yet.
    pub fn new(account: Address) -> Self {
        Self {
            installed: true,
            state: Mutex::new(WalletState {
                selected: account,
                granted: false,
                approve_prompts: true,
                fail_next: None,
                prompt_gate: None,
                requests: HashMap::new(),
            }),
        }
    }

    /// Host with no wallet injected.
    pub fn not_installed() -> Self {
        let mut wallet = Self::new(Address::from_bytes([0; 20]));
        wallet.installed = false;
        wallet
    }

    /// Site already granted access in an earlier visit.
    pub fn with_prior_grant(self) -> Self {
        self.state.lock().granted = true;
        self
    }

    /// Whether the user approves connection prompts.
    pub fn set_approve_prompts(&self, approve: bool) {
        self.state.lock().approve_prompts = approve;
    }

    /// Fail the next request with `error`.
    pub fn fail_next_request(&self, error: ProviderError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Keep the next connection prompt open until the gate is opened.
    /// The user's answer is read when it closes.
    pub fn hold_next_prompt(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state.lock().prompt_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Revoke the site grant from the wallet UI. Returns the
    /// `accountsChanged` payload the wallet would emit.
    pub fn revoke(&self) -> Vec<Address> {
        self.state.lock().granted = false;
        Vec::new()
    }

    /// Select another account in the wallet UI. Returns the
    /// `accountsChanged` payload the wallet would emit.
    pub fn switch_account(&self, account: Address) -> Vec<Address> {
        let mut state = self.state.lock();
        state.selected = account;
        if state.granted {
            vec![account]
        } else {
            Vec::new()
        }
    }

    /// Account currently selected in the wallet.
    pub fn selected(&self) -> Address {
        self.state.lock().selected
    }

    /// Number of requests received for `method`.
    pub fn request_count(&self, method: &str) -> usize {
        self.state.lock().requests.get(method).copied().unwrap_or(0)
    }

    /// Number of connection prompts shown.
    pub fn prompt_count(&self) -> usize {
        self.request_count(ETH_REQUEST_ACCOUNTS)
    }
}

fn accounts_value(accounts: &[Address]) -> Value {
    json!(accounts.iter().map(ToString::to_string).collect::<Vec<_>>())
}

#[async_trait]
impl WalletEffects for MockWallet {
    fn is_installed(&self) -> bool {
        self.installed
    }

    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        let gate = {
            let mut state = self.state.lock();
            *state.requests.entry(request.method.clone()).or_default() += 1;
            if let Some(error) = state.fail_next.take() {
                return Err(error);
            }
            if request.method == ETH_REQUEST_ACCOUNTS {
                state.prompt_gate.take()
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            gate.wait().await;
        }

        let mut state = self.state.lock();
        match request.method.as_str() {
            ETH_ACCOUNTS if state.granted => Ok(accounts_value(&[state.selected])),
            ETH_ACCOUNTS => Ok(accounts_value(&[])),
            ETH_REQUEST_ACCOUNTS if state.approve_prompts => {
                state.granted = true;
                Ok(accounts_value(&[state.selected]))
            }
            ETH_REQUEST_ACCOUNTS => Err(ProviderError::user_rejected()),
            other => Err(ProviderError::new(
                -32601,
                format!("method {other} not supported"),
            )),
        }
    }
}
