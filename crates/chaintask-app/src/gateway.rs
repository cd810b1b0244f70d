//! Provider gateway
//!
//! Wraps the injected wallet and turns its account requests into typed
//! handles. The silent `eth_accounts` probe is always tried first, so a
//! prompt is shown only when the wallet has no prior grant for this site.
//! Repeated calls within a session therefore resolve without prompting.

use std::sync::Arc;

use chaintask_core::effects::{RpcRequest, WalletEffects};
use chaintask_core::{Address, ConnectionHandle, SigningHandle, TaskError, TaskResult};
use serde_json::Value;
use tracing::{debug, info};

/// Typed access to the injected wallet provider.
pub struct ProviderGateway {
    wallet: Arc<dyn WalletEffects>,
}

impl ProviderGateway {
    /// Create a gateway over an injected wallet.
    pub fn new(wallet: Arc<dyn WalletEffects>) -> Self {
        Self { wallet }
    }

    /// Silent probe: accounts the wallet already exposes to us, never prompts.
    pub async fn probe(&self) -> TaskResult<Vec<Address>> {
        self.ensure_installed()?;
        let value = self.wallet.request(RpcRequest::accounts()).await?;
        parse_accounts(value)
    }

    /// Resolve read-only access for the selected account.
    pub async fn acquire_connection(&self) -> TaskResult<ConnectionHandle> {
        self.resolve_account().await.map(ConnectionHandle::new)
    }

    /// Resolve a signing capability for the selected account.
    pub async fn acquire_signer(&self) -> TaskResult<SigningHandle> {
        self.resolve_account().await.map(SigningHandle::new)
    }

    fn ensure_installed(&self) -> TaskResult<()> {
        if self.wallet.is_installed() {
            Ok(())
        } else {
            Err(TaskError::NoWallet)
        }
    }

    async fn resolve_account(&self) -> TaskResult<Address> {
        if let Some(account) = self.probe().await?.first() {
            return Ok(*account);
        }

        debug!("no prior wallet grant, requesting accounts");
        let value = self.wallet.request(RpcRequest::request_accounts()).await?;
        // An empty grant after the prompt means the user picked no account.
        let account = parse_accounts(value)?
            .first()
            .copied()
            .ok_or(TaskError::UserRejected)?;
        info!(account = %account, "wallet granted account access");
        Ok(account)
    }
}

fn parse_accounts(value: Value) -> TaskResult<Vec<Address>> {
    serde_json::from_value(value)
        .map_err(|e| TaskError::remote(format!("malformed account list: {e}")))
}
