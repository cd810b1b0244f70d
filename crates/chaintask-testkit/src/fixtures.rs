//! Named accounts and a fully wired test context.

use std::sync::Arc;

use chaintask_app::{AppContext, AppContextBuilder};
use chaintask_core::{Address, AppConfig, TaskRecord};

use crate::mocks::{InMemoryTaskContract, MockWallet};
use crate::time::ControllableTime;

fn account(tag: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = tag;
    bytes[19] = tag;
    Address::from_bytes(bytes)
}

/// First test account.
pub fn alice() -> Address {
    account(0xa1)
}

/// Second test account.
pub fn bob() -> Address {
    account(0xb0)
}

/// Third test account.
pub fn carol() -> Address {
    account(0xc4)
}

/// `AppContext` over in-memory handlers, with handles to drive them.
pub struct TestHarness {
    /// Context under test
    pub ctx: AppContext,
    /// Wallet provider
    pub wallet: Arc<MockWallet>,
    /// Task contract
    pub contract: Arc<InMemoryTaskContract>,
    /// Clock
    pub time: Arc<ControllableTime>,
}

impl TestHarness {
    /// Default configuration, wallet with `alice()` selected and no grant.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Harness with a custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, MockWallet::new(alice()))
    }

    /// Harness with a prepared wallet.
    pub fn with_wallet(wallet: MockWallet) -> Self {
        Self::build(AppConfig::default(), wallet)
    }

    fn build(config: AppConfig, wallet: MockWallet) -> Self {
        crate::init_test_tracing();
        let wallet = Arc::new(wallet);
        let contract = Arc::new(InMemoryTaskContract::new(config.contract.address));
        let time = Arc::new(ControllableTime::new());
        let ctx = AppContextBuilder::new()
            .with_config(config)
            .with_wallet(wallet.clone())
            .with_contract(contract.clone())
            .with_time(time.clone())
            .build()
            .expect("test configuration is valid");
        Self {
            ctx,
            wallet,
            contract,
            time,
        }
    }

    /// Seed tasks for `owner`.
    pub fn seed(&self, owner: Address, records: Vec<TaskRecord>) {
        self.contract.seed(owner, records);
    }

    /// Connect the selected account; panics if the wallet refuses.
    pub async fn connected(self) -> Self {
        self.ctx.connect().await.expect("wallet connects");
        self
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
