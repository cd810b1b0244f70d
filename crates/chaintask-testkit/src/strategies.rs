//! Property test strategies for chaintask types

use proptest::prelude::*;

pub use proptest;

use chaintask_core::{Address, TaskId, TaskRecord};

use crate::fixtures::{alice, bob, carol};

/// Any address.
pub fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// One of the three fixture accounts, so switches repeat accounts.
pub fn arb_known_account() -> impl Strategy<Value = Address> {
    prop_oneof![Just(alice()), Just(bob()), Just(carol())]
}

/// Record list with ids `0..n` and random soft-delete flags.
pub fn arb_records(max: usize) -> impl Strategy<Value = Vec<TaskRecord>> {
    proptest::collection::vec(any::<bool>(), 0..max).prop_map(|flags| {
        flags
            .into_iter()
            .enumerate()
            .map(|(i, deleted)| TaskRecord {
                id: TaskId(i as u64),
                task_title: format!("task {i}"),
                task_text: format!("body of task {i}"),
                is_deleted: deleted,
            })
            .collect()
    })
}

/// Something the user or the wallet does to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User presses connect
    Connect,
    /// User disconnects in the app
    Disconnect,
    /// Page-load style silent probe
    Probe,
    /// Wallet selects another account
    SwitchAccount(Address),
    /// Wallet revokes the site grant
    Revoke,
    /// Next prompt is approved or rejected
    SetApprove(bool),
}

/// Any session event over the fixture accounts.
pub fn arb_session_event() -> impl Strategy<Value = SessionEvent> {
    prop_oneof![
        3 => Just(SessionEvent::Connect),
        1 => Just(SessionEvent::Disconnect),
        1 => Just(SessionEvent::Probe),
        2 => arb_known_account().prop_map(SessionEvent::SwitchAccount),
        1 => Just(SessionEvent::Revoke),
        1 => any::<bool>().prop_map(SessionEvent::SetApprove),
    ]
}
