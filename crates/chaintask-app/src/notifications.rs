//! Outcome notifications for presentation.

use chaintask_core::{ErrorKind, TaskError, TaskResult};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// User-facing operation an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Wallet connect
    Connect,
    /// Task creation
    Create,
    /// Task deletion
    Delete,
    /// Task list refresh
    Refresh,
}

/// Result of one operation as presentation sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Operation completed
    Success,
    /// Operation failed
    Failure {
        /// Error kind for mechanical matching
        kind: ErrorKind,
        /// Display message
        message: String,
    },
}

impl Outcome {
    /// Build an outcome from an operation result.
    pub fn from_result<T>(result: &TaskResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => Self::failure(err),
        }
    }

    /// Failure outcome for `err`.
    pub fn failure(err: &TaskError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the user can resolve this failure themselves, so presentation
    /// asks for action instead of offering a retry.
    pub fn is_user_correctable(&self) -> bool {
        match self {
            Self::Success => false,
            Self::Failure { kind, .. } => kind.is_user_correctable(),
        }
    }
}

/// One message on the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Which operation
    pub operation: OperationKind,
    /// How it ended
    pub outcome: Outcome,
}

/// Broadcasts operation outcomes to any number of subscribers.
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// New subscriber; sees notifications sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Report the outcome of `operation`.
    pub fn report<T>(&self, operation: OperationKind, result: &TaskResult<T>) {
        self.send(Notification {
            operation,
            outcome: Outcome::from_result(result),
        });
    }

    /// Send a notification. Having no subscribers is fine.
    pub fn send(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            trace!("no notification subscribers");
        }
    }
}
