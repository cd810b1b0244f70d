//! Task records as stored remotely and as rendered locally.

use serde::{Deserialize, Serialize};

use crate::types::TaskId;

/// A task exactly as the contract returns it, soft-deleted entries included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Contract-assigned id; never reused, even after deletion
    pub id: TaskId,
    /// Task title
    pub task_title: String,
    /// Task body text
    pub task_text: String,
    /// Soft-delete marker
    pub is_deleted: bool,
}

impl TaskRecord {
    /// Create a live (not deleted) record.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_title: title.into(),
            task_text: body.into(),
            is_deleted: false,
        }
    }

    /// Convert into a renderable task, or `None` if soft-deleted.
    pub fn into_visible(self) -> Option<Task> {
        if self.is_deleted {
            return None;
        }
        Some(Task {
            id: self.id,
            title: self.task_title,
            body: self.task_text,
        })
    }
}

/// A renderable task. Soft-deleted records never become a `Task`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Contract-assigned id
    pub id: TaskId,
    /// Task title
    pub title: String,
    /// Task body text
    pub body: String,
}

/// Drop soft-deleted records, keeping remote order for the rest.
pub fn visible_tasks(records: impl IntoIterator<Item = TaskRecord>) -> Vec<Task> {
    records
        .into_iter()
        .filter_map(TaskRecord::into_visible)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_contract_field_names() {
        let json = r#"{"id":7,"taskTitle":"Buy milk","taskText":"2 litres","isDeleted":false}"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, TaskRecord::new(7, "Buy milk", "2 litres"));
    }

    #[test]
    fn test_visible_tasks_drops_deleted_and_keeps_order() {
        let mut gone = TaskRecord::new(2, "b", "b");
        gone.is_deleted = true;
        let tasks = visible_tasks(vec![
            TaskRecord::new(3, "c", "c"),
            gone,
            TaskRecord::new(1, "a", "a"),
        ]);
        let ids: Vec<u64> = tasks.iter().map(|t| t.id.value()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    proptest::proptest! {
        #[test]
        fn visible_tasks_never_contain_deleted(
            flags in proptest::collection::vec(proptest::bool::ANY, 0..32)
        ) {
            let records: Vec<TaskRecord> = flags
                .iter()
                .enumerate()
                .map(|(i, deleted)| TaskRecord {
                    is_deleted: *deleted,
                    ..TaskRecord::new(i as u64, "t", "b")
                })
                .collect();
            let visible = visible_tasks(records);
            let live = flags.iter().filter(|d| !**d).count();
            proptest::prop_assert_eq!(visible.len(), live);
            for task in &visible {
                proptest::prop_assert!(!flags[task.id.value() as usize]);
            }
        }
    }
}
