//! Pure operations on the task collection.
//!
//! Every operation takes the current collection by reference and returns
//! a fresh one; callers swap the result in as the new snapshot. Records
//! other than the targeted one are carried over untouched, in order, so
//! a mutation's diff is always exactly one record.

use sheetboard_proto::{Task, TaskId};
use thiserror::Error;

/// Errors from task collection operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Task title is empty after trimming.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Status label is not one of the board's configured columns.
    #[error("unknown status: {0}")]
    UnknownStatus(String),
    /// Task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// The ordered set of status columns a board is configured with.
///
/// The first label doubles as the default status for new tasks.
/// Within-column display order is derived by filtering the collection on
/// status, so the set carries no per-task rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSet(Vec<String>);

/// Column labels of the stock board layout.
pub const DEFAULT_STATUSES: [&str; 3] = ["A Fazer", "Pronto", "Bloqueado"];

impl Default for StatusSet {
    fn default() -> Self {
        Self(DEFAULT_STATUSES.iter().map(ToString::to_string).collect())
    }
}

impl StatusSet {
    /// Builds a status set from the given labels.
    ///
    /// Falls back to [`DEFAULT_STATUSES`] when `labels` is empty, since a
    /// board with no columns cannot hold any task.
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        if labels.is_empty() {
            Self::default()
        } else {
            Self(labels)
        }
    }

    /// The label new tasks default to (first configured column).
    #[must_use]
    pub fn default_status(&self) -> &str {
        &self.0[0]
    }

    /// Whether `label` names one of the configured columns.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|s| s == label)
    }

    /// All column labels, in display order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

/// Validated form output for creating or editing a task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    /// Task title; must be non-empty after trimming.
    pub title: String,
    /// Free-text details; empty when the form field was left blank.
    pub description: String,
    /// Requested status column; `None` means the board's default.
    pub status: Option<String>,
}

impl TaskDraft {
    /// Draft with the given title, empty description, default status.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Validates and normalizes a draft against the board's status set.
fn resolve_draft(draft: TaskDraft, statuses: &StatusSet) -> Result<(String, String, String), StoreError> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(StoreError::TitleEmpty);
    }
    let status = match draft.status {
        Some(s) => {
            if !statuses.contains(&s) {
                return Err(StoreError::UnknownStatus(s));
            }
            s
        }
        None => statuses.default_status().to_string(),
    };
    Ok((title, draft.description, status))
}

/// Mints a collection-unique id from the current wall-clock millis.
///
/// Two creations inside the same millisecond would collide, so the
/// timestamp is nudged forward until the id is free.
#[must_use]
pub fn allocate_id(tasks: &[Task], now_ms: u64) -> TaskId {
    let mut ms = now_ms;
    loop {
        let id = TaskId::from_timestamp_ms(ms);
        if !tasks.iter().any(|t| t.id == id) {
            return id;
        }
        ms += 1;
    }
}

/// Appends a new task built from `draft` under the given identifier.
///
/// # Errors
///
/// Returns [`StoreError::TitleEmpty`] for a blank title and
/// [`StoreError::UnknownStatus`] for a status outside the board's set.
pub fn create(
    tasks: &[Task],
    draft: TaskDraft,
    statuses: &StatusSet,
    id: TaskId,
) -> Result<Vec<Task>, StoreError> {
    let (title, description, status) = resolve_draft(draft, statuses)?;
    let mut next = tasks.to_vec();
    next.push(Task {
        id,
        title,
        description,
        status,
    });
    Ok(next)
}

/// Replaces the fields of the task with `id` wholesale from `draft`.
///
/// # Errors
///
/// Returns [`StoreError::TaskNotFound`] if `id` is absent, plus the same
/// validation errors as [`create`].
pub fn update(
    tasks: &[Task],
    id: &TaskId,
    draft: TaskDraft,
    statuses: &StatusSet,
) -> Result<Vec<Task>, StoreError> {
    if !tasks.iter().any(|t| &t.id == id) {
        return Err(StoreError::TaskNotFound(id.to_string()));
    }
    let (title, description, status) = resolve_draft(draft, statuses)?;
    Ok(tasks
        .iter()
        .map(|t| {
            if &t.id == id {
                Task {
                    id: t.id.clone(),
                    title: title.clone(),
                    description: description.clone(),
                    status: status.clone(),
                }
            } else {
                t.clone()
            }
        })
        .collect())
}

/// Filters out the task with `id`. Removing an absent id is a no-op.
#[must_use]
pub fn remove(tasks: &[Task], id: &TaskId) -> Vec<Task> {
    tasks.iter().filter(|t| &t.id != id).cloned().collect()
}

/// Sets the status of the task with `id`, leaving every other field and
/// every other record untouched.
///
/// An absent id yields the collection unchanged: the drag layer only
/// reports ids it rendered, so a miss here is stale-event noise, not a
/// caller bug.
///
/// # Errors
///
/// Returns [`StoreError::UnknownStatus`] if `new_status` is not one of
/// the board's configured columns.
pub fn move_to_status(
    tasks: &[Task],
    id: &TaskId,
    new_status: &str,
    statuses: &StatusSet,
) -> Result<Vec<Task>, StoreError> {
    if !statuses.contains(new_status) {
        return Err(StoreError::UnknownStatus(new_status.to_string()));
    }
    Ok(tasks
        .iter()
        .map(|t| {
            if &t.id == id {
                Task {
                    status: new_status.to_string(),
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect())
}
